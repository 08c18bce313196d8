use crate::error::{Result, TemplateBindError};
use crate::field_path::FieldPath;
use crate::llm::{client::MistralClient, types::*};
use crate::schema_sync::sync_instruction;
use serde_json::Value;
use tokio::sync::mpsc::Sender;

/// Runs one extraction: synchronizes the instruction skeleton with the
/// configured fields, attaches the source documents, calls the model and
/// parses its JSON reply. The reply is returned untyped; shaping it onto
/// the template is the binding engine's job, not the extractor's.
pub struct DocumentExtractor {
    client: MistralClient,
    model: String,
    instruction: String,
}

impl DocumentExtractor {
    pub fn new(client: MistralClient, model: impl Into<String>) -> Self {
        let default_instruction = include_str!("../../EXTRACTION_INSTRUCTION.md").to_string();
        Self {
            client,
            model: model.into(),
            instruction: default_instruction,
        }
    }

    /// Replace the default instruction (e.g. per-organization wording). The
    /// skeleton span between the structure and fields markers is still
    /// synchronized before every call.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub async fn extract(
        &self,
        documents: &[SourceDocument],
        fields: &[FieldPath],
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<Value> {
        self.send_event(&progress, ExtractionEvent::Starting).await;

        let instruction = sync_instruction(&self.instruction, fields, true);

        for doc in documents {
            self.send_event(
                &progress,
                ExtractionEvent::Attaching {
                    filename: doc.display_name.clone(),
                },
            )
            .await;
        }

        let messages = vec![
            ChatMessage::system(instruction),
            ChatMessage::user_with_documents(
                "Analyse les documents joints et réponds uniquement avec le JSON demandé.",
                documents,
            ),
        ];

        self.send_event(&progress, ExtractionEvent::DraftingResponse)
            .await;

        let raw = self.client.chat(&self.model, messages, true).await?;

        self.send_event(&progress, ExtractionEvent::ProcessingResponse)
            .await;

        let cleaned = clean_json_output(&raw);
        match serde_json::from_str(&cleaned) {
            Ok(value) => {
                self.send_event(&progress, ExtractionEvent::Success).await;
                Ok(value)
            }
            Err(e) => {
                let reason = format!("Model reply is not valid JSON: {}", e);
                self.send_event(
                    &progress,
                    ExtractionEvent::Failed {
                        reason: reason.clone(),
                    },
                )
                .await;
                Err(TemplateBindError::ExtractionFailed(reason))
            }
        }
    }

    async fn send_event(&self, sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}

/// Strips prose and code fences around the model's JSON reply by keeping
/// the outermost braced span.
fn clean_json_output(raw: &str) -> String {
    if let Some(start) = raw.find('{') {
        if let Some(end) = raw.rfind('}') {
            if end >= start {
                return raw[start..=end].to_string();
            }
        }
    }
    if let Some(start) = raw.find('[') {
        if let Some(end) = raw.rfind(']') {
            if end >= start {
                return raw[start..=end].to_string();
            }
        }
    }
    raw.trim().to_string()
}
