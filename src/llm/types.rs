use crate::error::{Result, TemplateBindError};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Progress notifications emitted during an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractionEvent {
    Starting,
    Attaching { filename: String },
    DraftingResponse,
    ProcessingResponse,
    Success,
    Failed { reason: String },
}

/// A source document attached inline to the extraction request.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub bytes: Vec<u8>,
    pub display_name: String,
    pub mime_type: String,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>, display_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            display_name: display_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Reads a document from disk, guessing its MIME type from the
    /// extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TemplateBindError::ExtractionFailed("Invalid file name".to_string()))?
            .to_string();

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        Ok(Self {
            bytes,
            display_name,
            mime_type,
        })
    }

    /// Base64 data URL for inline attachment.
    pub fn to_data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type, encoded)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    DocumentUrl { document_url: String },
    ImageUrl { image_url: String },
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message carrying the given text plus every document as an
    /// inline attachment (images as image parts, everything else as
    /// document parts).
    pub fn user_with_documents(text: impl Into<String>, documents: &[SourceDocument]) -> Self {
        let mut parts = vec![ContentPart::Text { text: text.into() }];
        for doc in documents {
            let url = doc.to_data_url();
            if doc.is_image() {
                parts.push(ContentPart::ImageUrl { image_url: url });
            } else {
                parts.push(ContentPart::DocumentUrl { document_url: url });
            }
        }
        Self {
            role: "user".to_string(),
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssistantMessage {
    pub content: String,
}
