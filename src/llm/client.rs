use crate::error::{Result, TemplateBindError};
use crate::llm::types::*;
use reqwest::Client;

const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

#[derive(Clone)]
pub struct MistralClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MistralClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: MISTRAL_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (proxy, mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub(crate) async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        json_mode: bool,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(TemplateBindError::ExtractionFailed(format!(
                "Mistral API error (status {}): {}",
                status, err_text
            )));
        }

        let body: ChatCompletionResponse = res.json().await?;

        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                TemplateBindError::ExtractionFailed("Empty choices list".to_string())
            })?
            .message
            .content;

        if content.is_empty() {
            return Err(TemplateBindError::ExtractionFailed(
                "Model returned empty content".to_string(),
            ));
        }

        Ok(content)
    }
}
