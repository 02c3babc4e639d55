//! Chat-completion client
//!
//! One request per prompt: no retries, no streaming. The response text is
//! used verbatim.

use std::time::Duration;

use async_trait::async_trait;
use nc_core::config::LlmConfig;
use nc_core::error::NcError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API key is not configured")]
    MissingApiKey,
    #[error("LLM request failed: {0}")]
    Request(String),
    #[error("LLM returned status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("Unexpected LLM response: {0}")]
    InvalidResponse(String),
}

impl From<LlmError> for NcError {
    fn from(err: LlmError) -> Self {
        NcError::external("llm", err.to_string())
    }
}

pub type LlmResult<T> = Result<T, LlmError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one user prompt and return the completion text
    async fn complete(&self, prompt: &str) -> LlmResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatResponse {
    fn into_content(self) -> LlmResult<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".into()))
    }
}

/// Groq (or any OpenAI-compatible) chat-completion client
pub struct GroqClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build();

        Self {
            agent,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, prompt: &str) -> LlmResult<serde_json::Value> {
        serde_json::to_value(ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
        })
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        let api_key = self.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        let body = self.request_body(prompt)?;
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();

        tracing::debug!(model = %self.model, "Requesting chat completion");
        let response = tokio::task::spawn_blocking(move || {
            agent
                .post(&endpoint)
                .set("Authorization", &format!("Bearer {api_key}"))
                .send_json(body)
        })
        .await
        .map_err(|e| LlmError::Request(e.to_string()))?;

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(LlmError::Status { code, body });
            }
            Err(err) => return Err(LlmError::Request(err.to_string())),
        };

        response
            .into_json::<ChatResponse>()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?
            .into_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::config::AppConfig;

    #[tokio::test]
    async fn test_missing_api_key() {
        let client = GroqClient::new(&AppConfig::default().llm);
        assert!(matches!(
            client.complete("hello").await,
            Err(LlmError::MissingApiKey)
        ));
    }

    #[test]
    fn test_request_body() {
        let mut config = AppConfig::default().llm;
        config.base_url = "https://llm.example.org/v1/".into();
        let client = GroqClient::new(&config);

        assert_eq!(client.endpoint(), "https://llm.example.org/v1/chat/completions");
        let body = client.request_body("Summarize").unwrap();
        assert_eq!(body["model"], "meta-llama/llama-4-scout-17b-16e-instruct");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Summarize");
    }

    #[test]
    fn test_response_content() {
        let response: ChatResponse = serde_json::from_value(serde_json::json!({
            "id": "cmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Done."}}]
        }))
        .unwrap();
        assert_eq!(response.into_content().unwrap(), "Done.");

        let empty: ChatResponse = serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        assert!(matches!(empty.into_content(), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_error_maps_to_external_service() {
        let err: NcError = LlmError::MissingApiKey.into();
        assert_eq!(err.status_code(), 502);
    }
}
