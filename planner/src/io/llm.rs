//! LLM completion client abstraction.
//!
//! The [`LlmClient`] trait decouples plan generation from the actual provider
//! (an OpenAI-compatible chat completions API, Groq by default). Tests use
//! scripted clients that return predetermined content without network access.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::io::config::LlmConfig;

/// Errors from a single completion call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A chat completion request with a system instruction and one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

/// Abstraction over chat completion backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one completion request and return the assistant message text.
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;
}

/// Client for `POST {base_url}/chat/completions`.
pub struct ChatCompletionsClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Build a client when the configured credential is present.
    ///
    /// Returns `Ok(None)` when the API key variable is unset or blank.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, LlmError> {
        match config.api_key() {
            Some(key) => Self::new(config, key).map(Some),
            None => {
                debug!(env = %config.api_key_env, "no LLM api key configured");
                Ok(None)
            }
        }
    }

    fn build_body<'a>(&'a self, request: &'a ChatRequest) -> ChatCompletionBody<'a> {
        ChatCompletionBody {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            response_format: request.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion request failed");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatCompletionResponse = response.json().await?;
        first_message_content(body)
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn first_message_content(body: ChatCompletionResponse) -> Result<String, LlmError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::InvalidResponse("response has no message content".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ChatCompletionsClient {
        ChatCompletionsClient::new(&LlmConfig::default(), "key".to_string()).expect("client")
    }

    #[test]
    fn body_requests_json_mode_with_system_and_user_messages() {
        let client = client();
        let request = ChatRequest {
            system_prompt: "system".to_string(),
            user_prompt: "user".to_string(),
            json_mode: true,
        };
        let value = serde_json::to_value(client.build_body(&request)).expect("serialize");
        assert_eq!(value["model"], "llama-3.3-70b-versatile");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "user");
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn body_omits_response_format_without_json_mode() {
        let client = client();
        let request = ChatRequest {
            system_prompt: "s".to_string(),
            user_prompt: "u".to_string(),
            json_mode: false,
        };
        let value = serde_json::to_value(client.build_body(&request)).expect("serialize");
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn extracts_first_choice_content() {
        let body: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"tasks\":[]}"}}]}"#,
        )
        .expect("parse");
        assert_eq!(first_message_content(body).expect("content"), r#"{"tasks":[]}"#);
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let body: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[]}"#).expect("parse");
        assert!(matches!(
            first_message_content(body),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
