//! Hosted chat-completion proxy.
//!
//! [`ChatCompleter`] is the seam the server talks to; [`OpenAiClient`] is the
//! production implementation against any OpenAI-compatible endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::prompt::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set. Put it in a .env file or environment.")]
    MissingApiKey,

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Connection settings for an OpenAI-compatible API.
#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("project", &self.project)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_owned(),
            organization: None,
            project: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiConfig {
    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// One chat-completion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletion {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Send the conversation and return the assistant's reply text.
    async fn complete(&self, request: &ChatCompletion) -> Result<String, LlmError>;
}

pub struct OpenAiClient {
    http: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl ChatCompleter for OpenAiClient {
    async fn complete(&self, request: &ChatCompletion) -> Result<String, LlmError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(k) if !k.is_empty() => k,
            _ => return Err(LlmError::MissingApiKey),
        };

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );

        let mut builder = self.http.post(self.endpoint()).bearer_auth(api_key);
        if let Some(org) = self.config.organization.as_deref() {
            builder = builder.header("OpenAI-Organization", org);
        }
        if let Some(project) = self.config.project.as_deref() {
            builder = builder.header("OpenAI-Project", project);
        }

        let response = builder
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), message = %message, "chat completion rejected");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}
