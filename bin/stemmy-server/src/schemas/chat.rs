use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: u64 = 32 * 1024;

/// Most history entries forwarded in one call.
pub const MAX_HISTORY: u64 = 200;

/// One prior turn as sent by the browser.  Missing or unknown roles are read
/// as `"user"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct HistoryItem {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Request body for `POST /api/chat_openai`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, max = MAX_MESSAGE_CHARS))]
    pub message: String,

    #[serde(default)]
    #[validate(length(max = MAX_HISTORY))]
    pub history: Vec<HistoryItem>,

    /// Chat model; the server default is used when absent or empty.
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,

    #[serde(default = "default_true")]
    pub use_emotion: bool,
    #[serde(default)]
    pub emotion_override: Option<String>,
    #[serde(default)]
    pub emotion_confidence_override: Option<f32>,

    #[serde(default = "default_true")]
    pub use_topic: bool,
    /// Subject picked in the UI; wins over the classifier.
    #[serde(default)]
    pub topic_override: Option<String>,
    #[serde(default)]
    pub topic_confidence_override: Option<f32>,
}

fn default_temperature() -> f32 {
    0.5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpenAiStatusResponse {
    pub has_key: bool,
    pub base_url: String,
    pub project_set: bool,
}
