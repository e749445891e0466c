use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process answers.
    pub status: String,
    pub version: String,
    pub emotion_model_loaded: bool,
    pub topic_model_loaded: bool,
    /// Whether an API key for the chat model is configured.
    pub llm_configured: bool,
    pub current_emotion: Option<String>,
    pub emotion_confidence: f32,
    pub current_topic: Option<String>,
    pub topic_confidence: f32,
}
