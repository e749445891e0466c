use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct ClassifyTopicRequest {
    #[validate(length(max = 32768))]
    pub text: String,
    /// Number of ranked topics to return; values below 1 are treated as 1.
    #[serde(default = "default_top_k")]
    pub top_k: i64,
}

fn default_top_k() -> i64 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopicProbability {
    pub label: String,
    pub prob: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassifyTopicResponse {
    pub label: Option<String>,
    pub confidence: f32,
    pub top: Vec<TopicProbability>,
    pub model_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopicListResponse {
    pub topics: Vec<String>,
}
