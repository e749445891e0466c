use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Multipart body of `POST /recognize_emotion`.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct EmotionUpload {
    /// Camera frame (PNG or JPEG).  `file` is accepted as an alias.
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecognizeResponse {
    /// Always `"success"`.
    pub status: String,
    /// Smoothed emotion label, `"neutral"` when no face was found.
    pub emotion: String,
    pub confidence: f32,
    /// Label of this frame alone, before smoothing.
    pub raw_emotion: Option<String>,
    pub raw_confidence: f32,
    /// `1` when a face scored above the threshold, else `0`.
    pub detections: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentEmotionResponse {
    pub emotion: Option<String>,
    pub confidence: f32,
    /// Unix seconds of the detection.
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmotionContextResponse {
    pub has_emotion: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub context: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}
