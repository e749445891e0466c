//! Face-emotion routes.
//!
//! The browser posts one camera frame per polling tick to
//! `/recognize_emotion`; the smoothed result becomes the learner's current
//! emotion, which the chat route and `/emotion_context` read back.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use stemmy_tutor::emotion::context_for_label;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::emotion::{
    CurrentEmotionResponse, EmotionContextResponse, EmotionUpload, RecognizeResponse,
    StatusResponse,
};
use crate::state::AppState;

/// Multipart field names accepted for the frame.
const IMAGE_FIELDS: [&str; 2] = ["image", "file"];

const NO_EMOTION_CONTEXT: &str = "No emotion detected. User appears neutral.";

#[derive(OpenApi)]
#[openapi(
    paths(recognize_emotion, current_emotion, emotion_context, reset_emotion),
    components(schemas(
        EmotionUpload,
        RecognizeResponse,
        CurrentEmotionResponse,
        EmotionContextResponse,
        StatusResponse
    ))
)]
pub struct EmotionApi;

/// Register emotion routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/recognize_emotion", post(recognize_emotion))
        .route("/current_emotion", get(current_emotion))
        .route("/emotion_context", get(emotion_context))
        .route("/reset_emotion", post(reset_emotion))
}

/// Recognise the learner's emotion in one camera frame (`POST /recognize_emotion`).
///
/// A frame without a confident face reports `neutral` with zero confidence
/// and `detections = 0`; the smoothing window is left untouched in that case.
#[utoipa::path(
    post,
    path = "/recognize_emotion",
    tag = "emotion",
    request_body(content = EmotionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Frame processed", body = RecognizeResponse),
        (status = 400, description = "Missing, empty, oversized or undecodable image"),
        (status = 500, description = "Model inference failed"),
        (status = 503, description = "Emotion model not loaded"),
    )
)]
pub async fn recognize_emotion(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<RecognizeResponse>, ServerError> {
    let recognizer = state.recognizer.clone().ok_or_else(|| {
        ServerError::ServiceUnavailable("Emotion recognition model not loaded".into())
    })?;

    let max_bytes = state.config.max_upload_bytes;
    let mut frame: Option<Vec<u8>> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if !IMAGE_FIELDS.contains(&name.as_str()) {
            debug!(field = %name, "ignoring multipart field");
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read image chunk: {e}")))?
        {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > max_bytes {
                return Err(ServerError::BadRequest(format!(
                    "Image too large: exceeds maximum of {max_bytes} bytes"
                )));
            }
        }
        frame = Some(bytes);
        break;
    }

    let frame = frame.ok_or_else(|| ServerError::BadRequest("No image uploaded".into()))?;
    if frame.is_empty() {
        return Err(ServerError::BadRequest("Uploaded image is empty".into()));
    }
    debug!(size_bytes = frame.len(), "received camera frame");

    let prediction = tokio::task::spawn_blocking(move || recognizer.recognize(&frame))
        .await
        .map_err(|e| ServerError::Internal(format!("recognition task failed: {e}")))??;

    let (reading, raw_emotion, raw_confidence, detections) = match prediction {
        Some(p) => {
            let reading = state.emotion.observe(&p.label, p.confidence);
            (reading, Some(p.label), p.confidence, 1)
        }
        None => (state.emotion.observe_no_face(), None, 0.0, 0),
    };

    info!(
        emotion = %reading.label,
        confidence = reading.confidence,
        raw = ?raw_emotion,
        detections,
        "emotion updated"
    );

    Ok(Json(RecognizeResponse {
        status: "success".to_owned(),
        message: format!(
            "Detected emotion: {} with {:.2} confidence",
            reading.label, reading.confidence
        ),
        emotion: reading.label,
        confidence: reading.confidence,
        raw_emotion,
        raw_confidence,
        detections,
    }))
}

/// The stored emotion reading (`GET /current_emotion`).
#[utoipa::path(
    get,
    path = "/current_emotion",
    tag = "emotion",
    responses(
        (status = 200, description = "Current reading; nulls when none", body = CurrentEmotionResponse)
    )
)]
pub async fn current_emotion(State(state): State<Arc<AppState>>) -> Json<CurrentEmotionResponse> {
    let body = match state.emotion.current() {
        Some(r) => CurrentEmotionResponse {
            timestamp: Some(r.unix_seconds()),
            confidence: r.confidence,
            emotion: Some(r.label),
        },
        None => CurrentEmotionResponse {
            emotion: None,
            confidence: 0.0,
            timestamp: None,
        },
    };
    Json(body)
}

/// Teaching guidance for the stored emotion (`GET /emotion_context`).
#[utoipa::path(
    get,
    path = "/emotion_context",
    tag = "emotion",
    responses(
        (status = 200, description = "Guidance text and suggestions", body = EmotionContextResponse)
    )
)]
pub async fn emotion_context(State(state): State<Arc<AppState>>) -> Json<EmotionContextResponse> {
    let Some(reading) = state.emotion.current() else {
        return Json(EmotionContextResponse {
            has_emotion: false,
            emotion: None,
            confidence: None,
            context: NO_EMOTION_CONTEXT.to_owned(),
            suggestions: Vec::new(),
        });
    };

    let ctx = context_for_label(&reading.label);
    Json(EmotionContextResponse {
        has_emotion: true,
        emotion: Some(reading.label),
        confidence: Some(reading.confidence),
        context: ctx.context.to_owned(),
        suggestions: ctx.suggestions.iter().map(|s| (*s).to_owned()).collect(),
    })
}

/// Forget the stored emotion and the smoothing history (`POST /reset_emotion`).
#[utoipa::path(
    post,
    path = "/reset_emotion",
    tag = "emotion",
    responses(
        (status = 200, description = "State cleared", body = StatusResponse)
    )
)]
pub async fn reset_emotion(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    state.emotion.reset();
    info!("emotion state reset");
    Json(StatusResponse {
        status: "success".to_owned(),
        message: "Emotion state reset".to_owned(),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
