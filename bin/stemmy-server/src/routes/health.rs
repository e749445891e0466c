//! Health endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::schemas::health::HealthResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health), components(schemas(HealthResponse)))]
pub struct HealthApi;

/// Register health-check routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

/// Liveness plus a summary of what is loaded and the current learner state.
///
/// Always answers 200 while the process runs; missing models are reported,
/// not treated as failures.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let emotion = state.emotion.current();
    let topic = state.topic.current();

    Json(HealthResponse {
        status: "healthy".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_owned(),
        emotion_model_loaded: state.recognizer.is_some(),
        topic_model_loaded: state.topic_classifier.is_some(),
        llm_configured: state.config.openai.has_key(),
        emotion_confidence: emotion.as_ref().map_or(0.0, |r| r.confidence),
        current_emotion: emotion.map(|r| r.label),
        topic_confidence: topic.as_ref().map_or(0.0, |r| r.confidence),
        current_topic: topic.map(|r| r.label),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::routes::testing::{FakeRecognizer, TestState};

    #[tokio::test]
    async fn reports_loaded_components() {
        let state = TestState::default()
            .with_recognizer(FakeRecognizer::no_face())
            .state();
        let Json(body) = get_health(State(state)).await;
        assert_eq!(body.status, "healthy");
        assert!(!body.version.is_empty());
        assert!(body.emotion_model_loaded);
        assert!(!body.topic_model_loaded);
        assert!(body.llm_configured);
        assert!(body.current_emotion.is_none());
    }

    #[tokio::test]
    async fn includes_current_readings() {
        let state = TestState::default().state();
        state.emotion.observe("happy", 0.8);
        state.topic.set("Physics", 0.6);
        let Json(body) = get_health(State(state)).await;
        assert_eq!(body.current_emotion.as_deref(), Some("happy"));
        assert!((body.emotion_confidence - 0.8).abs() < 1e-6);
        assert_eq!(body.current_topic.as_deref(), Some("Physics"));
    }
}
