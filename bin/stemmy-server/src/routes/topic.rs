//! Topic classification and chat-model status routes (nested under `/api`).

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use stemmy_tutor::Topic;
use tracing::debug;
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::chat::OpenAiStatusResponse;
use crate::schemas::topic::{
    ClassifyTopicRequest, ClassifyTopicResponse, TopicListResponse, TopicProbability,
};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(classify_topic, list_topics, openai_status),
    components(schemas(
        ClassifyTopicRequest,
        ClassifyTopicResponse,
        TopicProbability,
        TopicListResponse,
        OpenAiStatusResponse
    ))
)]
pub struct TopicApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/classify_topic", post(classify_topic))
        .route("/topics", get(list_topics))
        .route("/openai_status", get(openai_status))
}

/// Classify free text into a STEM topic and remember it as the current topic.
#[utoipa::path(
    post,
    path = "/api/classify_topic",
    tag = "topic",
    request_body = ClassifyTopicRequest,
    responses(
        (status = 200, description = "Ranked topics; empty when no model is loaded", body = ClassifyTopicResponse),
        (status = 400, description = "Invalid request"),
    )
)]
pub async fn classify_topic(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ClassifyTopicRequest>, JsonRejection>,
) -> Result<Json<ClassifyTopicResponse>, ServerError> {
    let Json(req) = payload?;
    req.validate()?;

    let Some(classifier) = &state.topic_classifier else {
        return Ok(Json(ClassifyTopicResponse {
            label: None,
            confidence: 0.0,
            top: Vec::new(),
            model_loaded: false,
        }));
    };

    let k = usize::try_from(req.top_k.max(1)).unwrap_or(usize::MAX);
    let top: Vec<TopicProbability> = classifier
        .top_k(&req.text, k)
        .into_iter()
        .map(|s| TopicProbability {
            label: s.label,
            prob: s.prob,
        })
        .collect();

    let (label, confidence) = match top.first() {
        Some(best) => {
            state.topic.set(best.label.clone(), best.prob);
            (Some(best.label.clone()), best.prob)
        }
        None => (None, 0.0),
    };
    debug!(label = ?label, confidence, "topic classified");

    Ok(Json(ClassifyTopicResponse {
        label,
        confidence,
        top,
        model_loaded: true,
    }))
}

/// The STEM subjects offered by the UI picker.
#[utoipa::path(
    get,
    path = "/api/topics",
    tag = "topic",
    responses((status = 200, description = "Canonical topic list", body = TopicListResponse))
)]
pub async fn list_topics() -> Json<TopicListResponse> {
    Json(TopicListResponse {
        topics: Topic::all().iter().map(ToString::to_string).collect(),
    })
}

/// Whether the chat model is usable.  Never returns the key itself.
#[utoipa::path(
    get,
    path = "/api/openai_status",
    tag = "chat",
    responses((status = 200, description = "Chat model configuration", body = OpenAiStatusResponse))
)]
pub async fn openai_status(State(state): State<Arc<AppState>>) -> Json<OpenAiStatusResponse> {
    let openai = &state.config.openai;
    Json(OpenAiStatusResponse {
        has_key: openai.has_key(),
        base_url: openai.base_url.clone(),
        project_set: openai.project.is_some(),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
