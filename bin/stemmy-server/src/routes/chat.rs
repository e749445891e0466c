//! Emotion- and topic-aware chat (`POST /api/chat_openai`).

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use stemmy_tutor::{ChatCompletion, ChatMessage, LlmError, Signal, build_messages};
use tracing::{debug, info};
use utoipa::OpenApi;
use validator::Validate;

use crate::error::ServerError;
use crate::schemas::chat::{ChatRequest, ChatResponse, HistoryItem};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(chat_openai),
    components(schemas(ChatRequest, ChatResponse, HistoryItem))
)]
pub struct ChatApi;

/// Register chat routes (nested under `/api`).
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat_openai", post(chat_openai))
}

/// Ask the tutor a question.
///
/// The system prompt carries the persona and, unless disabled per request,
/// guidance derived from the learner's current emotion and the topic of the
/// message.
#[utoipa::path(
    post,
    path = "/api/chat_openai",
    tag = "chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Tutor reply", body = ChatResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Chat model not configured"),
        (status = 502, description = "Chat model request failed"),
    )
)]
pub async fn chat_openai(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServerError> {
    let Json(req) = payload?;
    req.validate()?;

    // Nothing is classified or stored for a request that cannot be answered.
    if !state.config.openai.has_key() {
        return Err(LlmError::MissingApiKey.into());
    }

    let emotion = req.use_emotion.then(|| emotion_signal(&state, &req));
    let topic = req.use_topic.then(|| topic_signal(&state, &req));

    let history: Vec<ChatMessage> = req
        .history
        .iter()
        .map(|h| ChatMessage::from_loose(h.role.as_deref(), h.content.clone()))
        .collect();
    let messages = build_messages(emotion.as_ref(), topic.as_ref(), &history, &req.message);

    let model = non_empty(req.model.as_deref())
        .unwrap_or(&state.config.default_model)
        .to_owned();

    debug!(
        model = %model,
        emotion = ?emotion.as_ref().and_then(|s| s.label.as_deref()),
        topic = ?topic.as_ref().and_then(|s| s.label.as_deref()),
        history = history.len(),
        "chat request"
    );

    let completion = ChatCompletion {
        model,
        temperature: req.temperature,
        messages,
    };
    let reply = state.llm.complete(&completion).await?;

    info!(model = %completion.model, reply_chars = reply.chars().count(), "chat reply");
    Ok(Json(ChatResponse { reply }))
}

/// Override first, then the stored reading. An empty override is still an
/// override and yields the "no emotion" guidance.
fn emotion_signal(state: &AppState, req: &ChatRequest) -> Signal {
    let current = state.emotion.current();
    let label = req
        .emotion_override
        .clone()
        .or_else(|| current.as_ref().map(|r| r.label.clone()));
    let confidence = req
        .emotion_confidence_override
        .or_else(|| current.map(|r| r.confidence))
        .unwrap_or(0.0);
    Signal::new(label, confidence)
}

/// Override first, then a fresh classification of the message, then the
/// last known topic. The override is forwarded verbatim, even when empty.
fn topic_signal(state: &AppState, req: &ChatRequest) -> Signal {
    if let Some(label) = &req.topic_override {
        return Signal::new(
            Some(label.clone()),
            req.topic_confidence_override.unwrap_or(0.0),
        );
    }

    if let Some(classifier) = &state.topic_classifier {
        let score = classifier.predict(&req.message);
        state.topic.set(score.label.clone(), score.prob);
        return Signal::new(Some(score.label), score.prob);
    }

    match state.topic.current() {
        Some(t) => Signal::new(Some(t.label), t.confidence),
        None => Signal::default(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;
    use stemmy_tutor::{OpenAiClient, OpenAiConfig, Role};
    use tower::ServiceExt;

    use crate::routes::build;
    use crate::routes::testing::{TestState, json_body, json_request};

    #[tokio::test]
    async fn forwards_persona_signals_history_and_message() {
        let harness = TestState::default();
        let state = harness.state();
        state.emotion.observe("confused", 0.6);
        state.topic.set("Physics", 0.4);

        let resp = build(state)
            .oneshot(json_request(
                "POST",
                "/api/chat_openai",
                json!({
                    "message": "Why does the moon orbit?",
                    "history": [
                        { "role": "user", "content": "hi" },
                        { "role": "assistant", "content": "hello!" },
                        { "role": "narrator", "content": "aside" }
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["reply"], "fake reply");

        let sent = harness.fake_llm.last();
        assert_eq!(sent.model, "gpt-4o-mini");
        assert!((sent.temperature - 0.5).abs() < 1e-6);
        let msgs = &sent.messages;
        assert_eq!(msgs.len(), 7);
        assert_eq!(msgs[0].content, stemmy_tutor::prompt::PERSONA);
        assert!(msgs[1].content.contains("Current user emotion: confused (confidence 60%)"));
        assert!(msgs[2].content.starts_with("Detected user topic intent: Physics (confidence 40%)"));
        assert_eq!(msgs[3].role, Role::User);
        assert_eq!(msgs[4].role, Role::Assistant);
        assert_eq!(msgs[5].role, Role::User);
        assert_eq!(msgs[5].content, "aside");
        assert_eq!(msgs[6].content, "Why does the moon orbit?");
    }

    #[tokio::test]
    async fn flags_drop_signals() {
        let harness = TestState::default();
        let resp = harness
            .router()
            .oneshot(json_request(
                "POST",
                "/api/chat_openai",
                json!({ "message": "hello", "use_emotion": false, "use_topic": false }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let msgs = harness.fake_llm.last().messages;
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].content, "hello");
    }

    #[tokio::test]
    async fn overrides_win_over_state() {
        let harness = TestState::default().with_topic_model();
        let state = harness.state();
        state.emotion.observe("sad", 0.9);

        build(state)
            .oneshot(json_request(
                "POST",
                "/api/chat_openai",
                json!({
                    "message": "integral of x",
                    "model": "gpt-4o",
                    "temperature": 1.2,
                    "emotion_override": "happy",
                    "emotion_confidence_override": 0.25,
                    "topic_override": "Astronomy",
                    "topic_confidence_override": 1.0
                }),
            ))
            .await
            .unwrap();

        let sent = harness.fake_llm.last();
        assert_eq!(sent.model, "gpt-4o");
        assert!(sent.messages[1].content.contains("Current user emotion: happy (confidence 25%)"));
        assert!(sent.messages[2].content.starts_with("Detected user topic intent: Astronomy (confidence 100%)"));
    }

    #[tokio::test]
    async fn classifier_sets_current_topic() {
        let harness = TestState::default().with_topic_model();
        let state = harness.state();

        build(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/chat_openai",
                json!({ "message": "derivative of an integral", "model": "" }),
            ))
            .await
            .unwrap();

        assert_eq!(state.topic.current().unwrap().label, "Mathematics");
        let sent = harness.fake_llm.last();
        assert_eq!(sent.model, "gpt-4o-mini");
        assert!(sent.messages[2].content.contains("Mathematics"));
        assert!(sent.messages[1].content.contains("No reliable emotion detected"));
    }

    #[tokio::test]
    async fn empty_overrides_suppress_stored_and_classified_signals() {
        let harness = TestState::default().with_topic_model();
        let state = harness.state();
        state.emotion.observe("happy", 0.9);

        let resp = build(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/chat_openai",
                json!({
                    "message": "atom molecule",
                    "emotion_override": "",
                    "topic_override": ""
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let msgs = harness.fake_llm.last().messages;
        assert!(msgs[1].content.contains("No reliable emotion detected"));
        assert!(msgs[2].content.starts_with("No topic detected"));
        assert!(state.topic.current().is_none());
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let app = TestState::default().router();
        for body in [
            json!({ "message": "" }),
            json!({ "message": "hi", "temperature": 3.0 }),
            json!({ "history": [] }),
        ] {
            let resp = app
                .clone()
                .oneshot(json_request("POST", "/api/chat_openai", body))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert!(json_body(resp).await["detail"].is_string());
        }
    }

    #[tokio::test]
    async fn missing_api_key_is_configuration_error() {
        let mut harness = TestState::default();
        harness.config.openai = OpenAiConfig::default();
        harness.llm = Arc::new(OpenAiClient::new(OpenAiConfig::default()).unwrap());

        let resp = harness
            .router()
            .oneshot(json_request("POST", "/api/chat_openai", json!({ "message": "hi" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detail = json_body(resp).await["detail"].as_str().unwrap().to_owned();
        assert!(detail.starts_with("OPENAI_API_KEY is not set"));
    }

    #[tokio::test]
    async fn missing_api_key_leaves_topic_untouched() {
        let mut harness = TestState::default().with_topic_model();
        harness.config.openai = OpenAiConfig::default();
        let state = harness.state();

        let resp = build(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/chat_openai",
                json!({ "message": "derivative of an integral" }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(state.topic.current().is_none());
        assert!(harness.fake_llm.requests.lock().unwrap().is_empty());
    }
}
