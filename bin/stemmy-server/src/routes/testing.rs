//! In-process fakes and helpers shared by the route tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use stemmy_tutor::{ChatCompleter, ChatCompletion, LlmError, TopicClassifier};
use stemmy_vision::{EmotionRecognizer, Prediction, VisionError};

use crate::config::Config;
use crate::state::{AppState, EmotionTracker, TopicTracker};

pub const TOPIC_MODEL: &str = r#"{
    "vocabulary": { "derivative": 0, "integral": 1, "atom": 2, "molecule": 3 },
    "classes": ["Chemistry", "Mathematics", "Physics"],
    "coef": [
        [-1.0, -1.0,  2.0,  2.0],
        [ 2.0,  2.0, -1.0, -1.0],
        [ 0.0,  0.0,  0.5,  0.0]
    ],
    "intercept": [0.0, 0.0, 0.0]
}"#;

/// Recognizer that answers every frame with the same outcome.
pub struct FakeRecognizer {
    outcome: Result<Option<(String, f32)>, String>,
}

impl FakeRecognizer {
    pub fn face(label: &str, confidence: f32) -> Arc<dyn EmotionRecognizer> {
        Arc::new(Self {
            outcome: Ok(Some((label.to_owned(), confidence))),
        })
    }

    pub fn no_face() -> Arc<dyn EmotionRecognizer> {
        Arc::new(Self { outcome: Ok(None) })
    }

    pub fn failing(message: &str) -> Arc<dyn EmotionRecognizer> {
        Arc::new(Self {
            outcome: Err(message.to_owned()),
        })
    }
}

impl EmotionRecognizer for FakeRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<Option<Prediction>, VisionError> {
        if image.starts_with(b"garbage") {
            return Err(VisionError::Decode("unsupported format".into()));
        }
        match &self.outcome {
            Ok(Some((label, confidence))) => Ok(Some(Prediction {
                label: label.clone(),
                confidence: *confidence,
                class_id: 0,
            })),
            Ok(None) => Ok(None),
            Err(m) => Err(VisionError::Inference(m.clone())),
        }
    }
}

/// Chat model that records every request and replies with a fixed text.
#[derive(Default)]
pub struct FakeLlm {
    pub requests: Mutex<Vec<ChatCompletion>>,
}

impl FakeLlm {
    pub fn last(&self) -> ChatCompletion {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no chat request recorded")
    }
}

#[async_trait]
impl ChatCompleter for FakeLlm {
    async fn complete(&self, request: &ChatCompletion) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok("fake reply".to_owned())
    }
}

/// Builder for an [`AppState`] wired to fakes.
pub struct TestState {
    pub config: Config,
    pub recognizer: Option<Arc<dyn EmotionRecognizer>>,
    pub topic_classifier: Option<Arc<TopicClassifier>>,
    pub llm: Arc<dyn ChatCompleter>,
    pub fake_llm: Arc<FakeLlm>,
}

impl Default for TestState {
    fn default() -> Self {
        let fake_llm = Arc::new(FakeLlm::default());
        let mut config = Config::default();
        config.openai.api_key = Some("sk-test".to_owned());
        Self {
            config,
            recognizer: None,
            topic_classifier: None,
            llm: fake_llm.clone(),
            fake_llm,
        }
    }
}

impl TestState {
    pub fn with_recognizer(mut self, recognizer: Arc<dyn EmotionRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_topic_model(mut self) -> Self {
        let clf = TopicClassifier::from_json(TOPIC_MODEL).unwrap();
        self.topic_classifier = Some(Arc::new(clf));
        self
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            config: Arc::new(self.config.clone()),
            recognizer: self.recognizer.clone(),
            topic_classifier: self.topic_classifier.clone(),
            llm: self.llm.clone(),
            emotion: EmotionTracker::new(self.config.smoothing_window),
            topic: TopicTracker::default(),
        })
    }

    pub fn router(&self) -> Router {
        super::build(self.state())
    }
}

pub async fn json_body(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "stemmy-test-boundary";

/// A `multipart/form-data` upload with one file field.
pub fn multipart_request(uri: &str, field: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"frame.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
