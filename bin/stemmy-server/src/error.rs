//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become a JSON body of the form
//! `{"detail": "..."}` with a matching status code.  The `detail` key keeps the
//! shape the browser client already parses.
//!
//! Internal errors are logged with full detail but only a generic message is
//! returned to the caller.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use stemmy_tutor::LlmError;
use stemmy_vision::VisionError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A model this endpoint needs was not loaded at startup.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The emotion model failed on a well-formed frame.
    #[error("emotion recognition failed: {0}")]
    Recognition(VisionError),

    /// Required configuration is missing; the message is safe to show.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The hosted chat model failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::ServiceUnavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
            ServerError::Recognition(e) => {
                error!(error = %e, "emotion recognition error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Emotion recognition failed: {e}"),
                )
            }
            ServerError::Configuration(m) => {
                error!(message = %m, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
            }
            ServerError::Upstream(m) => {
                error!(message = %m, "chat model error");
                (StatusCode::BAD_GATEWAY, format!("OpenAI error: {m}"))
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<VisionError> for ServerError {
    fn from(e: VisionError) -> Self {
        match e {
            VisionError::Decode(m) => ServerError::BadRequest(format!("Invalid image: {m}")),
            other => ServerError::Recognition(other),
        }
    }
}

impl From<LlmError> for ServerError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::MissingApiKey => ServerError::Configuration(e.to_string()),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServerError {
    fn from(e: validator::ValidationErrors) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(e: JsonRejection) -> Self {
        ServerError::BadRequest(e.body_text())
    }
}
