//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI document endpoint (disable with `STEMMY_ENABLE_SWAGGER=false`)
//! - Health route
//! - Emotion routes at the root, chat and topic routes under `/api`
//! - Optional static frontend served for every unmatched path

mod chat;
pub mod doc;
mod emotion;
mod health;
mod topic;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{Router, middleware};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tracing::info;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Multipart framing on top of the raw frame bytes.
const MULTIPART_SLACK: usize = 64 * 1024;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_SLACK;

    let mut app = Router::new()
        .merge(health::router())
        .merge(emotion::router().layer(DefaultBodyLimit::max(upload_limit)))
        .nest("/api", chat::router().merge(topic::router()));

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    if let Some(dir) = &state.config.static_dir {
        info!(dir = %dir.display(), "serving static frontend");
        app = app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state)))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
