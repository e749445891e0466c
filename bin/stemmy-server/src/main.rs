//! stemmy-server – entry point.
//!
//! Startup order:
//! 1. Parse flags, load the dotenv file, read configuration from the environment.
//! 2. Initialise structured tracing (JSON in production, pretty in dev).
//! 3. Load the face-emotion model and the topic classifier; either may be
//!    missing, in which case the matching endpoints report it.
//! 4. Build the chat-model client.
//! 5. Build the Axum router and start the HTTP server with graceful shutdown.

mod config;
mod error;
mod middleware;
mod routes;
mod schemas;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use stemmy_tutor::{OpenAiClient, TopicClassifier};
use stemmy_vision::{EmotionRecognizer, YoloEmotionModel};
use tracing::{info, warn};

use crate::config::{Cli, Config};
use crate::state::{AppState, EmotionTracker, TopicTracker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Configuration ───────────────────────────────────────────────────────
    let cli = Cli::parse();
    // A missing dotenv file is normal; anything else is reported once tracing is up.
    let dotenv = dotenvy::from_filename(&cli.env_file);
    let mut cfg = Config::from_env();
    cfg.apply_cli(&cli);

    // ── 2. Tracing ─────────────────────────────────────────────────────────────
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: STEMMY_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!(version = env!("CARGO_PKG_VERSION"), "stemmy-server starting");
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded dotenv file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(path = %cli.env_file.display(), error = %e, "failed to load dotenv file"),
    }
    info!(?cfg, "configuration");

    // ── 3. Models ──────────────────────────────────────────────────────────────
    let recognizer_cfg = cfg.recognizer.clone();
    let recognizer: Option<Arc<dyn EmotionRecognizer>> =
        match tokio::task::spawn_blocking(move || YoloEmotionModel::load(&recognizer_cfg)).await {
            Ok(Ok(model)) => Some(Arc::new(model) as Arc<dyn EmotionRecognizer>),
            Ok(Err(e)) => {
                warn!(error = %e, "emotion model unavailable; /recognize_emotion will return 503");
                None
            }
            // ONNX Runtime panics when its shared library cannot be loaded.
            Err(e) => {
                warn!(error = %e, "emotion model loader panicked; /recognize_emotion will return 503");
                None
            }
        };

    let topic_classifier = match TopicClassifier::from_path(&cfg.topic_model) {
        Ok(clf) => Some(Arc::new(clf)),
        Err(e) => {
            warn!(error = %e, "topic classifier unavailable; topics fall back to overrides");
            None
        }
    };

    // ── 4. Chat model ──────────────────────────────────────────────────────────
    if !cfg.openai.has_key() {
        warn!("OPENAI_API_KEY is not set; /api/chat_openai will fail until it is configured");
    }
    let llm = OpenAiClient::new(cfg.openai.clone()).context("failed to build HTTP client")?;

    // ── 5. Shared application state ────────────────────────────────────────────
    let state = Arc::new(AppState {
        emotion: EmotionTracker::new(cfg.smoothing_window),
        topic: TopicTracker::default(),
        config: Arc::new(cfg.clone()),
        recognizer,
        topic_classifier,
        llm: Arc::new(llm),
    });

    // ── 6. HTTP server with graceful shutdown ──────────────────────────────────
    let app = routes::build(Arc::clone(&state));
    let addr: SocketAddr = cfg
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address '{}'", cfg.bind_address))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("stemmy-server stopped");
    Ok(())
}

/// Returns a future that resolves when SIGINT (Ctrl-C) or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
