//! Server configuration, loaded from environment variables (and an optional
//! `.env` file) at startup, then overridden by command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use stemmy_tutor::OpenAiConfig;
use stemmy_tutor::llm::DEFAULT_BASE_URL;
use stemmy_vision::{DEFAULT_LABELS, RecognizerConfig};

/// Command-line flags.  Anything set here wins over the environment.
#[derive(Debug, Parser)]
#[command(name = "stemmy-server", version, about = "STEMMY emotion-aware tutor API")]
pub struct Cli {
    /// Dotenv file loaded before reading the environment.
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Address to listen on, e.g. `127.0.0.1:8000`.
    #[arg(long)]
    pub bind: Option<String>,

    /// Emit logs as newline-delimited JSON.
    #[arg(long)]
    pub log_json: bool,

    /// ONNX export of the face-emotion weights.
    #[arg(long)]
    pub emotion_model: Option<PathBuf>,

    /// JSON export of the topic classifier.
    #[arg(long)]
    pub topic_model: Option<PathBuf>,

    /// Directory with the built browser UI to serve at `/`.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

/// Runtime configuration for stemmy-server.
///
/// Every field has a default so the server starts without any environment;
/// features whose model files are missing are simply reported as unavailable.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated allowed origins; `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,

    /// Built frontend to serve for unmatched paths.
    pub static_dir: Option<PathBuf>,

    /// Largest accepted camera frame upload.
    pub max_upload_bytes: usize,

    pub recognizer: RecognizerConfig,

    /// Frames in the emotion smoothing window.
    pub smoothing_window: usize,

    pub topic_model: PathBuf,

    pub openai: OpenAiConfig,

    /// Chat model used when the request does not name one.
    pub default_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: true,
            static_dir: None,
            max_upload_bytes: 10 * 1024 * 1024,
            recognizer: RecognizerConfig::default(),
            smoothing_window: 3,
            topic_model: PathBuf::from("models/topic/topic_model.json"),
            openai: OpenAiConfig::default(),
            default_model: "gpt-4o-mini".to_owned(),
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        let d_rec = &d.recognizer;

        let labels = std::env::var("STEMMY_EMOTION_LABELS")
            .ok()
            .map(|v| parse_list(&v))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LABELS.iter().map(|s| (*s).to_owned()).collect());

        Self {
            bind_address: env_or("STEMMY_BIND", &d.bind_address),
            log_level: env_or("STEMMY_LOG", &d.log_level),
            log_json: parse_bool("STEMMY_LOG_JSON", d.log_json),
            cors_allowed_origins: env_opt("STEMMY_CORS_ORIGINS"),
            enable_swagger: parse_bool("STEMMY_ENABLE_SWAGGER", d.enable_swagger),
            static_dir: env_opt("STEMMY_STATIC_DIR").map(PathBuf::from),
            max_upload_bytes: upload_limit_bytes(parse_env("STEMMY_MAX_UPLOAD_MB", 10usize)),
            recognizer: RecognizerConfig {
                weights_path: env_opt("STEMMY_EMOTION_MODEL")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| d_rec.weights_path.clone()),
                image_size: parse_env("STEMMY_IMAGE_SIZE", d_rec.image_size),
                confidence_threshold: parse_env(
                    "STEMMY_CONFIDENCE_THRESHOLD",
                    d_rec.confidence_threshold,
                ),
                labels,
            },
            smoothing_window: parse_env("STEMMY_SMOOTHING_WINDOW", d.smoothing_window),
            topic_model: env_opt("STEMMY_TOPIC_MODEL")
                .map(PathBuf::from)
                .unwrap_or(d.topic_model),
            openai: OpenAiConfig {
                api_key: env_opt("OPENAI_API_KEY"),
                base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
                organization: env_opt("OPENAI_ORG_ID").or_else(|| env_opt("OPENAI_ORGANIZATION")),
                project: env_opt("OPENAI_PROJECT"),
                timeout: Duration::from_secs(parse_env("STEMMY_LLM_TIMEOUT_SECS", 60u64)),
            },
            default_model: env_or("STEMMY_DEFAULT_MODEL", &d.default_model),
        }
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(bind) = &cli.bind {
            self.bind_address = bind.clone();
        }
        if cli.log_json {
            self.log_json = true;
        }
        if let Some(path) = &cli.emotion_model {
            self.recognizer.weights_path = path.clone();
        }
        if let Some(path) = &cli.topic_model {
            self.topic_model = path.clone();
        }
        if let Some(dir) = &cli.static_dir {
            self.static_dir = Some(dir.clone());
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Unset and blank values both read as absent.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Megabytes to bytes, at least 1 MiB and saturating instead of overflowing.
fn upload_limit_bytes(mb: usize) -> usize {
    mb.max(1).saturating_mul(1024 * 1024)
}

fn parse_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
