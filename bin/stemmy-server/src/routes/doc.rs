use utoipa::OpenApi;

use crate::routes::{chat, emotion, health, topic};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "stemmy-server",
        description = "STEMMY emotion-aware STEM tutor API"
    ),
    tags(
        (name = "health", description = "Liveness and loaded components"),
        (name = "emotion", description = "Face-emotion recognition from camera frames"),
        (name = "chat", description = "Tutor conversation through the hosted chat model"),
        (name = "topic", description = "STEM topic classification")
    )
)]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(emotion::EmotionApi::openapi());
    root.merge(chat::ChatApi::openapi());
    root.merge(topic::TopicApi::openapi());
    root
}
