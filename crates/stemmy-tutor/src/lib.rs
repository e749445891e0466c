//! Tutor-side logic for STEMMY: what the detected emotion and topic mean for
//! the conversation, and how that context reaches the hosted chat model.

pub mod classifier;
pub mod emotion;
pub mod llm;
pub mod prompt;
pub mod topic;

pub use classifier::{TopicClassifier, TopicError, TopicScore};
pub use emotion::{Emotion, EmotionContext, emotion_instruction};
pub use llm::{ChatCompleter, ChatCompletion, LlmError, OpenAiClient, OpenAiConfig};
pub use prompt::{ChatMessage, Role, Signal, build_messages};
pub use topic::{Topic, topic_instruction};
