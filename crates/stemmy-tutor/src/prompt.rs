//! Assembly of the message list sent to the chat model.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::emotion::emotion_instruction;
use crate::topic::topic_instruction;

pub const PERSONA: &str = "You are a helpful STEM tutor called STEMMY.";

const EMOTION_PREAMBLE: &str =
    "Adapt your tone and teaching strategy based on the following emotion signal. ";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
}

impl Role {
    /// Only the exact OpenAI role names are accepted; anything else,
    /// including a missing role, is treated as the user speaking.
    pub fn normalize(role: Option<&str>) -> Self {
        role.and_then(|r| r.parse().ok()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Build a message from loosely-typed client history.
    pub fn from_loose(role: Option<&str>, content: Option<String>) -> Self {
        Self::new(Role::normalize(role), content.unwrap_or_default())
    }
}

/// A label with its confidence, as injected into the system prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    pub label: Option<String>,
    pub confidence: f32,
}

impl Signal {
    pub fn new(label: Option<String>, confidence: f32) -> Self {
        Self { label, confidence }
    }
}

/// Persona, then the optional emotion and topic guidance, then the prior
/// conversation, then the new user message.
pub fn build_messages(
    emotion: Option<&Signal>,
    topic: Option<&Signal>,
    history: &[ChatMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 4);
    messages.push(ChatMessage::system(PERSONA));

    if let Some(signal) = emotion {
        messages.push(ChatMessage::system(format!(
            "{EMOTION_PREAMBLE}{}",
            emotion_instruction(signal.label.as_deref(), signal.confidence)
        )));
    }
    if let Some(signal) = topic {
        messages.push(ChatMessage::system(topic_instruction(
            signal.label.as_deref(),
            signal.confidence,
        )));
    }

    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(message));
    messages
}
