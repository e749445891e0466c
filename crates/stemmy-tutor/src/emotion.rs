//! Emotion labels and the static guidance attached to each of them.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Facial emotions the recognizer can report.
///
/// Parsing is case-insensitive and accepts the noun forms some datasets use
/// (`surprise`, `fear`, ...).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Emotion {
    #[strum(to_string = "angry", serialize = "anger")]
    Angry,
    #[strum(to_string = "disgusted", serialize = "disgust")]
    Disgusted,
    #[strum(to_string = "fearful", serialize = "fear")]
    Fearful,
    #[strum(to_string = "happy", serialize = "happiness")]
    Happy,
    #[strum(to_string = "neutral")]
    Neutral,
    #[strum(to_string = "sad", serialize = "sadness")]
    Sad,
    #[strum(to_string = "surprised", serialize = "surprise")]
    Surprised,
}

/// What an emotion says about the learner, and how to respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmotionContext {
    pub context: &'static str,
    pub suggestions: [&'static str; 3],
}

impl Emotion {
    pub fn from_label(label: &str) -> Option<Self> {
        label.trim().parse().ok()
    }

    pub fn context(self) -> &'static EmotionContext {
        match self {
            Emotion::Happy => &HAPPY,
            Emotion::Sad => &SAD,
            Emotion::Angry => &ANGRY,
            Emotion::Surprised => &SURPRISED,
            Emotion::Fearful => &FEARFUL,
            Emotion::Disgusted => &DISGUSTED,
            Emotion::Neutral => &NEUTRAL,
        }
    }
}

/// Context for an arbitrary model label; unknown labels read as neutral.
pub fn context_for_label(label: &str) -> &'static EmotionContext {
    Emotion::from_label(label)
        .unwrap_or(Emotion::Neutral)
        .context()
}

static HAPPY: EmotionContext = EmotionContext {
    context: "User appears happy and engaged. Great time for learning!",
    suggestions: [
        "Ask about advanced topics",
        "Suggest challenging problems",
        "Encourage exploration",
    ],
};

static SAD: EmotionContext = EmotionContext {
    context: "User seems sad or frustrated. Offer encouragement and support.",
    suggestions: [
        "Break down complex topics into smaller steps",
        "Provide positive reinforcement",
        "Suggest taking a break if needed",
    ],
};

static ANGRY: EmotionContext = EmotionContext {
    context: "User appears frustrated or angry. Approach with patience.",
    suggestions: [
        "Acknowledge their frustration",
        "Offer alternative explanations",
        "Suggest simpler approaches",
    ],
};

static SURPRISED: EmotionContext = EmotionContext {
    context: "User seems surprised. They might have discovered something new!",
    suggestions: [
        "Ask what surprised them",
        "Explain the concept in detail",
        "Connect to related topics",
    ],
};

static FEARFUL: EmotionContext = EmotionContext {
    context: "User appears anxious or fearful about the topic.",
    suggestions: [
        "Provide reassurance",
        "Start with basics",
        "Offer step-by-step guidance",
    ],
};

static DISGUSTED: EmotionContext = EmotionContext {
    context: "User seems displeased with the current topic or approach.",
    suggestions: [
        "Ask what they'd prefer to learn",
        "Try a different teaching method",
        "Find more engaging examples",
    ],
};

static NEUTRAL: EmotionContext = EmotionContext {
    context: "User appears neutral and focused.",
    suggestions: [
        "Continue with current approach",
        "Ask engaging questions",
        "Provide clear explanations",
    ],
};

/// System-prompt fragment describing the learner's emotional state.
///
/// A confidence of exactly zero, or one outside `[0, 1]`, is reported as
/// `n/a` since it carries no information.
pub fn emotion_instruction(label: Option<&str>, confidence: f32) -> String {
    let key = match label {
        Some(l) if !l.is_empty() => l.trim().to_lowercase(),
        _ => {
            return "No reliable emotion detected; assume a neutral, supportive tone. \
                    Keep explanations clear and encouraging."
                .to_owned();
        }
    };

    let info = context_for_label(&key);
    let pct = if confidence > 0.0 && confidence <= 1.0 {
        format!("{}%", (confidence * 100.0).round() as i64)
    } else {
        "n/a".to_owned()
    };

    format!(
        "Current user emotion: {key} (confidence {pct}). Guidance: {}. \
         Adjust tone and strategy accordingly. Tips: {}.",
        info.context,
        info.suggestions.join(", "),
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!(Emotion::from_label("Surprise"), Some(Emotion::Surprised));
        assert_eq!(Emotion::from_label(" HAPPY "), Some(Emotion::Happy));
        assert_eq!(Emotion::from_label("fear"), Some(Emotion::Fearful));
        assert_eq!(Emotion::from_label("contempt"), None);
    }

    #[test]
    fn display_round_trips_for_every_label() {
        for emotion in Emotion::iter() {
            assert_eq!(Emotion::from_label(&emotion.to_string()), Some(emotion));
        }
    }

    #[test]
    fn unknown_label_uses_neutral_context() {
        assert_eq!(context_for_label("bored"), Emotion::Neutral.context());
    }

    #[test]
    fn instruction_without_emotion() {
        let text = emotion_instruction(None, 0.9);
        assert!(text.starts_with("No reliable emotion detected"));
        assert_eq!(emotion_instruction(Some(""), 0.9), text);
    }

    #[test]
    fn blank_label_is_still_a_signal() {
        let text = emotion_instruction(Some("  "), 0.5);
        assert!(text.starts_with("Current user emotion:  (confidence 50%)"));
        assert!(text.contains(Emotion::Neutral.context().context));
    }

    #[test]
    fn instruction_with_emotion() {
        let text = emotion_instruction(Some("Sad"), 0.756);
        assert_eq!(
            text,
            "Current user emotion: sad (confidence 76%). Guidance: User seems sad or \
             frustrated. Offer encouragement and support.. Adjust tone and strategy \
             accordingly. Tips: Break down complex topics into smaller steps, Provide \
             positive reinforcement, Suggest taking a break if needed."
        );
    }

    #[test]
    fn zero_or_out_of_range_confidence_is_na() {
        assert!(emotion_instruction(Some("happy"), 0.0).contains("(confidence n/a)"));
        assert!(emotion_instruction(Some("happy"), 1.5).contains("(confidence n/a)"));
    }
}
