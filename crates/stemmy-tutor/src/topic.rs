//! STEM subjects the tutor can be steered toward.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// The fixed list of subjects offered by the UI's domain picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum Topic {
    #[strum(to_string = "Mathematics", serialize = "math", serialize = "maths")]
    Mathematics,
    #[strum(to_string = "Physics")]
    Physics,
    #[strum(to_string = "Chemistry")]
    Chemistry,
    #[strum(to_string = "Biology")]
    Biology,
    #[strum(
        to_string = "Computer Science",
        serialize = "computer_science",
        serialize = "cs"
    )]
    ComputerScience,
    #[strum(to_string = "Engineering")]
    Engineering,
    #[strum(to_string = "Earth Science", serialize = "earth_science")]
    EarthScience,
    #[strum(to_string = "Astronomy")]
    Astronomy,
    #[strum(to_string = "Statistics", serialize = "stats")]
    Statistics,
}

impl Topic {
    pub fn all() -> Vec<Topic> {
        Topic::iter().collect()
    }
}

/// System-prompt fragment describing what the learner is asking about.
///
/// The label is free text from the UI and is forwarded as given.
pub fn topic_instruction(label: Option<&str>, confidence: f32) -> String {
    let label = match label {
        Some(l) if !l.is_empty() => l,
        _ => {
            return "No topic detected; infer topic from user message and keep \
                    explanations general."
                .to_owned();
        }
    };
    let pct = (confidence.max(0.0) * 100.0).round() as i64;
    format!(
        "Detected user topic intent: {label} (confidence {pct}%). Tailor the explanation \
         using this topic and provide relevant, grade-appropriate examples."
    )
}
