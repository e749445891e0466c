//! Bag-of-words topic classifier.
//!
//! The model is a linear classifier over word counts, exported to JSON:
//!
//! ```json
//! {
//!   "vocabulary": { "derivative": 0, "atom": 1 },
//!   "classes": ["Chemistry", "Mathematics"],
//!   "coef": [[-0.4, 1.3], [1.1, -0.2]],
//!   "intercept": [0.0, 0.1]
//! }
//! ```
//!
//! A binary model may ship a single coefficient row; it scores the second
//! class against the first.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum TopicError {
    #[error("cannot read topic model {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("topic model is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inconsistent topic model: {0}")]
    Shape(String),
}

/// One class and its probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicScore {
    pub label: String,
    pub prob: f32,
}

#[derive(Debug, Deserialize)]
struct TopicModelFile {
    vocabulary: HashMap<String, usize>,
    classes: Vec<String>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct TopicClassifier {
    vocabulary: HashMap<String, usize>,
    classes: Vec<String>,
    coef: Vec<Vec<f32>>,
    intercept: Vec<f32>,
}

impl TopicClassifier {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TopicError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TopicError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let classifier = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            classes = classifier.classes.len(),
            vocabulary = classifier.vocabulary.len(),
            "topic classifier loaded"
        );
        Ok(classifier)
    }

    pub fn from_json(raw: &str) -> Result<Self, TopicError> {
        let file: TopicModelFile = serde_json::from_str(raw)?;
        Self::new(file.vocabulary, file.classes, file.coef, file.intercept)
    }

    pub fn new(
        vocabulary: HashMap<String, usize>,
        classes: Vec<String>,
        coef: Vec<Vec<f32>>,
        intercept: Vec<f32>,
    ) -> Result<Self, TopicError> {
        if classes.is_empty() {
            return Err(TopicError::Shape("no classes".into()));
        }
        let binary = classes.len() == 2 && coef.len() == 1;
        if coef.len() != classes.len() && !binary {
            return Err(TopicError::Shape(format!(
                "{} coefficient rows for {} classes",
                coef.len(),
                classes.len()
            )));
        }
        if intercept.len() != coef.len() {
            return Err(TopicError::Shape(format!(
                "{} intercepts for {} coefficient rows",
                intercept.len(),
                coef.len()
            )));
        }
        let features = vocabulary.values().max().map_or(0, |m| m + 1);
        if let Some(row) = coef.iter().find(|row| row.len() < features) {
            return Err(TopicError::Shape(format!(
                "coefficient row has {} weights but vocabulary needs {features}",
                row.len()
            )));
        }

        Ok(Self {
            vocabulary,
            classes,
            coef,
            intercept,
        })
    }

    /// Class probabilities for `text`, in class order.
    pub fn probabilities(&self, text: &str) -> Vec<f32> {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_default() += 1.0;
            }
        }

        let scores: Vec<f32> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| bias + counts.iter().map(|(&i, &n)| row[i] * n).sum::<f32>())
            .collect();

        if self.coef.len() == 1 && self.classes.len() == 2 {
            softmax(&[0.0, scores[0]])
        } else {
            softmax(&scores)
        }
    }

    /// Most likely class and its probability.
    pub fn predict(&self, text: &str) -> TopicScore {
        self.top_k(text, 1)
            .into_iter()
            .next()
            .unwrap_or_else(|| TopicScore {
                label: self.classes[0].clone(),
                prob: 0.0,
            })
    }

    /// The `k` most likely classes, best first.  `k` is at least 1.
    pub fn top_k(&self, text: &str, k: usize) -> Vec<TopicScore> {
        let probs = self.probabilities(text);
        let mut ranked: Vec<(usize, f32)> = probs.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(k.max(1))
            .map(|(i, prob)| TopicScore {
                label: self.classes[i].clone(),
                prob,
            })
            .collect()
    }
}

/// Lowercased runs of two or more word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_owned)
        .collect()
}

fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const MODEL: &str = r#"{
        "vocabulary": { "derivative": 0, "integral": 1, "atom": 2, "molecule": 3 },
        "classes": ["Chemistry", "Mathematics", "Physics"],
        "coef": [
            [-1.0, -1.0,  2.0,  2.0],
            [ 2.0,  2.0, -1.0, -1.0],
            [ 0.0,  0.0,  0.5,  0.0]
        ],
        "intercept": [0.0, 0.0, 0.0]
    }"#;

    #[test]
    fn tokenizer_drops_short_tokens_and_punctuation() {
        assert_eq!(
            tokenize("What's a derivative, i.e. d/dx?"),
            vec!["what", "derivative", "dx"]
        );
    }

    #[test]
    fn predicts_dominant_class() {
        let clf = TopicClassifier::from_json(MODEL).unwrap();
        let top = clf.predict("How do I take the derivative of an integral?");
        assert_eq!(top.label, "Mathematics");
        assert!(top.prob > 0.9);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let clf = TopicClassifier::from_json(MODEL).unwrap();
        let sum: f32 = clf.probabilities("atom molecule").iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn unknown_words_give_uniform_distribution() {
        let clf = TopicClassifier::from_json(MODEL).unwrap();
        for p in clf.probabilities("hello there") {
            assert!((p - 1.0 / 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn top_k_is_sorted_and_clamped() {
        let clf = TopicClassifier::from_json(MODEL).unwrap();
        let top = clf.top_k("atom atom molecule", 5);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].label, "Chemistry");
        assert!(top[0].prob >= top[1].prob && top[1].prob >= top[2].prob);
        assert_eq!(clf.top_k("atom", 0).len(), 1);
    }

    #[test]
    fn binary_single_row_model() {
        let raw = r#"{
            "vocabulary": { "cell": 0 },
            "classes": ["Biology", "Physics"],
            "coef": [[-3.0]],
            "intercept": [0.0]
        }"#;
        let clf = TopicClassifier::from_json(raw).unwrap();
        assert_eq!(clf.predict("cell cell").label, "Biology");
    }

    #[test]
    fn rejects_inconsistent_shapes() {
        let raw = r#"{
            "vocabulary": { "a1": 0, "b2": 5 },
            "classes": ["X", "Y", "Z"],
            "coef": [[0.0], [0.0], [0.0]],
            "intercept": [0.0, 0.0, 0.0]
        }"#;
        assert!(matches!(
            TopicClassifier::from_json(raw),
            Err(TopicError::Shape(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("stemmy-no-such-topic-model.json");
        assert!(matches!(
            TopicClassifier::from_path(path),
            Err(TopicError::Io { .. })
        ));
    }
}
