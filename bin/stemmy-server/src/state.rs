//! Shared application state injected into every Axum handler.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use stemmy_tutor::{ChatCompleter, TopicClassifier};
use stemmy_vision::{EmotionRecognizer, LabelSmoother};

use crate::config::Config;

/// Label stored when a frame shows no face.
pub const NO_FACE_LABEL: &str = "neutral";

/// The most recent emotion the process believes the learner shows.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionReading {
    pub label: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl EmotionReading {
    /// Unix seconds with sub-second precision.
    pub fn unix_seconds(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 1000.0
    }
}

/// Holds at most one current emotion plus the smoothing window feeding it.
#[derive(Debug)]
pub struct EmotionTracker {
    current: RwLock<Option<EmotionReading>>,
    smoother: Mutex<LabelSmoother>,
}

impl EmotionTracker {
    pub fn new(window: usize) -> Self {
        Self {
            current: RwLock::new(None),
            smoother: Mutex::new(LabelSmoother::new(window)),
        }
    }

    pub fn current(&self) -> Option<EmotionReading> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Feed a face detection through the smoother and store the result.
    pub fn observe(&self, label: &str, confidence: f32) -> EmotionReading {
        let smoothed = self
            .smoother
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(label, confidence);
        self.store(smoothed.label, smoothed.confidence)
    }

    /// A frame without a face: the reading drops to neutral, the window is
    /// left as it was.
    pub fn observe_no_face(&self) -> EmotionReading {
        self.store(NO_FACE_LABEL.to_owned(), 0.0)
    }

    pub fn reset(&self) {
        self.smoother
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn store(&self, label: String, confidence: f32) -> EmotionReading {
        let reading = EmotionReading {
            label,
            confidence,
            timestamp: Utc::now(),
        };
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(reading.clone());
        reading
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicReading {
    pub label: String,
    pub confidence: f32,
}

/// Last topic the classifier assigned.
#[derive(Debug, Default)]
pub struct TopicTracker {
    current: RwLock<Option<TopicReading>>,
}

impl TopicTracker {
    pub fn current(&self) -> Option<TopicReading> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, label: impl Into<String>, confidence: f32) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(TopicReading {
            label: label.into(),
            confidence,
        });
    }
}

/// State shared across all HTTP handlers.
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Face-emotion model; `None` when the weights failed to load.
    pub recognizer: Option<Arc<dyn EmotionRecognizer>>,
    /// Topic model; `None` when no export was found.
    pub topic_classifier: Option<Arc<TopicClassifier>>,
    pub llm: Arc<dyn ChatCompleter>,
    pub emotion: EmotionTracker,
    pub topic: TopicTracker,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("emotion_model_loaded", &self.recognizer.is_some())
            .field("topic_model_loaded", &self.topic_classifier.is_some())
            .field("emotion", &self.emotion)
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn observe_smooths_and_stores() {
        let tracker = EmotionTracker::new(3);
        tracker.observe("happy", 0.9);
        tracker.observe("sad", 0.5);
        let reading = tracker.observe("happy", 0.7);
        assert_eq!(reading.label, "happy");
        assert!((reading.confidence - 0.8).abs() < 1e-6);
        assert_eq!(tracker.current(), Some(reading));
    }

    #[test]
    fn no_face_overwrites_reading_but_not_window() {
        let tracker = EmotionTracker::new(3);
        tracker.observe("angry", 0.9);
        let reading = tracker.observe_no_face();
        assert_eq!(reading.label, NO_FACE_LABEL);
        assert_eq!(reading.confidence, 0.0);
        // The window still remembers the earlier angry frame.
        assert_eq!(tracker.observe("happy", 0.6).label, "happy");
        assert_eq!(tracker.observe("angry", 0.8).label, "angry");
    }

    #[test]
    fn reset_clears_everything() {
        let tracker = EmotionTracker::new(3);
        tracker.observe("happy", 0.9);
        tracker.observe("happy", 0.9);
        tracker.reset();
        assert!(tracker.current().is_none());
        assert_eq!(tracker.observe("sad", 0.4).label, "sad");
    }

    #[test]
    fn topic_tracker_keeps_last_value() {
        let topics = TopicTracker::default();
        assert!(topics.current().is_none());
        topics.set("Physics", 0.4);
        topics.set("Biology", 0.7);
        assert_eq!(
            topics.current(),
            Some(TopicReading { label: "Biology".into(), confidence: 0.7 })
        );
    }
}
