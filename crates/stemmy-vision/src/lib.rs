//! Face-emotion recognition for the STEMMY tutor.
//!
//! The heavy lifting is done by a pretrained YOLO face-emotion model exported
//! to ONNX and executed through ONNX Runtime.  This crate only prepares the
//! input frame, runs a single forward pass, reads back the highest-scoring
//! class, and smooths the resulting labels over a short window.

pub mod error;
pub mod preprocess;
pub mod recognizer;
pub mod smoothing;
mod yolo;

pub use error::VisionError;
pub use recognizer::{DEFAULT_LABELS, EmotionRecognizer, Prediction, RecognizerConfig, select_prediction};
#[cfg(feature = "onnx")]
pub use recognizer::YoloEmotionModel;
pub use smoothing::{LabelSmoother, SmoothedLabel};
