//! The recognizer seam and its ONNX Runtime implementation.

use std::path::PathBuf;

#[cfg(feature = "onnx")]
use std::sync::Mutex;

#[cfg(feature = "onnx")]
use ort::session::Session;
#[cfg(feature = "onnx")]
use ort::session::builder::GraphOptimizationLevel;
#[cfg(feature = "onnx")]
use ort::value::Tensor;
#[cfg(feature = "onnx")]
use tracing::{debug, info, warn};

use crate::error::VisionError;
#[cfg(feature = "onnx")]
use crate::{preprocess, yolo};

/// Class names in the order the bundled face-emotion weights were trained on.
pub const DEFAULT_LABELS: [&str; 7] = [
    "angry",
    "disgusted",
    "fearful",
    "happy",
    "neutral",
    "sad",
    "surprised",
];

/// Label reported when a class id has no configured name.
const FALLBACK_LABEL: &str = "neutral";

/// Smallest input edge the detector is run at.
pub const MIN_IMAGE_SIZE: u32 = 320;

/// Inference parameters for [`YoloEmotionModel`].
#[derive(Debug, Clone)]
pub struct RecognizerConfig {
    /// ONNX export of the YOLO face-emotion weights.
    pub weights_path: PathBuf,
    /// Square input edge; clamped to at least [`MIN_IMAGE_SIZE`].
    pub image_size: u32,
    /// Scores below this are treated as "no face".
    pub confidence_threshold: f32,
    /// Class names indexed by class id.
    pub labels: Vec<String>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("models/emotion/best.onnx"),
            image_size: 640,
            confidence_threshold: 0.30,
            labels: DEFAULT_LABELS.iter().map(|s| (*s).to_owned()).collect(),
        }
    }
}

/// The strongest face-emotion detection in a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    pub class_id: usize,
}

/// Anything that can turn an encoded frame into an emotion prediction.
///
/// Implementations are blocking; async callers should run them on a blocking
/// thread.
pub trait EmotionRecognizer: Send + Sync {
    /// Predict the emotion of the most confident face in `image`.
    ///
    /// Returns `Ok(None)` when no face scores above the confidence threshold.
    fn recognize(&self, image: &[u8]) -> Result<Option<Prediction>, VisionError>;
}

/// Turn the best `(class_id, score)` of a frame into a [`Prediction`].
///
/// Scores at or above `threshold` count as a face. Class ids without a
/// configured label are reported as `neutral`.
pub fn select_prediction(
    best: Option<(usize, f32)>,
    labels: &[String],
    threshold: f32,
) -> Option<Prediction> {
    best.filter(|(_, score)| *score >= threshold)
        .map(|(class_id, confidence)| Prediction {
            label: labels
                .get(class_id)
                .cloned()
                .unwrap_or_else(|| FALLBACK_LABEL.to_owned()),
            confidence,
            class_id,
        })
}

/// YOLO face-emotion detector running on ONNX Runtime.
#[cfg(feature = "onnx")]
pub struct YoloEmotionModel {
    // `Session::run` needs `&mut self`.
    session: Mutex<Session>,
    image_size: u32,
    confidence_threshold: f32,
    labels: Vec<String>,
}

#[cfg(feature = "onnx")]
impl std::fmt::Debug for YoloEmotionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloEmotionModel")
            .field("image_size", &self.image_size)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "onnx")]
impl YoloEmotionModel {
    /// Load the weights and warm the session up with a blank frame.
    pub fn load(config: &RecognizerConfig) -> Result<Self, VisionError> {
        if !config.weights_path.exists() {
            return Err(VisionError::WeightsNotFound(config.weights_path.clone()));
        }

        let session = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_err)?
            .commit_from_file(&config.weights_path)
            .map_err(load_err)?;

        let model = Self {
            session: Mutex::new(session),
            image_size: config.image_size.max(MIN_IMAGE_SIZE),
            confidence_threshold: config.confidence_threshold,
            labels: config.labels.clone(),
        };

        match model.infer(preprocess::blank_tensor(model.image_size)) {
            Ok(_) => debug!("emotion model warm-up done"),
            Err(e) => warn!(error = %e, "emotion model warm-up failed"),
        }

        info!(
            path = %config.weights_path.display(),
            image_size = model.image_size,
            classes = model.labels.len(),
            "emotion model loaded"
        );
        Ok(model)
    }

    fn infer(&self, input: Vec<f32>) -> Result<Option<(usize, f32)>, VisionError> {
        let size = self.image_size as usize;
        let tensor = Tensor::from_array(([1usize, 3, size, size], input)).map_err(infer_err)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| VisionError::Inference("session lock poisoned".into()))?;
        let outputs = session.run(ort::inputs![tensor]).map_err(infer_err)?;
        let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(infer_err)?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        yolo::decode_best(data, &dims, self.labels.len())
    }
}

#[cfg(feature = "onnx")]
impl EmotionRecognizer for YoloEmotionModel {
    fn recognize(&self, image: &[u8]) -> Result<Option<Prediction>, VisionError> {
        let frame = preprocess::decode(image)?;
        let input = preprocess::to_input_tensor(&frame, self.image_size);

        let prediction =
            select_prediction(self.infer(input)?, &self.labels, self.confidence_threshold);

        debug!(
            width = frame.width(),
            height = frame.height(),
            prediction = ?prediction,
            "frame recognised"
        );
        Ok(prediction)
    }
}

#[cfg(feature = "onnx")]
fn load_err(e: impl std::fmt::Display) -> VisionError {
    VisionError::ModelLoad(e.to_string())
}

#[cfg(feature = "onnx")]
fn infer_err(e: impl std::fmt::Display) -> VisionError {
    VisionError::Inference(e.to_string())
}
