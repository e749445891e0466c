use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by the emotion recognizer.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The ONNX weights file does not exist.
    #[error("model weights not found at {}", .0.display())]
    WeightsNotFound(PathBuf),

    /// ONNX Runtime refused to build a session for the weights.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// The uploaded bytes are not a decodable image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The forward pass itself failed.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The model produced a tensor that is not a YOLO detection head.
    #[error("unexpected model output shape {0:?}")]
    OutputShape(Vec<i64>),
}
