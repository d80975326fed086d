//! Facial Emotion Classification
//!
//! Per-frame emotion analysis used by the monitoring session:
//! - Closed emotion label set with deterministic ordering
//! - Per-face score maps
//! - FER+ ONNX classifier with a model-less mock mode

pub mod config;
pub mod detector;
pub mod label;

pub use config::ClassifierConfig;
pub use detector::{EmotionClassifier, EmotionScores, FaceBbox, FaceEmotions, FerPlusClassifier};
pub use label::Emotion;

use thiserror::Error;

/// Emotion classification error types
#[derive(Error, Debug)]
pub enum EmotionError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Unknown emotion label: {0}")]
    UnknownLabel(String),
}
