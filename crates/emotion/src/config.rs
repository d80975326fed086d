//! Classifier configuration

use serde::Deserialize;
use std::path::PathBuf;

/// Emotion classifier configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path to a FER+ ONNX model; mock mode when unset
    pub model_path: Option<PathBuf>,

    /// Square input side expected by the model (pixels)
    pub input_size: u32,

    /// Minimum grayscale standard deviation for the face region to count
    /// as a face. Covered or blank frames fall below it.
    pub min_face_contrast: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            input_size: 64,
            min_face_contrast: 8.0,
        }
    }
}
