//! Face emotion detection

use crate::{ClassifierConfig, Emotion, EmotionError};
use camera_capture::frame::VideoFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use tract_onnx::prelude::*;

/// FER+ output order
const FERPLUS_LABELS: [&str; 8] = [
    "neutral",
    "happiness",
    "surprise",
    "sadness",
    "anger",
    "disgust",
    "fear",
    "contempt",
];

/// Face bounding box in frame pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceBbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
}

impl FaceBbox {
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Emotion label to score mapping for one face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionScores(BTreeMap<Emotion, f32>);

impl EmotionScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to the score of a label (aliases such as contempt fold into their label)
    pub fn add(&mut self, emotion: Emotion, score: f32) {
        *self.0.entry(emotion).or_insert(0.0) += score;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        self.0.iter().map(|(e, s)| (*e, *s))
    }

    /// Highest scoring label; ties go to the lexicographically smallest label
    pub fn top(&self) -> Option<(Emotion, f32)> {
        self.iter().fold(None, |best, (emotion, score)| match best {
            Some((_, best_score)) if score <= best_score => best,
            _ => Some((emotion, score)),
        })
    }
}

impl FromIterator<(Emotion, f32)> for EmotionScores {
    fn from_iter<I: IntoIterator<Item = (Emotion, f32)>>(iter: I) -> Self {
        let mut scores = EmotionScores::new();
        for (emotion, score) in iter {
            scores.add(emotion, score);
        }
        scores
    }
}

/// One detected face with its emotion scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceEmotions {
    pub bbox: FaceBbox,
    pub scores: EmotionScores,
}

/// Per-frame facial emotion classifier.
///
/// Returns every face found in the frame, or an empty list when there is none.
pub trait EmotionClassifier: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<FaceEmotions>, EmotionError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

impl<C: EmotionClassifier + ?Sized> EmotionClassifier for Box<C> {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<FaceEmotions>, EmotionError> {
        (**self).detect(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

type FerPlusPlan = TypedRunnableModel<TypedModel>;

/// FER+ emotion classifier.
///
/// Classifies the centered square of the frame as the face region. Falls
/// back to fixed neutral-leaning scores when no model is configured.
pub struct FerPlusClassifier {
    input_size: u32,
    min_face_contrast: f32,
    model: Option<FerPlusPlan>,
}

impl FerPlusClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, EmotionError> {
        if config.input_size == 0 {
            return Err(EmotionError::ModelLoad("input_size must be positive".into()));
        }

        let model = if let Some(path) = &config.model_path {
            info!("Loading emotion model from {}", path.display());
            let side = config.input_size as usize;
            let plan = tract_onnx::onnx()
                .model_for_path(path)
                .and_then(|model| model.with_input_fact(0, f32::fact([1, 1, side, side]).into()))
                .and_then(|model| model.into_optimized())
                .and_then(|model| model.into_runnable())
                .map_err(|e| {
                    error!("Failed to load emotion model: {}", e);
                    EmotionError::ModelLoad(e.to_string())
                })?;
            Some(plan)
        } else {
            warn!("No emotion model path configured. Using mock implementation.");
            None
        };

        Ok(Self {
            input_size: config.input_size,
            min_face_contrast: config.min_face_contrast,
            model,
        })
    }

    /// Mock classifier, never loads a model
    pub fn mock() -> Self {
        let config = ClassifierConfig::default();
        Self {
            input_size: config.input_size,
            min_face_contrast: config.min_face_contrast,
            model: None,
        }
    }

    pub fn is_mock(&self) -> bool {
        self.model.is_none()
    }

    fn classify(&self, face: &VideoFrame) -> Result<EmotionScores, EmotionError> {
        let Some(plan) = &self.model else {
            return Ok(mock_scores());
        };

        let side = self.input_size as usize;
        let gray = face
            .resize(self.input_size, self.input_size)
            .ok_or_else(|| EmotionError::ImageProcessing("malformed face region".into()))?
            .to_grayscale();
        if gray.len() != side * side {
            return Err(EmotionError::ImageProcessing(format!(
                "expected {} pixels, got {}",
                side * side,
                gray.len()
            )));
        }

        // FER+ takes raw 0-255 grayscale intensities
        let input: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, 1, side, side), |(_, _, y, x)| {
                gray[y * side + x] as f32
            })
            .into();

        let outputs = plan
            .run(tvec!(input.into()))
            .map_err(|e| EmotionError::Inference(e.to_string()))?;
        let logits: Vec<f32> = outputs
            .first()
            .ok_or_else(|| EmotionError::Inference("model produced no output".into()))?
            .to_array_view::<f32>()
            .map_err(|e| EmotionError::Inference(e.to_string()))?
            .iter()
            .copied()
            .collect();

        scores_from_logits(&logits)
    }
}

impl EmotionClassifier for FerPlusClassifier {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<FaceEmotions>, EmotionError> {
        let face = frame
            .center_square()
            .ok_or_else(|| EmotionError::ImageProcessing("empty frame".into()))?;

        let contrast = face.contrast();
        if contrast < self.min_face_contrast {
            debug!("No face: region contrast {:.2} below threshold", contrast);
            return Ok(Vec::new());
        }

        let scores = self.classify(&face)?;
        let side = face.width as f32;
        Ok(vec![FaceEmotions {
            bbox: FaceBbox {
                x: (frame.width as f32 - side) / 2.0,
                y: (frame.height as f32 - side) / 2.0,
                width: side,
                height: side,
                confidence: 1.0,
            },
            scores,
        }])
    }

    fn name(&self) -> &str {
        if self.is_mock() {
            "ferplus (mock)"
        } else {
            "ferplus"
        }
    }
}

fn mock_scores() -> EmotionScores {
    [
        (Emotion::Neutral, 0.72),
        (Emotion::Happy, 0.12),
        (Emotion::Surprise, 0.08),
        (Emotion::Sad, 0.04),
        (Emotion::Fear, 0.02),
        (Emotion::Angry, 0.01),
        (Emotion::Disgust, 0.01),
    ]
    .into_iter()
    .collect()
}

/// Softmax over FER+ logits, mapped onto the label set
fn scores_from_logits(logits: &[f32]) -> Result<EmotionScores, EmotionError> {
    if logits.len() != FERPLUS_LABELS.len() {
        return Err(EmotionError::Inference(format!(
            "expected {} logits, got {}",
            FERPLUS_LABELS.len(),
            logits.len()
        )));
    }

    let max_logit = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_sum: f32 = logits.iter().map(|&x| (x - max_logit).exp()).sum();

    FERPLUS_LABELS
        .iter()
        .zip(logits)
        .map(|(label, &logit)| -> Result<(Emotion, f32), EmotionError> {
            Ok((label.parse()?, (logit - max_logit).exp() / exp_sum))
        })
        .collect()
}
