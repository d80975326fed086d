//! Frame to sample adapter

use crate::Sample;
use camera_capture::VideoFrame;
use emotion::{EmotionClassifier, EmotionError, FaceEmotions};

/// Turns a frame into at most one emotion sample
pub trait SampleSource: Send {
    /// `Ok(None)` when the frame holds no usable face
    fn sample(&mut self, frame: &VideoFrame) -> Result<Option<Sample>, EmotionError>;
}

/// Samples the most prominent face reported by a classifier
pub struct EmotionSource<C> {
    classifier: C,
}

impl<C: EmotionClassifier> EmotionSource<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }
}

/// Largest face by box area; the earliest wins on equal areas
fn most_prominent(faces: &[FaceEmotions]) -> Option<&FaceEmotions> {
    faces.iter().fold(None, |best, face| match best {
        Some(b) if face.bbox.area() <= b.bbox.area() => Some(b),
        _ => Some(face),
    })
}

impl<C: EmotionClassifier> SampleSource for EmotionSource<C> {
    fn sample(&mut self, frame: &VideoFrame) -> Result<Option<Sample>, EmotionError> {
        let faces = self.classifier.detect(frame)?;
        Ok(most_prominent(&faces)
            .and_then(|face| face.scores.top())
            .map(|(emotion, score)| Sample::new(emotion, score)))
    }
}
