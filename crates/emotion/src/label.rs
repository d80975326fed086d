//! Emotion labels

use crate::EmotionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Facial emotion label.
///
/// Variants are declared in lexicographic order of their labels, so the
/// derived `Ord` is the same as comparing the label strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprise,
}

impl Emotion {
    /// All labels in lexicographic order
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Surprise,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Neutral => "neutral",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = EmotionError;

    /// Accepts the canonical labels plus the spellings used by common
    /// classifiers (FER+, HSEmotion).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angry" | "anger" => Ok(Emotion::Angry),
            "disgust" | "disgusted" | "contempt" => Ok(Emotion::Disgust),
            "fear" | "scared" | "fearful" => Ok(Emotion::Fear),
            "happy" | "happiness" => Ok(Emotion::Happy),
            "neutral" => Ok(Emotion::Neutral),
            "sad" | "sadness" => Ok(Emotion::Sad),
            "surprise" | "surprised" => Ok(Emotion::Surprise),
            other => Err(EmotionError::UnknownLabel(other.to_string())),
        }
    }
}
