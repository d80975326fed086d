//! Samples and the dominant-emotion verdict

use crate::SessionDuration;
use emotion::Emotion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One classified frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub emotion: Emotion,
    /// Classifier confidence in `emotion`, 0.0 to 1.0; non-finite input reads as 0.0
    pub score: f32,
}

impl Sample {
    pub fn new(emotion: Emotion, score: f32) -> Self {
        Self {
            emotion,
            score: if score.is_finite() {
                score.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }
}

/// Aggregated view of the rolling buffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Label with the largest summed score
    #[serde(rename = "emotion")]
    pub dominant_emotion: Emotion,
    /// Dominant label's summed score divided by the number of buffered samples
    #[serde(rename = "score")]
    pub normalized_score: f64,
    /// Buffered samples per second of window length. A fill-rate heuristic,
    /// not a probability; exceeds 1.0 when sampling outpaces one per second.
    pub confidence: f64,
}

impl Verdict {
    /// Reduce samples into a verdict; `None` when there are no samples.
    ///
    /// Equal sums resolve to the lexicographically smallest label.
    pub fn from_samples<'a, I>(samples: I, duration: SessionDuration) -> Option<Verdict>
    where
        I: IntoIterator<Item = &'a Sample>,
    {
        let mut sums: BTreeMap<Emotion, f64> = BTreeMap::new();
        let mut count = 0usize;
        for sample in samples {
            *sums.entry(sample.emotion).or_insert(0.0) += sample.score as f64;
            count += 1;
        }

        let (dominant_emotion, sum) = sums
            .into_iter()
            .fold(None, |best: Option<(Emotion, f64)>, (emotion, sum)| match best {
                Some((_, best_sum)) if sum <= best_sum => best,
                _ => Some((emotion, sum)),
            })?;

        Some(Verdict {
            dominant_emotion,
            normalized_score: sum / count as f64,
            confidence: count as f64 / duration.as_secs_f64(),
        })
    }
}
