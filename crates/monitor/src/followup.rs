//! Confusion follow-up heuristic

use crate::Verdict;
use emotion::Emotion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-label score thresholds above which a verdict asks for follow-up.
///
/// Only the dominant label is considered; co-occurring secondary emotions
/// in the buffer are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowUpThresholds(BTreeMap<Emotion, f64>);

impl Default for FollowUpThresholds {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Emotion::Neutral, 0.7),
            (Emotion::Surprise, 0.6),
            (Emotion::Fear, 0.5),
            (Emotion::Sad, 0.5),
        ]))
    }
}

impl FollowUpThresholds {
    /// Threshold for a label, `None` for labels that never trigger
    pub fn threshold(&self, emotion: Emotion) -> Option<f64> {
        self.0.get(&emotion).copied()
    }

    /// True iff the dominant label is listed and its score strictly exceeds the threshold
    pub fn evaluate(&self, verdict: &Verdict) -> bool {
        self.threshold(verdict.dominant_emotion)
            .is_some_and(|threshold| verdict.normalized_score > threshold)
    }
}

/// Whether the learner appears confused enough to warrant a follow-up
pub fn needs_followup(verdict: &Verdict, thresholds: &FollowUpThresholds) -> bool {
    thresholds.evaluate(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(emotion: Emotion, score: f64) -> Verdict {
        Verdict {
            dominant_emotion: emotion,
            normalized_score: score,
            confidence: 1.0,
        }
    }

    #[test]
    fn test_neutral_threshold_is_strict() {
        let table = FollowUpThresholds::default();
        assert!(needs_followup(&verdict(Emotion::Neutral, 0.75), &table));
        assert!(!needs_followup(&verdict(Emotion::Neutral, 0.65), &table));
        assert!(!needs_followup(&verdict(Emotion::Neutral, 0.7), &table));
    }

    #[test]
    fn test_default_table() {
        let table = FollowUpThresholds::default();
        assert_eq!(table.threshold(Emotion::Surprise), Some(0.6));
        assert_eq!(table.threshold(Emotion::Fear), Some(0.5));
        assert_eq!(table.threshold(Emotion::Sad), Some(0.5));
        assert!(needs_followup(&verdict(Emotion::Sad, 0.51), &table));
        assert!(needs_followup(&verdict(Emotion::Surprise, 0.61), &table));
    }

    #[test]
    fn test_unlisted_labels_never_trigger() {
        let table = FollowUpThresholds::default();
        for emotion in [Emotion::Happy, Emotion::Angry, Emotion::Disgust] {
            assert!(!needs_followup(&verdict(emotion, 0.99), &table));
        }
    }

    #[test]
    fn test_custom_table_from_json() {
        let table: FollowUpThresholds = serde_json::from_str(r#"{"happy": 0.9}"#).unwrap();
        assert!(needs_followup(&verdict(Emotion::Happy, 0.95), &table));
        assert!(!needs_followup(&verdict(Emotion::Neutral, 0.99), &table));
    }
}
