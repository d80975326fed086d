//! Monitoring configuration

use crate::{FollowUpThresholds, MonitorError, SessionDuration};
use serde::Deserialize;

/// Monitoring session configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Rolling buffer capacity (samples)
    pub buffer_capacity: usize,

    /// Window length used when a start request omits the duration (seconds)
    pub default_duration_secs: f64,

    /// Longest window a start request may ask for (seconds)
    pub max_duration_secs: f64,

    /// Consecutive frame read failures before the capture loop gives up
    pub max_consecutive_errors: u32,

    /// JPEG quality of the preview endpoint (1-100)
    pub preview_jpeg_quality: u8,

    /// Follow-up thresholds; a configured table replaces the default one
    pub followup_thresholds: FollowUpThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: ring_buffer::DEFAULT_CAPACITY,
            default_duration_secs: 5.0,
            max_duration_secs: 300.0,
            max_consecutive_errors: 30,
            preview_jpeg_quality: 80,
            followup_thresholds: FollowUpThresholds::default(),
        }
    }
}

impl MonitorConfig {
    /// Reject settings the session or capture loop cannot run with
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.buffer_capacity == 0 {
            return Err(MonitorError::InvalidConfig(
                "buffer_capacity must be at least 1".to_string(),
            ));
        }
        if !self.max_duration_secs.is_finite() || self.max_duration_secs <= 0.0 {
            return Err(MonitorError::InvalidConfig(format!(
                "max_duration_secs must be a positive number, got {}",
                self.max_duration_secs
            )));
        }
        self.duration(None).map_err(|e| {
            MonitorError::InvalidConfig(format!("default_duration_secs: {}", e))
        })?;
        Ok(())
    }

    /// Resolve a requested window length, falling back to the default
    pub fn duration(&self, requested_secs: Option<f64>) -> Result<SessionDuration, MonitorError> {
        SessionDuration::new(
            requested_secs.unwrap_or(self.default_duration_secs),
            self.max_duration_secs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.buffer_capacity, 10);
        assert_eq!(config.duration(None).unwrap().as_secs_f64(), 5.0);
    }

    #[test]
    fn test_requested_duration_is_validated() {
        let config = MonitorConfig::default();
        assert_eq!(config.duration(Some(12.0)).unwrap().as_secs_f64(), 12.0);
        assert!(config.duration(Some(0.0)).is_err());
        assert!(config.duration(Some(301.0)).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(MonitorConfig::default().validate().is_ok());

        let invalid = [
            MonitorConfig {
                buffer_capacity: 0,
                ..Default::default()
            },
            MonitorConfig {
                max_duration_secs: f64::INFINITY,
                ..Default::default()
            },
            MonitorConfig {
                max_duration_secs: 0.0,
                ..Default::default()
            },
            MonitorConfig {
                default_duration_secs: 600.0,
                ..Default::default()
            },
            MonitorConfig {
                max_duration_secs: 1e30,
                default_duration_secs: 1e25,
                ..Default::default()
            },
        ];
        for config in invalid {
            assert!(
                matches!(config.validate(), Err(MonitorError::InvalidConfig(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_huge_maximum_still_rejects_unrepresentable_requests() {
        let config = MonitorConfig {
            max_duration_secs: 1e30,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.duration(Some(1e25)),
            Err(MonitorError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: MonitorConfig =
            serde_json::from_str(r#"{"buffer_capacity": 20, "followup_thresholds": {"sad": 0.4}}"#)
                .unwrap();
        assert_eq!(config.buffer_capacity, 20);
        assert_eq!(config.max_duration_secs, 300.0);
        assert_eq!(config.followup_thresholds.threshold(emotion::Emotion::Sad), Some(0.4));
        assert_eq!(config.followup_thresholds.threshold(emotion::Emotion::Neutral), None);
    }
}
