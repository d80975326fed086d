//! Validated monitoring window length

use crate::MonitorError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Length of a monitoring window in seconds.
///
/// Always finite and strictly positive, so verdict confidence never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SessionDuration {
    secs: f64,
    #[serde(skip)]
    duration: Duration,
}

impl SessionDuration {
    /// Validate `secs` against `(0, max_secs]`.
    ///
    /// Values too large for a `std::time::Duration` are rejected whatever the maximum.
    pub fn new(secs: f64, max_secs: f64) -> Result<Self, MonitorError> {
        let invalid = || MonitorError::InvalidDuration {
            value: secs,
            max: max_secs,
        };
        if !secs.is_finite() || secs <= 0.0 || secs > max_secs {
            return Err(invalid());
        }
        let duration = Duration::try_from_secs_f64(secs).map_err(|_| invalid())?;
        Ok(Self { secs, duration })
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.secs
    }

    pub fn as_duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for SessionDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_positive_within_max() {
        let d = SessionDuration::new(2.5, 300.0).unwrap();
        assert_eq!(d.as_secs_f64(), 2.5);
        assert_eq!(d.as_duration(), Duration::from_millis(2500));
        assert!(SessionDuration::new(300.0, 300.0).is_ok());
    }

    #[test]
    fn test_rejects_invalid_values() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY, 300.5] {
            assert!(
                matches!(
                    SessionDuration::new(bad, 300.0),
                    Err(MonitorError::InvalidDuration { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_values_beyond_std_duration() {
        assert!(matches!(
            SessionDuration::new(1e25, 1e30),
            Err(MonitorError::InvalidDuration { .. })
        ));
        let long = SessionDuration::new(86_400.0, 1e30).unwrap();
        assert_eq!(long.as_duration(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_serializes_as_seconds() {
        let d = SessionDuration::new(2.5, 300.0).unwrap();
        assert_eq!(serde_json::to_string(&d).unwrap(), "2.5");
        assert_eq!(d.to_string(), "2.5");
    }
}
