//! Monitoring Routes

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use monitor::{needs_followup, SessionDuration, SessionStatus, Verdict};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, Envelope};
use crate::AppState;

/// Window length as sent by clients: a JSON number or a numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    fn seconds(&self) -> Result<f64, ApiError> {
        match self {
            DurationValue::Seconds(secs) => Ok(*secs),
            DurationValue::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("Invalid duration: {:?}", text))),
        }
    }
}

/// Body of `POST /api/monitor/start`
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Seconds; the configured default when omitted
    pub duration: Option<DurationValue>,
}

impl StartRequest {
    /// Parse a request body; an empty body means all defaults
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
    }
}

#[derive(Debug, Serialize)]
pub struct StartData {
    pub session_id: Uuid,
    pub duration: SessionDuration,
}

#[derive(Debug, Serialize)]
pub struct ResultData {
    pub emotion: Verdict,
    pub needs_followup: bool,
}

/// Start (or restart) a monitoring window
pub async fn start(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Envelope<StartData>>, ApiError> {
    let request = StartRequest::parse(&body)?;
    let requested = request.duration.as_ref().map(DurationValue::seconds).transpose()?;
    let duration = state.monitor.duration(requested)?;

    if !state.capture_running() {
        return Err(ApiError::Internal("Capture loop is not running".to_string()));
    }

    let session_id = state.session.lock().await.start(duration);
    info!("Start request accepted: session {} for {}s", session_id, duration);

    Ok(Json(
        Envelope::success(StartData {
            session_id,
            duration,
        })
        .with_message(format!("Started monitoring for {} seconds", duration)),
    ))
}

/// Current verdict with the follow-up signal
pub async fn result(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Envelope<ResultData>>, ApiError> {
    let verdict = state.session.lock().await.verdict();
    let verdict = verdict.ok_or_else(|| ApiError::NotFound("No emotion data available".to_string()))?;

    Ok(Json(Envelope::success(ResultData {
        emotion: verdict,
        needs_followup: needs_followup(&verdict, &state.monitor.followup_thresholds),
    })))
}

/// Session snapshot
pub async fn status(State(state): State<Arc<AppState>>) -> Json<Envelope<SessionStatus>> {
    let status = state.session.lock().await.status();
    Json(Envelope::success(status))
}

/// Latest annotated preview frame as JPEG
pub async fn frame(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let preview = state.preview.clone();
    let quality = state.monitor.preview_jpeg_quality;

    let jpeg = tokio::task::spawn_blocking(move || preview.latest_jpeg(quality))
        .await
        .map_err(|e| ApiError::Internal(format!("Preview task failed: {}", e)))??;

    match jpeg {
        Some(bytes) => Ok((
            [
                (header::CONTENT_TYPE, "image/jpeg"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response()),
        None => Err(ApiError::NotFound("No preview frame available".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested(body: &str) -> Result<Option<f64>, ApiError> {
        let request = StartRequest::parse(body.as_bytes())?;
        request.duration.as_ref().map(DurationValue::seconds).transpose()
    }

    #[test]
    fn test_empty_body_uses_defaults() {
        assert_eq!(requested("").unwrap(), None);
        assert_eq!(requested("  \n").unwrap(), None);
        assert_eq!(requested("{}").unwrap(), None);
    }

    #[test]
    fn test_duration_number_or_numeric_string() {
        assert_eq!(requested(r#"{"duration": 3}"#).unwrap(), Some(3.0));
        assert_eq!(requested(r#"{"duration": 2.5}"#).unwrap(), Some(2.5));
        assert_eq!(requested(r#"{"duration": " 7.5 "}"#).unwrap(), Some(7.5));
    }

    #[test]
    fn test_malformed_bodies_are_bad_requests() {
        for body in ["{", "42", r#"{"duration": "soon"}"#, r#"{"duration": true}"#] {
            assert!(
                matches!(requested(body), Err(ApiError::BadRequest(_))),
                "body {:?} should be rejected",
                body
            );
        }
    }
}
