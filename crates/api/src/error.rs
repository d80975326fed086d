//! API errors and the JSON response envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use monitor::MonitorError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Envelope status field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{status, data?, message?}` wrapper around every JSON response
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl Envelope<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::InvalidDuration { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(Envelope::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(Envelope::success(3).with_message("done")).unwrap();
        assert_eq!(ok, serde_json::json!({"status": "success", "data": 3, "message": "done"}));

        let err = serde_json::to_value(Envelope::error("nope")).unwrap();
        assert_eq!(err, serde_json::json!({"status": "error", "message": "nope"}));
    }

    #[test]
    fn test_monitor_errors_map_to_status_codes() {
        let invalid: ApiError = MonitorError::InvalidDuration {
            value: -1.0,
            max: 300.0,
        }
        .into();
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);

        let aborted: ApiError = MonitorError::CaptureAborted {
            errors: 30,
            last: "timeout".into(),
        }
        .into();
        assert_eq!(aborted.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::NotFound("missing".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
