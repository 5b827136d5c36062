//! Error taxonomy for the webhook surface and its HTTP mapping.
//!
//! Every variant renders as a JSON body with an explicit `status` field.
//! Request-content problems are 4xx; anything the controller could not
//! carry out is 5xx.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use fleetcfg_rollout::{RolloutError, RolloutRecord};

use crate::coordinator::Status;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed field, or an unparsable body.
    #[error("{0}")]
    ClientInput(String),

    /// Well-formed config that did not pass validation.
    #[error("Configuration validation failed")]
    ValidationRejected {
        config_version: String,
        reason: String,
    },

    /// The device did not accept the configuration.
    #[error("Failed to send config to device {device_id}")]
    DispatchFailed {
        device_id: String,
        rollout: Option<RolloutRecord>,
    },

    /// Work did not finish within the request timeout and was aborted.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// Pause or resume of a rollout that was never tracked.
    #[error("rollout not found: {0}")]
    RolloutNotFound(String),

    /// Controller fault, such as a panicked task.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ClientInput(_) | Self::ValidationRejected { .. } => StatusCode::BAD_REQUEST,
            Self::RolloutNotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::DispatchFailed { .. } | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RolloutError> for ApiError {
    fn from(e: RolloutError) -> Self {
        match e {
            RolloutError::InvalidId(_) => Self::ClientInput(e.to_string()),
            RolloutError::NotFound(id) => Self::RolloutNotFound(id),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let message = self.to_string();
        let body = match self {
            Self::ValidationRejected {
                config_version,
                reason,
            } => json!({
                "status": Status::Failure,
                "message": message,
                "configVersion": config_version,
                "reason": reason,
            }),
            Self::DispatchFailed { device_id, rollout } => {
                let mut body = json!({
                    "status": Status::Failure,
                    "message": message,
                    "deviceId": device_id,
                });
                if let Some(record) = rollout {
                    body["rollout"] = json!(record);
                }
                body
            }
            _ => json!({ "status": Status::Error, "message": message }),
        };
        (code, Json(body)).into_response()
    }
}
