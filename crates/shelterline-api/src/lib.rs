//! HTTP error envelope and shared wire types for the Shelterline API.
//!
//! Every error response is `{"detail": <string>}` with the status code
//! carrying the error kind: 400 validation, 404 not found, 409 conflict,
//! 410 expired, 503 no capacity / unavailable, 500 internal.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use time::OffsetDateTime;

use shelterline_core::{now_utc, Reservation};
use shelterline_engine::EngineError;

/// API-level errors with their HTTP mapping.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Gone(String),
    #[error("No beds available at this time")]
    NoCapacity,
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Gone(_) => StatusCode::GONE,
            ApiError::NoCapacity | ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(message) => ApiError::BadRequest(message),
            EngineError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            EngineError::Conflict(message) => ApiError::Conflict(message),
            EngineError::NoCapacity => ApiError::NoCapacity,
            EngineError::Expired(code) => {
                ApiError::Gone(format!("Reservation {code} has expired"))
            }
            EngineError::BedMismatch { .. } => ApiError::Conflict(err.to_string()),
            EngineError::DuplicateCaller => ApiError::Conflict(err.to_string()),
            EngineError::WeekendDisallowed | EngineError::InvalidTime(_) => {
                ApiError::BadRequest(err.to_string())
            }
            EngineError::SlotTaken => ApiError::Conflict(err.to_string()),
            EngineError::Internal(message) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// A reservation as returned to staff clients, with remaining hold time
/// computed at read time.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub time_remaining_minutes: i64,
}

impl ReservationView {
    pub fn at(reservation: Reservation, now: OffsetDateTime) -> Self {
        let time_remaining_minutes = if reservation.is_terminal() {
            0
        } else {
            reservation.remaining_minutes(now)
        };
        Self {
            reservation,
            time_remaining_minutes,
        }
    }
}

impl From<Reservation> for ReservationView {
    fn from(reservation: Reservation) -> Self {
        Self::at(reservation, now_utc())
    }
}
