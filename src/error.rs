use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::machine::GamePhase};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Operation is not legal in the session's current phase.
    #[error("invalid phase: operation not allowed while {phase:?}")]
    InvalidPhase {
        /// Phase the session was in.
        phase: GamePhase,
    },
    /// The player already buzzed for this question.
    #[error("player already buzzed for this question")]
    AlreadyBuzzed,
    /// The referenced player is not registered in the session.
    #[error("unknown player")]
    UnknownPlayer,
    /// The referenced question does not exist.
    #[error("question {index} not found")]
    QuestionNotFound {
        /// Index the caller asked for.
        index: usize,
    },
    /// Malformed input; nothing was applied.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Optimistic-concurrency check failed; the caller must refetch.
    #[error("version conflict: current version is {current}")]
    VersionConflict {
        /// Version currently stored.
        current: u64,
    },
    /// The storage lock wait elapsed; the caller may retry with backoff.
    #[error("storage busy, retry later")]
    Busy,
    /// Shuffle verification failed; the whole operation was aborted.
    #[error("integrity check failed: {0}")]
    CriticalIntegrity(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Busy { .. } => ServiceError::Busy,
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        ServiceError::Validation(format!("validation failed: {err}"))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Conflict caused by a stale optimistic-concurrency token.
    #[error("version conflict: current version is {current}")]
    VersionConflict {
        /// Version the caller should retry against.
        current: u64,
    },
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidPhase { .. } | ServiceError::AlreadyBuzzed => {
                AppError::Conflict(err.to_string())
            }
            ServiceError::VersionConflict { current } => AppError::VersionConflict { current },
            ServiceError::UnknownPlayer => AppError::NotFound(err.to_string()),
            ServiceError::QuestionNotFound { .. } => AppError::NotFound(err.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Validation(message) => AppError::BadRequest(message),
            ServiceError::Busy => AppError::ServiceUnavailable(err.to_string()),
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::CriticalIntegrity(message) => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_version: Option<u64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::VersionConflict { .. } => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let current_version = match &self {
            AppError::VersionConflict { current } => Some(*current),
            _ => None,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
            current_version,
        });

        (status, payload).into_response()
    }
}
