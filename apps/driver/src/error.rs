//! # App Error Type
//!
//! Unified error type for controllers and CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Driver App                         │
//! │                                                                         │
//! │  Repository call                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError::NotFound ────────────┐                                        │
//! │  DbError::QueryFailed ─────────┤                                        │
//! │  DbError::Deserialization ─────┼──► AppError { code, message }          │
//! │  CoreError::DestinationMismatch┤          │                             │
//! │  ValidationError ──────────────┘          ▼                             │
//! │                                 TripUiState.error_message               │
//! │                                 (user re-triggers the action)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No error is fatal: controllers store the message and leave their prior
//! state untouched.

use fleet_core::{CoreError, ValidationError};
use fleet_db::DbError;
use serde::Serialize;

/// Error returned from controllers and commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Terminal not found: terminal_id:T9"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("[{code:?}] {message}")]
pub struct AppError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Terminal, trip or driver lookup miss
    NotFound,

    /// Database or network failure
    Transport,

    /// Mismatched destination scan, missing or out-of-range input
    Validation,

    /// Bad credentials, inactive account, no session
    Auth,

    /// A stored document does not match its expected shape
    Deserialization,

    /// Anything else
    Internal,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Validation, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Auth, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }

    /// The "must be logged in" error.
    pub fn not_logged_in() -> Self {
        AppError::auth("Not logged in")
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Converts database errors to app errors.
impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                AppError::new(ErrorCode::Transport, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                AppError::new(ErrorCode::Transport, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                AppError::new(ErrorCode::Transport, "Database operation failed")
            }
            DbError::PoolExhausted => {
                AppError::new(ErrorCode::Transport, "Database pool exhausted")
            }
            err @ DbError::Deserialization { .. } => {
                tracing::error!("{}", err);
                AppError::new(ErrorCode::Deserialization, err.to_string())
            }
            DbError::Serialization(e) => {
                tracing::error!("Document serialization failed: {}", e);
                AppError::internal("Could not encode document")
            }
            DbError::Domain(e) => AppError::from(e),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                AppError::new(ErrorCode::Transport, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to app errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredentials => AppError::auth(err.to_string()),
            CoreError::Validation(e) => AppError::from(e),
            CoreError::DestinationMismatch { .. } => AppError::validation(err.to_string()),
            CoreError::MissingStartTime { .. } => AppError::validation(err.to_string()),
            CoreError::InvalidTripStatus { .. } => AppError::validation(err.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}
