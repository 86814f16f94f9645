//! # Database Error Types
//!
//! Error types for document store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)      serde_json::Error    CoreError        │
//! │       │                               │                  │              │
//! │       ▼                               ▼                  ▼              │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppError (driver app) ← code + message for the UI                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Controller sets error_message, state otherwise untouched              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use fleet_core::{CoreError, ValidationError};
use thiserror::Error;

/// Document store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Document not found.
    ///
    /// ## When This Occurs
    /// - Partial update of a missing document
    /// - Completing / cancelling a trip id that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Pool closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A stored document does not match its typed schema.
    ///
    /// ## When This Occurs
    /// - Another client wrote `"passengers": "four"`
    /// - A trip with an unknown `status` value
    /// - A required field is missing
    #[error("Invalid document {collection}/{id}: {reason}")]
    Deserialization {
        collection: String,
        id: String,
        reason: String,
    },

    /// A value could not be encoded as a JSON document.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A domain rule rejected the operation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed/Io  → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Document".to_string(),
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),
            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
