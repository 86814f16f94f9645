//! # Error Types
//!
//! Domain-specific error types for fleet-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fleet-core errors (this file)                                         │
//! │  ├── CoreError        - Domain rule failures                           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fleet-db errors (separate crate)                                      │
//! │  └── DbError          - Store / transport / decoding failures          │
//! │                                                                         │
//! │  driver app errors                                                     │
//! │  └── AppError         - What the UI sees (code + message)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → AppError → UI            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A trip has no `start_time`, so peak/weekend classification is
    /// impossible.
    ///
    /// ## When This Occurs
    /// - A trip document written by another client without `start_time`
    /// - A hand-built `Trip` in a test that forgot the timestamp
    #[error("Trip {trip_id} has no start time")]
    MissingStartTime { trip_id: String },

    /// The scanned destination terminal is not the one recorded at trip start.
    ///
    /// ## User Workflow
    /// ```text
    /// Trip started with destination T2
    ///      │
    ///      ▼
    /// Driver scans terminal T3
    ///      │
    ///      ▼
    /// DestinationMismatch { expected: "T2", scanned: "T3" }
    ///      │
    ///      ▼
    /// Trip stays in progress, UI asks for the right terminal
    /// ```
    #[error("This is not your assigned destination. Expected: {expected}, Scanned: {scanned}")]
    DestinationMismatch { expected: String, scanned: String },

    /// The operation needs a trip in a different status.
    #[error("Trip {trip_id} is {status}, cannot perform operation")]
    InvalidTripStatus { trip_id: String, status: String },

    /// The stored password digest does not match.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value present but unusable (e.g., inactive terminal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two values that must differ are equal.
    #[error("{field} must differ from {other}")]
    MustDiffer { field: String, other: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::DestinationMismatch {
            expected: "T2".to_string(),
            scanned: "T3".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "This is not your assigned destination. Expected: T2, Scanned: T3"
        );

        let err = CoreError::MissingStartTime {
            trip_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Trip abc has no start time");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "qr_code".to_string(),
        };
        assert_eq!(err.to_string(), "qr_code is required");

        let err = ValidationError::OutOfRange {
            field: "passengers".to_string(),
            min: 0,
            max: 60,
        };
        assert_eq!(err.to_string(), "passengers must be between 0 and 60");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "password".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
