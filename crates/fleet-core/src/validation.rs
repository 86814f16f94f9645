//! # Validation Module
//!
//! Input validation for the driver workflows.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Controller input (THIS MODULE)                               │
//! │  ├── Passenger counts, credentials, terminal selection                 │
//! │  └── Rejected before any store call                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Store boundary (fleet-db)                                    │
//! │  └── Typed decoding of every document read                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── json_valid() check on stored bodies                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use fleet_core::validation::{validate_credentials, validate_passenger_count};
//!
//! assert!(validate_passenger_count(4).is_ok());
//! assert!(validate_passenger_count(61).is_err());
//! assert!(validate_credentials("D1", "").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::Terminal;
use crate::MAX_PASSENGERS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a login identifier (email or driver id).
pub const MAX_IDENTIFIER_LEN: usize = 254;

/// Validates a passenger count.
///
/// ## Rules
/// - 0 is allowed (an empty repositioning run still earns the completion bonus)
/// - At most [`MAX_PASSENGERS`]
pub fn validate_passenger_count(count: u32) -> ValidationResult<()> {
    if count > MAX_PASSENGERS {
        return Err(ValidationError::OutOfRange {
            field: "passengers".to_string(),
            min: 0,
            max: i64::from(MAX_PASSENGERS),
        });
    }
    Ok(())
}

/// Validates login input.
pub fn validate_credentials(identifier: &str, password: &str) -> ValidationResult<()> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(ValidationError::Required {
            field: "email or driver id".to_string(),
        });
    }
    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::TooLong {
            field: "email or driver id".to_string(),
            max: MAX_IDENTIFIER_LEN,
        });
    }
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    Ok(())
}

/// Validates a new password.
pub fn validate_new_password(password: &str) -> ValidationResult<()> {
    if password.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "new password".to_string(),
        });
    }
    Ok(())
}

/// Validates that a terminal can be used for a new trip.
pub fn validate_active_terminal(terminal: &Terminal) -> ValidationResult<()> {
    if !terminal.is_active {
        return Err(ValidationError::InvalidFormat {
            field: "terminal".to_string(),
            reason: format!("{} is not active", terminal.name),
        });
    }
    Ok(())
}

/// Validates the start/destination pair of a new trip.
pub fn validate_trip_route(start: &Terminal, destination: &Terminal) -> ValidationResult<()> {
    validate_active_terminal(start)?;
    validate_active_terminal(destination)?;
    if start.id == destination.id {
        return Err(ValidationError::MustDiffer {
            field: "destination terminal".to_string(),
            other: "start terminal".to_string(),
        });
    }
    Ok(())
}
