//! # fleet-core: Pure Domain Logic for the Fleet Driver App
//!
//! This crate holds the domain rules of the driver app as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Fleet Driver Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Driver UI (external: screens, camera, TTS)         │   │
//! │  │    Scan start ──► Pick destination ──► Scan destination        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              apps/driver (Auth + Trip controllers)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fleet-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ earnings  │  │    qr     │  │   media   │  │   │
//! │  │   │  Trip     │  │ commission│  │ payload   │  │ CDN URLs  │  │   │
//! │  │   │  Terminal │  │ peak/wkend│  │ lookups   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 fleet-db (Document Store Layer)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Document schema (Terminal, Trip, Driver, rollups, settings)
//! - [`earnings`] - Commission calculator
//! - [`qr`] - QR payload parsing and terminal lookup plan
//! - [`credentials`] - Password digests
//! - [`media`] - Image CDN URL templating
//! - [`timestamp`] - Fixed-width timestamp encoding for stored documents
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use fleet_core::{compute_trip_earnings, CommissionSettings, Driver, Trip};
//!
//! let mut driver = Driver::default();
//! driver.commission_rate = 0.05;
//! driver.commission_per_passenger = 2.0;
//! driver.trip_completion_bonus = 5.0;
//!
//! let mut trip = Trip::default();
//! trip.passengers = 4;
//! // Tuesday 08:00 UTC, inside the morning peak
//! trip.start_time = Some(Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap());
//!
//! let earnings = compute_trip_earnings(&trip, &driver, &CommissionSettings::default()).unwrap();
//! assert!((earnings.total_earnings - 19.8).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credentials;
pub mod earnings;
pub mod error;
pub mod media;
pub mod qr;
pub mod timestamp;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use earnings::{compute_trip_earnings, EarningsCalculator};
pub use error::{CoreError, CoreResult, ValidationError};
pub use qr::{QrPayload, TerminalLookup};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Collection names shared with the dashboard.
///
/// These are part of the wire contract and must not be renamed.
pub mod collections {
    pub const TERMINALS: &str = "terminals";
    pub const TRIPS: &str = "trips";
    pub const DRIVERS: &str = "drivers";
    pub const DRIVER_EARNINGS: &str = "driver_earnings";
    pub const DAILY_EARNINGS: &str = "daily_earnings";
    pub const COMMISSION_SETTINGS: &str = "commission_settings";
}

/// Maximum passengers accepted for a single trip.
///
/// The largest vehicle in the fleet is a 60-seat coach; anything above
/// this is a typing mistake.
pub const MAX_PASSENGERS: u32 = 60;

/// Default page size for the completed-trip history.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
