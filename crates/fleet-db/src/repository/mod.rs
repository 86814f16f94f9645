//! # Repository Module
//!
//! Typed access to the fleet collections, on top of [`crate::store`].
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Controller                                                            │
//! │       │  db.trips().resolve_terminal_by_qr("ABC123")                   │
//! │       ▼                                                                 │
//! │  TripRepository / DriverRepository / EarningsRepository               │
//! │       │  Query::new("terminals").eq("qr_code", ...)                    │
//! │       ▼                                                                 │
//! │  DocumentStore  ──►  SQLite `documents` table                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`TripRepository`](trip::TripRepository) - Terminals, QR resolution, trip lifecycle
//! - [`DriverRepository`](driver::DriverRepository) - Driver lookups and profile writes
//! - [`EarningsRepository`](earnings::EarningsRepository) - Rollups and summary

pub mod driver;
pub mod earnings;
pub mod trip;
