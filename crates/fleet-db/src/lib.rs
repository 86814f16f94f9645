//! # fleet-db: Document Store Layer for the Fleet Driver App
//!
//! This crate provides the document collections the driver app works on,
//! stored in SQLite with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fleet Driver Data Flow                           │
//! │                                                                         │
//! │  TripController / AuthController                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fleet-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ TripRepo      │    │ 001_docs.sql │  │   │
//! │  │   │ SqlitePool    │◄───│ DriverRepo    │    │              │  │   │
//! │  │   │ DocumentStore │    │ EarningsRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   SQLite: documents(collection, id, data JSON, timestamps)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`store`] - JSON document CRUD and queries
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Trip, driver and earnings repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fleet_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("fleet.db")).await?;
//! let terminal = db.trips().resolve_terminal_by_qr("terminal_id:T1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{Direction, DocumentStore, FieldValue, Query};

pub use repository::driver::DriverRepository;
pub use repository::earnings::EarningsRepository;
pub use repository::trip::TripRepository;
