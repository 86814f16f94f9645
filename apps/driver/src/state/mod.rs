//! # State Module
//!
//! Process-local state owned by the driver app.
//!
//! Each piece has one owner and is passed in explicitly; nothing here is a
//! global.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐    │
//! │  │  AuthController  │ │  TripController  │ │  AppConfig           │    │
//! │  │                  │ │                  │ │                      │    │
//! │  │  watch<AuthState>│ │ watch<TripUi-    │ │  db / session path   │    │
//! │  │  SessionStore    │ │       State>     │ │  utc offset, cdn     │    │
//! │  └────────┬─────────┘ └────────┬─────────┘ └──────────────────────┘    │
//! │           │  Driver (on login) │                                        │
//! │           └───────────────────►┘                                        │
//! │                                                                         │
//! │  OWNERSHIP:                                                            │
//! │  • AuthController: one per process                                     │
//! │  • TripController: one per logged-in driver, dropped on logout         │
//! │  • AppConfig: read-only after load                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod auth;
mod config;
mod session;
mod trip;

pub use auth::{AuthController, AuthState};
pub use config::AppConfig;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use trip::{TripController, TripPhase, TripUiState};
