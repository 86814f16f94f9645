//! # Local Session Store
//!
//! The three session flags kept on the device between runs:
//! `{driver_id, driver_email, is_logged_in}`.
//!
//! There is no server-side token. A session is only a hint for
//! [`AuthController::restore_session`](super::AuthController::restore_session),
//! which re-checks the driver against the live store.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AuthController ──► Arc<dyn SessionStore>                               │
//! │                         │                                               │
//! │          ┌──────────────┴──────────────┐                                │
//! │          ▼                             ▼                                │
//! │  MemorySessionStore            FileSessionStore                         │
//! │  (tests)                       (session.json, CLI)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// Persisted session flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The driver's human-readable `driver_id`.
    pub driver_id: String,
    pub driver_email: String,
    pub is_logged_in: bool,
}

impl Session {
    pub fn logged_in(driver_id: impl Into<String>, driver_email: impl Into<String>) -> Self {
        Session {
            driver_id: driver_id.into(),
            driver_email: driver_email.into(),
            is_logged_in: true,
        }
    }
}

/// Storage for the session flags.
///
/// Calls are synchronous: clearing on logout finishes before `logout`
/// returns.
pub trait SessionStore: Send + Sync {
    /// The saved session, if one is logged in.
    fn load(&self) -> AppResult<Option<Session>>;

    fn save(&self, session: &Session) -> AppResult<()>;

    fn clear(&self) -> AppResult<()>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Process-local store. Lost on exit.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `session` already saved.
    pub fn with_session(session: Session) -> Self {
        MemorySessionStore {
            session: Mutex::new(Some(session)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> AppResult<Option<Session>> {
        Ok(self.slot().clone().filter(|s| s.is_logged_in))
    }

    fn save(&self, session: &Session) -> AppResult<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.slot() = None;
        Ok(())
    }
}

// =============================================================================
// File Store
// =============================================================================

/// JSON file store used by the CLI so a session survives between
/// invocations.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStore { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> AppResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::internal(format!("Cannot read session: {}", e)))?;

        match serde_json::from_str::<Session>(&contents) {
            Ok(session) if session.is_logged_in => Ok(Some(session)),
            Ok(_) => Ok(None),
            Err(e) => {
                // A corrupt file is treated as logged out
                warn!(path = ?self.path, error = %e, "Ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &Session) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::internal(format!("Cannot create session dir: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(session)
            .map_err(|e| AppError::internal(format!("Cannot encode session: {}", e)))?;
        std::fs::write(&self.path, contents)
            .map_err(|e| AppError::internal(format!("Cannot write session: {}", e)))?;

        debug!(path = ?self.path, driver_id = %session.driver_id, "Session saved");
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::internal(format!("Cannot remove session: {}", e))),
        }
    }
}
