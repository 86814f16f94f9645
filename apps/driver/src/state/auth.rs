//! # Auth Controller
//!
//! Session lifecycle against the `drivers` collection.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────────────┐  login()   ┌────────────────┐  match  ┌────────┐ │
//! │   │ Unauthenticated │──────────►│ Authenticating │────────►│ Authed │ │
//! │   └─────────────────┘           └────────────────┘         └────────┘ │
//! │           ▲                            │ miss / error           │      │
//! │           └────────────────────────────┘                        │      │
//! │           ▲                                                     │      │
//! │           └──────────────── logout() / restore fails ───────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Auth is a local flag plus a live lookup. There is no server-side token to
//! revoke, so `logout` only clears the local session.

use fleet_core::credentials::{hash_password, verify_password};
use fleet_core::validation::{validate_credentials, validate_new_password};
use fleet_core::{CoreError, Driver};
use fleet_db::DriverRepository;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::session::{Session, SessionStore};
use crate::error::{AppError, AppResult};

/// Observable authentication state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "driver", rename_all = "snake_case")]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(Driver),
}

impl AuthState {
    pub fn driver(&self) -> Option<&Driver> {
        match self {
            AuthState::Authenticated(driver) => Some(driver),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// Owns the auth state and the session store it persists to.
pub struct AuthController {
    drivers: DriverRepository,
    session: Arc<dyn SessionStore>,
    state: watch::Sender<AuthState>,
}

impl AuthController {
    pub fn new(drivers: DriverRepository, session: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        AuthController {
            drivers,
            session,
            state,
        }
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn current_driver(&self) -> Option<Driver> {
        self.state.borrow().driver().cloned()
    }

    fn publish(&self, state: AuthState) {
        self.state.send_replace(state);
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Logs in with an email or driver id.
    ///
    /// Identifiers containing `@` are matched against `email`, anything else
    /// against `driver_id`. Only active drivers can log in.
    ///
    /// ## Errors
    /// - `Validation` - empty identifier or password
    /// - `Auth` - unknown, inactive, or wrong password
    /// - `Transport` - the store failed
    pub async fn login(&self, identifier: &str, password: &str) -> AppResult<Driver> {
        validate_credentials(identifier, password)?;
        let identifier = identifier.trim();

        self.publish(AuthState::Authenticating);
        debug!(identifier = %identifier, "Logging in");

        let lookup = if identifier.contains('@') {
            self.drivers.find_active_by_email(identifier).await
        } else {
            self.drivers.find_active_by_driver_id(identifier).await
        };

        let driver = match lookup {
            Ok(Some(driver)) if verify_password(password, &driver.password_hash) => driver,
            Ok(_) => {
                self.publish(AuthState::Unauthenticated);
                warn!(identifier = %identifier, "Login rejected");
                return Err(CoreError::InvalidCredentials.into());
            }
            Err(e) => {
                self.publish(AuthState::Unauthenticated);
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .session
            .save(&Session::logged_in(&driver.driver_id, &driver.email))
        {
            self.publish(AuthState::Unauthenticated);
            return Err(e);
        }

        info!(driver_id = %driver.driver_id, "Driver logged in");
        self.publish(AuthState::Authenticated(driver.clone()));
        Ok(driver)
    }

    /// Clears the local session.
    pub fn logout(&self) -> AppResult<()> {
        let driver_id = self.current_driver().map(|d| d.driver_id);
        self.session.clear()?;
        self.publish(AuthState::Unauthenticated);
        info!(driver_id = ?driver_id, "Driver logged out");
        Ok(())
    }

    /// Re-validates the saved session against the live store.
    ///
    /// ## Outcomes
    /// - No saved session: `Unauthenticated`
    /// - Driver found and active: `Authenticated`
    /// - Driver missing or inactive: session cleared, `Unauthenticated`
    /// - Store unreachable: `Unauthenticated`, session kept for the next try
    pub async fn restore_session(&self) -> AuthState {
        let session = match self.session.load() {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.publish(AuthState::Unauthenticated);
                return AuthState::Unauthenticated;
            }
            Err(e) => {
                warn!(error = %e, "Could not read saved session");
                self.publish(AuthState::Unauthenticated);
                return AuthState::Unauthenticated;
            }
        };

        self.publish(AuthState::Authenticating);

        let state = match self.drivers.find_active_by_driver_id(&session.driver_id).await {
            Ok(Some(driver)) => {
                info!(driver_id = %driver.driver_id, "Session restored");
                AuthState::Authenticated(driver)
            }
            Ok(None) => {
                info!(driver_id = %session.driver_id, "Saved driver missing or inactive");
                if let Err(e) = self.session.clear() {
                    warn!(error = %e, "Could not clear session");
                }
                AuthState::Unauthenticated
            }
            Err(e) => {
                warn!(driver_id = %session.driver_id, error = %e, "Session restore failed");
                AuthState::Unauthenticated
            }
        };

        self.publish(state.clone());
        state
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Saves profile changes for the logged-in driver.
    ///
    /// The password digest is never taken from `driver`; use
    /// [`change_password`](Self::change_password).
    pub async fn update_profile(&self, driver: Driver) -> AppResult<Driver> {
        let current = self.current_driver().ok_or_else(AppError::not_logged_in)?;
        if driver.id != current.id {
            return Err(AppError::auth("Cannot edit another driver's profile"));
        }

        let mut updated = driver;
        updated.password_hash = current.password_hash.clone();
        self.drivers.save(&updated).await?;

        self.refresh(&updated)?;
        info!(driver_id = %updated.driver_id, "Profile updated");
        Ok(updated)
    }

    /// Replaces the password after checking the current one.
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> AppResult<()> {
        let current = self.current_driver().ok_or_else(AppError::not_logged_in)?;
        validate_new_password(new_password)?;

        // Check against the stored digest, not the cached one
        let mut driver = self
            .drivers
            .driver_by_id(&current.id)
            .await?
            .ok_or_else(|| AppError::not_found("Driver", &current.driver_id))?;

        if !verify_password(current_password, &driver.password_hash) {
            warn!(driver_id = %driver.driver_id, "Password change rejected");
            return Err(CoreError::InvalidCredentials.into());
        }

        driver.password_hash = hash_password(new_password);
        self.drivers.save(&driver).await?;

        self.refresh(&driver)?;
        info!(driver_id = %driver.driver_id, "Password changed");
        Ok(())
    }

    /// Re-publishes the driver and rewrites the session flags.
    fn refresh(&self, driver: &Driver) -> AppResult<()> {
        if !driver.is_active {
            return self.logout();
        }
        self.session
            .save(&Session::logged_in(&driver.driver_id, &driver.email))?;
        self.publish(AuthState::Authenticated(driver.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::session::MemorySessionStore;
    use fleet_db::{Database, DbConfig};

    struct Fixture {
        db: Database,
        session: Arc<MemorySessionStore>,
        auth: AuthController,
    }

    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = Arc::new(MemorySessionStore::new());
        let auth = AuthController::new(db.drivers(), session.clone());
        Fixture { db, session, auth }
    }

    async fn insert_driver(db: &Database, driver_id: &str, email: &str, active: bool) -> String {
        db.drivers()
            .insert(&Driver {
                driver_id: driver_id.to_string(),
                name: format!("Driver {}", driver_id),
                email: email.to_string(),
                password_hash: hash_password("secret"),
                is_active: active,
                ..Driver::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_login_by_email() {
        let f = fixture().await;
        insert_driver(&f.db, "D1", "d1@fleet.test", true).await;
        let mut rx = f.auth.subscribe();

        let driver = f.auth.login("d1@fleet.test", "secret").await.unwrap();
        assert_eq!(driver.driver_id, "D1");
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());

        let saved = f.session.load().unwrap().unwrap();
        assert_eq!(saved, Session::logged_in("D1", "d1@fleet.test"));
    }

    #[tokio::test]
    async fn test_login_by_driver_id() {
        let f = fixture().await;
        insert_driver(&f.db, "D1", "d1@fleet.test", true).await;

        let driver = f.auth.login("  D1 ", "secret").await.unwrap();
        assert_eq!(driver.email, "d1@fleet.test");
        assert!(f.auth.state().is_authenticated());
    }

    #[tokio::test]
    async fn test_login_rejections() {
        let f = fixture().await;
        insert_driver(&f.db, "D1", "d1@fleet.test", true).await;
        insert_driver(&f.db, "D2", "d2@fleet.test", false).await;

        let wrong = f.auth.login("d1@fleet.test", "nope").await.unwrap_err();
        assert_eq!(wrong.code, ErrorCode::Auth);

        let inactive = f.auth.login("D2", "secret").await.unwrap_err();
        assert_eq!(inactive.code, ErrorCode::Auth);

        let unknown = f.auth.login("ghost@fleet.test", "secret").await.unwrap_err();
        assert_eq!(unknown.code, ErrorCode::Auth);

        let empty = f.auth.login("", "secret").await.unwrap_err();
        assert_eq!(empty.code, ErrorCode::Validation);

        assert_eq!(f.auth.state(), AuthState::Unauthenticated);
        assert_eq!(f.session.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let f = fixture().await;
        insert_driver(&f.db, "D1", "d1@fleet.test", true).await;
        f.auth.login("D1", "secret").await.unwrap();

        f.auth.logout().unwrap();
        assert_eq!(f.auth.state(), AuthState::Unauthenticated);
        assert_eq!(f.session.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_active_driver() {
        let f = fixture().await;
        insert_driver(&f.db, "D1", "d1@fleet.test", true).await;
        f.session.save(&Session::logged_in("D1", "d1@fleet.test")).unwrap();

        let state = f.auth.restore_session().await;
        assert_eq!(state.driver().map(|d| d.driver_id.as_str()), Some("D1"));
        assert_eq!(f.auth.state(), state);
    }

    #[tokio::test]
    async fn test_restore_inactive_driver_clears_session() {
        let f = fixture().await;
        let id = insert_driver(&f.db, "D1", "d1@fleet.test", true).await;
        f.auth.login("D1", "secret").await.unwrap();

        // Deactivated from the dashboard
        let mut driver = f.db.drivers().driver_by_id(&id).await.unwrap().unwrap();
        driver.is_active = false;
        f.db.drivers().save(&driver).await.unwrap();

        assert_eq!(f.auth.restore_session().await, AuthState::Unauthenticated);
        assert_eq!(f.session.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_missing_driver_clears_session() {
        let f = fixture().await;
        f.session.save(&Session::logged_in("GONE", "gone@fleet.test")).unwrap();

        assert_eq!(f.auth.restore_session().await, AuthState::Unauthenticated);
        assert_eq!(f.session.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_transport_error_keeps_session() {
        let f = fixture().await;
        f.session.save(&Session::logged_in("D1", "d1@fleet.test")).unwrap();
        f.db.close().await;

        assert_eq!(f.auth.restore_session().await, AuthState::Unauthenticated);
        assert!(f.session.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_restore_without_session() {
        let f = fixture().await;
        assert_eq!(f.auth.restore_session().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_update_profile_keeps_password() {
        let f = fixture().await;
        insert_driver(&f.db, "D1", "d1@fleet.test", true).await;
        let mut driver = f.auth.login("D1", "secret").await.unwrap();

        driver.email = "new@fleet.test".to_string();
        driver.password_hash = String::new();
        let updated = f.auth.update_profile(driver).await.unwrap();

        assert_eq!(updated.email, "new@fleet.test");
        assert_eq!(f.session.load().unwrap().unwrap().driver_email, "new@fleet.test");

        f.auth.logout().unwrap();
        assert!(f.auth.login("new@fleet.test", "secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_requires_login() {
        let f = fixture().await;
        let err = f.auth.update_profile(Driver::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Auth);
    }

    #[tokio::test]
    async fn test_change_password() {
        let f = fixture().await;
        insert_driver(&f.db, "D1", "d1@fleet.test", true).await;
        f.auth.login("D1", "secret").await.unwrap();

        let err = f.auth.change_password("wrong", "fresh").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Auth);

        f.auth.change_password("secret", "fresh").await.unwrap();
        f.auth.logout().unwrap();

        assert!(f.auth.login("D1", "secret").await.is_err());
        assert!(f.auth.login("D1", "fresh").await.is_ok());
    }
}
