//! # Commands Module
//!
//! Command-line front end over the controllers.
//!
//! Each invocation is one user action: the session is restored, the trip
//! controller reloads whatever is in the store, the action runs, and the
//! resulting state is printed.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Organization                                 │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐        │
//! │  │   auth.rs       │  │   trip.rs       │  │  earnings.rs    │        │
//! │  │                 │  │                 │  │                 │        │
//! │  │ • login         │  │ • terminals     │  │ • earnings      │        │
//! │  │ • logout        │  │ • scan-start    │  │                 │        │
//! │  │ • whoami        │  │ • start         │  │                 │        │
//! │  │                 │  │ • scan-dest...  │  │                 │        │
//! │  │                 │  │ • passengers    │  │                 │        │
//! │  │                 │  │ • cancel        │  │                 │        │
//! │  │                 │  │ • history       │  │                 │        │
//! │  │                 │  │ • delete-trip   │  │                 │        │
//! │  │                 │  │ • qr-url        │  │                 │        │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod earnings;
pub mod trip;

use clap::{Parser, Subcommand};
use fleet_core::Driver;
use fleet_db::Database;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::state::{AppConfig, AuthController, FileSessionStore, TripController};

/// Fleet driver: scan terminals, run trips, check earnings.
#[derive(Debug, Parser)]
#[command(name = "fleet-driver", version, about)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overrides config and FLEET_DB_PATH
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with an email or driver id
    Login {
        identifier: String,
        #[arg(long, short)]
        password: String,
    },
    /// Clear the local session
    Logout,
    /// Show the logged-in driver
    Whoami,
    /// List terminals
    Terminals,
    /// Resolve a start terminal QR payload
    ScanStart { qr: String },
    /// Start a trip
    Start {
        /// QR payload scanned at the start terminal
        #[arg(long)]
        from: String,
        /// Destination terminal id (document id or terminal_id)
        #[arg(long)]
        destination: String,
        #[arg(long)]
        passengers: u32,
    },
    /// Scan the destination terminal and complete the trip
    ScanDestination { qr: String },
    /// Change the passenger count of the trip in progress
    Passengers { count: u32 },
    /// Cancel the trip in progress
    Cancel,
    /// Completed trips, most recent first
    History,
    /// Delete a trip by document id
    DeleteTrip { id: String },
    /// Earnings summary
    Earnings,
    /// QR image URL of a terminal
    QrUrl {
        /// Document id or terminal_id
        terminal: String,
        #[arg(long, default_value_t = fleet_core::media::DEFAULT_IMAGE_SIZE)]
        size: u32,
    },
}

/// Everything a command needs.
pub struct AppContext {
    pub config: AppConfig,
    pub db: Database,
    pub auth: AuthController,
}

impl AppContext {
    pub fn new(config: AppConfig, db: Database) -> Self {
        let session = Arc::new(FileSessionStore::new(&config.session_path));
        let auth = AuthController::new(db.drivers(), session);
        AppContext { config, db, auth }
    }

    /// The logged-in driver, re-checked against the store.
    pub async fn require_driver(&self) -> AppResult<Driver> {
        self.auth
            .restore_session()
            .await
            .driver()
            .cloned()
            .ok_or_else(AppError::not_logged_in)
    }

    /// A loaded trip controller for the logged-in driver.
    pub async fn trip_controller(&self) -> AppResult<TripController> {
        let driver = self.require_driver().await?;
        let ctrl = TripController::new(
            self.db.trips(),
            self.db.earnings(self.config.calculator()),
            driver,
        )
        .with_history_limit(self.config.history_limit);
        ctrl.load().await?;
        Ok(ctrl)
    }
}

/// Dispatches one command.
pub async fn dispatch(ctx: &AppContext, command: Command) -> AppResult<()> {
    match command {
        Command::Login {
            identifier,
            password,
        } => auth::login(ctx, &identifier, &password).await,
        Command::Logout => auth::logout(ctx),
        Command::Whoami => auth::whoami(ctx).await,
        Command::Terminals => trip::terminals(ctx).await,
        Command::ScanStart { qr } => trip::scan_start(ctx, &qr).await,
        Command::Start {
            from,
            destination,
            passengers,
        } => trip::start(ctx, &from, &destination, passengers).await,
        Command::ScanDestination { qr } => trip::scan_destination(ctx, &qr).await,
        Command::Passengers { count } => trip::passengers(ctx, count).await,
        Command::Cancel => trip::cancel(ctx).await,
        Command::History => trip::history(ctx).await,
        Command::DeleteTrip { id } => trip::delete_trip(ctx, &id).await,
        Command::Earnings => earnings::summary(ctx).await,
        Command::QrUrl { terminal, size } => trip::qr_url(ctx, &terminal, size).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use fleet_core::credentials::hash_password;
    use fleet_core::{collections, qr, Terminal};
    use fleet_db::DbConfig;

    #[test]
    fn test_parse_start() {
        let cli = Cli::try_parse_from([
            "fleet-driver",
            "start",
            "--from",
            "terminal_id:T001",
            "--destination",
            "T002",
            "--passengers",
            "4",
        ])
        .unwrap();

        match cli.command {
            Command::Start {
                from,
                destination,
                passengers,
            } => {
                assert_eq!(from, "terminal_id:T001");
                assert_eq!(destination, "T002");
                assert_eq!(passengers, 4);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_negative_passengers() {
        assert!(Cli::try_parse_from(["fleet-driver", "passengers", "-1"]).is_err());
    }

    async fn context(dir: &tempfile::TempDir) -> AppContext {
        let config = AppConfig {
            database_path: dir.path().join("fleet.db"),
            session_path: dir.path().join("session.json"),
            ..AppConfig::default()
        };
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for terminal_id in ["T001", "T002"] {
            let terminal = Terminal {
                id: String::new(),
                terminal_id: terminal_id.to_string(),
                name: format!("Terminal {}", terminal_id),
                qr_code: qr::payload_for(terminal_id),
                latitude: 0.0,
                longitude: 0.0,
                qr_code_url: String::new(),
                is_active: true,
                created_at: None,
                updated_at: None,
            };
            db.store().add(collections::TERMINALS, &terminal).await.unwrap();
        }
        db.drivers()
            .insert(&Driver {
                driver_id: "D001".to_string(),
                name: "Sample Driver".to_string(),
                email: "driver@fleet.test".to_string(),
                password_hash: hash_password("driver123"),
                trip_completion_bonus: 5.0,
                ..Driver::default()
            })
            .await
            .unwrap();

        AppContext::new(config, db)
    }

    #[tokio::test]
    async fn test_commands_need_login() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir).await;

        let err = dispatch(&ctx, Command::History).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Auth);
    }

    #[tokio::test]
    async fn test_trip_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir).await;

        dispatch(
            &ctx,
            Command::Login {
                identifier: "driver@fleet.test".into(),
                password: "driver123".into(),
            },
        )
        .await
        .unwrap();
        assert!(dir.path().join("session.json").exists());

        dispatch(
            &ctx,
            Command::Start {
                from: "terminal_id:T001".into(),
                destination: "T002".into(),
                passengers: 3,
            },
        )
        .await
        .unwrap();

        // Each command reloads the trip from the store
        dispatch(&ctx, Command::Passengers { count: 2 }).await.unwrap();
        dispatch(
            &ctx,
            Command::ScanDestination {
                qr: "terminal_id:T002".into(),
            },
        )
        .await
        .unwrap();

        let ctrl = ctx.trip_controller().await.unwrap();
        let state = ctrl.state();
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].passengers, 2);

        dispatch(&ctx, Command::Logout).await.unwrap();
        assert!(!dir.path().join("session.json").exists());
    }
}
