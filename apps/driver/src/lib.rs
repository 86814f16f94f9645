//! # Fleet Driver Library
//!
//! The driver app host: controllers, session, configuration, and the
//! command-line front end.
//!
//! ## Module Organization
//! ```text
//! fleet_driver/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── auth.rs     ◄─── AuthController (login, restore, logout)
//! │   ├── trip.rs     ◄─── TripController (trip lifecycle, TripUiState)
//! │   ├── session.rs  ◄─── Local session flags (memory / JSON file)
//! │   └── config.rs   ◄─── AppConfig (env > TOML > defaults)
//! ├── commands/
//! │   ├── mod.rs      ◄─── CLI definition and dispatch
//! │   ├── auth.rs     ◄─── login / logout / whoami
//! │   ├── trip.rs     ◄─── scan, start, complete, history
//! │   └── earnings.rs ◄─── earnings summary
//! └── error.rs        ◄─── AppError with ErrorCode
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::{AppContext, Cli};
use error::{AppError, AppResult};
use fleet_db::{Database, DbConfig};
use state::AppConfig;

/// Runs one CLI invocation.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: INFO, can be overridden with RUST_LOG                    │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • FLEET_* env > config.toml > defaults; --db wins over all          │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  4. Build Controllers & Dispatch ─────────────────────────────────────► │
/// │     • AuthController over the session file                              │
/// │     • TripController per command, for the restored driver               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> AppResult<()> {
    init_tracing();

    let mut config = AppConfig::load(cli.config.clone())?;
    if let Some(db) = cli.db.clone() {
        config.database_path = db;
    }
    info!(db = ?config.database_path, "Starting fleet driver");

    ensure_parent_dir(&config.database_path)?;
    let db = Database::new(DbConfig::new(&config.database_path)).await?;

    let ctx = AppContext::new(config, db);
    let result = commands::dispatch(&ctx, cli.command).await;

    ctx.db.close().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=fleet_db=trace` - Trace the document store only
/// - Default: INFO level, logs to stderr
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    // A second init (tests, embedding) keeps the subscriber already set
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        debug!(error = %e, "Tracing subscriber already installed");
    }
}

fn ensure_parent_dir(path: &Path) -> AppResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|e| AppError::internal(format!("Cannot create {}: {}", dir.display(), e))),
        _ => Ok(()),
    }
}
