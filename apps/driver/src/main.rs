//! # Fleet Driver Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fleet Driver                                     │
//! │                                                                         │
//! │  main.rs ────► parses arguments (clap)                                  │
//! │                                                                         │
//! │  lib.rs ─────► logging, config, database, dispatch                      │
//! │                                                                         │
//! │  commands/ ──► login, scan-start, start, scan-destination, earnings     │
//! │                                                                         │
//! │  state/ ─────► AuthController, TripController, AppConfig, Session       │
//! │                         │                                               │
//! │                         ▼                                               │
//! │              SQLite document store (fleet.db)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use fleet_driver::commands::Cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The actual setup is in lib.rs for better testability
    match fleet_driver::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::FAILURE
        }
    }
}
