//! # Seed Data Generator
//!
//! Populates a database with sample terminals, a driver account, and the
//! commission settings document.
//!
//! ## Usage
//! ```bash
//! cargo run -p fleet-db --bin seed
//! cargo run -p fleet-db --bin seed -- --db ./data/fleet.db
//! ```
//!
//! ## Sample Login
//! - driver id `D001` / email `driver@fleet.test`
//! - password `driver123`

use chrono::Utc;
use fleet_core::credentials::hash_password;
use fleet_core::{collections, qr, CommissionSettings, Driver, Terminal};
use fleet_db::{Database, DbConfig, Query};
use std::env;

/// (terminal_id, name, latitude, longitude)
const TERMINALS: &[(&str, &str, f64, f64)] = &[
    ("T001", "Central Terminal", 14.5995, 120.9842),
    ("T002", "North Depot", 14.6760, 121.0437),
    ("T003", "Harbor Stop", 14.5826, 120.9787),
    ("T004", "Airport Loop", 14.5086, 121.0198),
    ("T005", "University Gate", 14.6537, 121.0685),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./fleet_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Fleet Driver Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fleet_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Fleet Driver Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let store = db.store();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing: Vec<Terminal> = store.query(&Query::new(collections::TERMINALS)).await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} terminals", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (n, (terminal_id, name, latitude, longitude)) in TERMINALS.iter().enumerate() {
        let terminal = Terminal {
            id: String::new(),
            terminal_id: terminal_id.to_string(),
            name: name.to_string(),
            qr_code: qr::payload_for(terminal_id),
            latitude: *latitude,
            longitude: *longitude,
            qr_code_url: format!(
                "https://res.cloudinary.com/demo/image/upload/v1234567890/qr_codes/terminal_{}.png",
                n + 1
            ),
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        };
        let id = store.add(collections::TERMINALS, &terminal).await?;
        println!("  + {} {:<18} ({})", terminal_id, name, id);
    }
    println!("✓ {} terminals", TERMINALS.len());

    let driver = Driver {
        driver_id: "D001".to_string(),
        name: "Sample Driver".to_string(),
        email: "driver@fleet.test".to_string(),
        contact: "+63 900 000 0000".to_string(),
        license_number: "N01-23-456789".to_string(),
        password_hash: hash_password("driver123"),
        is_active: true,
        salary_type: "commission".to_string(),
        base_salary: 0.0,
        commission_rate: 0.05,
        commission_per_passenger: 2.0,
        trip_completion_bonus: 5.0,
        ..Driver::default()
    };
    db.drivers().insert(&driver).await?;
    println!("✓ Driver D001 (driver@fleet.test / driver123)");

    let settings = CommissionSettings {
        updated_at: Some(now),
        ..CommissionSettings::default()
    };
    store
        .set(collections::COMMISSION_SETTINGS, "default", &settings)
        .await?;
    println!("✓ Commission settings");

    println!();
    println!("🎉 Seed complete!");
    Ok(())
}
