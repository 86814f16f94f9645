//! # Domain Types
//!
//! The document schema shared with the fleet dashboard.
//!
//! ## Collections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Document Collections                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   terminals     │   │     trips       │   │    drivers      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  terminal_id    │   │  driver_id      │   │  driver_id      │       │
//! │  │  qr_code        │◄──│  start_terminal │   │  email          │       │
//! │  │  name           │◄──│  destination_.. │   │  password_hash  │       │
//! │  │  lat / lng      │   │  passengers     │   │  commission_*   │       │
//! │  └─────────────────┘   │  status         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │ driver_earnings │   │ daily_earnings  │   │ commission_settings │   │
//! │  │  (driver,y,m)   │   │  (driver,date)  │   │  singleton          │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every persisted entity has:
//! - `id`: document id, assigned by the store and never written into the body
//! - Business ID: (`terminal_id`, `trip_id`, `driver_id`) - human-readable
//!
//! Field names are the wire contract with the dashboard: they are
//! snake_case on purpose and must not be renamed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

fn default_true() -> bool {
    true
}

// =============================================================================
// Terminal
// =============================================================================

/// A fixed fleet stop identified by a scannable QR payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Terminal {
    /// Document id.
    #[serde(default)]
    pub id: String,

    /// Human-readable terminal id.
    pub terminal_id: String,

    pub name: String,

    /// Lookup key scanned by drivers.
    #[serde(default)]
    pub qr_code: String,

    #[serde(default)]
    pub latitude: f64,

    #[serde(default)]
    pub longitude: f64,

    /// Where the printable QR image lives (usually the image CDN).
    #[serde(default)]
    pub qr_code_url: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Trip Status
// =============================================================================

/// The status of a trip.
///
/// ## Lifecycle
/// ```text
///   start_trip()          complete_trip()
///  ─────────────► in_progress ─────────────► completed
///                     │
///                     │ cancel_trip()
///                     ▼
///                 cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    #[default]
    InProgress,
    Completed,
    Cancelled,
}

impl TripStatus {
    /// The stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TripStatus::InProgress => "in_progress",
            TripStatus::Completed => "completed",
            TripStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TripStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Trip
// =============================================================================

/// One journey by a driver from a start terminal to a destination terminal.
///
/// `start_terminal` and `destination_terminal` hold terminal document ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Trip {
    /// Document id.
    #[serde(default)]
    pub id: String,

    /// Human-readable trip number (`TRIP-YYYYMMDD-XXXXXX`).
    #[serde(default)]
    pub trip_id: String,

    /// The driver's human-readable `driver_id`.
    pub driver_id: String,

    pub start_terminal: String,

    pub destination_terminal: String,

    pub passengers: u32,

    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub start_time: Option<DateTime<Utc>>,

    /// Set when the trip is completed.
    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub arrival_time: Option<DateTime<Utc>>,

    pub status: TripStatus,

    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trip {
    /// Checks if the trip is still running.
    #[inline]
    pub fn is_in_progress(&self) -> bool {
        self.status == TripStatus::InProgress
    }
}

// =============================================================================
// Driver
// =============================================================================

/// A driver account with its compensation parameters.
///
/// ## Security Note
/// `password_hash` is a single unsalted SHA-256 digest because that is what
/// the dashboard writes. See [`crate::credentials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Driver {
    /// Document id.
    #[serde(default)]
    pub id: String,

    /// Human-readable driver id (used as the key in trips and rollups).
    pub driver_id: String,

    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub contact: String,

    #[serde(default)]
    pub license_number: String,

    #[serde(default)]
    pub password_hash: String,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Free-form compensation model written by the dashboard
    /// (e.g. `commission`, `salary`, `salary_plus_commission`).
    #[serde(default)]
    pub salary_type: String,

    /// Monthly base salary, recorded on the monthly rollup for reference.
    #[serde(default)]
    pub base_salary: f64,

    /// Amount per passenger counted as base commission.
    #[serde(default)]
    pub commission_rate: f64,

    /// Extra amount per passenger.
    #[serde(default)]
    pub commission_per_passenger: f64,

    /// Flat amount per completed trip.
    #[serde(default)]
    pub trip_completion_bonus: f64,

    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Driver {
    fn default() -> Self {
        Driver {
            id: String::new(),
            driver_id: String::new(),
            name: String::new(),
            email: String::new(),
            contact: String::new(),
            license_number: String::new(),
            password_hash: String::new(),
            is_active: true,
            salary_type: String::new(),
            base_salary: 0.0,
            commission_rate: 0.0,
            commission_per_passenger: 0.0,
            trip_completion_bonus: 0.0,
            created_at: None,
            updated_at: None,
        }
    }
}

// =============================================================================
// Earnings Rollups
// =============================================================================

/// Payment state of a monthly rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Processing,
    Paid,
}

impl PaymentStatus {
    /// The stored string value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monthly earnings rollup, keyed by `(driver_id, year, month)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct DriverEarnings {
    pub id: String,
    pub driver_id: String,

    /// When the rollup was opened.
    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,

    /// 1-12
    pub month: u32,
    pub year: i32,
    pub total_trips: u32,
    pub total_passengers: u32,
    pub base_salary: f64,
    pub commission_earnings: f64,
    pub bonus_earnings: f64,
    pub total_earnings: f64,

    /// Trip document ids, append-only.
    pub trips_completed: Vec<String>,

    pub payment_status: PaymentStatus,

    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub payment_date: Option<DateTime<Utc>>,

    pub notes: String,

    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Daily earnings rollup, keyed by `(driver_id, date)`.
///
/// `date` is the start of the calendar day in the configured offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct DailyEarnings {
    pub id: String,
    pub driver_id: String,

    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,

    pub trips_count: u32,
    pub passengers_count: u32,
    pub commission_earned: f64,
    pub bonus_earned: f64,
    pub total_earned: f64,
    pub trip_ids: Vec<String>,

    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Commission Settings
// =============================================================================

/// Fleet-wide commission configuration (a singleton document).
///
/// Missing fields take the defaults below, which are also used when the
/// document is absent or unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CommissionSettings {
    pub id: String,
    pub base_commission_rate: f64,
    pub passenger_bonus: f64,
    pub trip_completion_bonus: f64,

    /// Completed trips in a month that unlock the monthly bonus.
    pub monthly_trip_bonus_threshold: u32,
    pub monthly_trip_bonus_amount: f64,

    pub peak_hour_multiplier: f64,

    /// `"HH:MM-HH:MM"` labels shown to drivers. Peak classification itself
    /// is fixed to hours 7-9 and 17-19.
    pub peak_hours: Vec<String>,

    pub weekend_multiplier: f64,

    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for CommissionSettings {
    fn default() -> Self {
        CommissionSettings {
            id: String::new(),
            base_commission_rate: 0.05,
            passenger_bonus: 2.0,
            trip_completion_bonus: 5.0,
            monthly_trip_bonus_threshold: 100,
            monthly_trip_bonus_amount: 200.0,
            peak_hour_multiplier: 1.5,
            peak_hours: vec!["07:00-09:00".to_string(), "17:00-19:00".to_string()],
            weekend_multiplier: 1.2,
            updated_at: None,
        }
    }
}

// =============================================================================
// Calculation Results
// =============================================================================

/// Commission breakdown for one trip. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TripEarnings {
    pub trip_id: String,
    pub passengers: u32,
    pub base_commission: f64,
    pub passenger_bonus: f64,
    pub completion_bonus: f64,
    pub peak_hour_multiplier: f64,
    pub weekend_multiplier: f64,
    pub total_earnings: f64,
    pub calculation_details: String,
}

/// Earnings overview shown on the driver's earnings screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EarningsSummary {
    pub today_earnings: f64,
    pub week_earnings: f64,
    pub month_earnings: f64,
    pub total_trips: u32,
    pub total_passengers: u32,
    pub average_earnings_per_trip: f64,
    #[serde(with = "crate::timestamp::option")]
    #[ts(as = "Option<String>")]
    pub last_payment_date: Option<DateTime<Utc>>,
    pub pending_payment: f64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trip_status_wire_values() {
        assert_eq!(json!(TripStatus::InProgress), json!("in_progress"));
        assert_eq!(json!(TripStatus::Completed), json!("completed"));
        assert_eq!(json!(TripStatus::Cancelled), json!("cancelled"));
        assert_eq!(TripStatus::default(), TripStatus::InProgress);
    }

    #[test]
    fn test_trip_rejects_unknown_status() {
        let doc = json!({
            "driver_id": "D1",
            "start_terminal": "T1",
            "destination_terminal": "T2",
            "passengers": 3,
            "status": "paused"
        });
        assert!(serde_json::from_value::<Trip>(doc).is_err());
    }

    #[test]
    fn test_trip_requires_passengers() {
        let doc = json!({
            "driver_id": "D1",
            "start_terminal": "T1",
            "destination_terminal": "T2",
            "status": "in_progress"
        });
        assert!(serde_json::from_value::<Trip>(doc).is_err());
    }

    #[test]
    fn test_terminal_defaults() {
        let doc = json!({ "terminal_id": "T1", "name": "Central" });
        let terminal: Terminal = serde_json::from_value(doc).unwrap();
        assert!(terminal.is_active);
        assert_eq!(terminal.qr_code, "");
    }

    #[test]
    fn test_payment_status_matches_wire() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            PaymentStatus::Paid,
        ] {
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                json!(status.as_str())
            );
        }
        assert_eq!(PaymentStatus::Processing.to_string(), "processing");
    }

    #[test]
    fn test_partial_settings_document() {
        let settings: CommissionSettings =
            serde_json::from_value(json!({ "peak_hour_multiplier": 2.0 })).unwrap();
        assert_eq!(settings.peak_hour_multiplier, 2.0);
        assert_eq!(settings.weekend_multiplier, 1.2);
    }
}
