//! # Earnings Repository
//!
//! Maintains the daily and monthly earnings rollups and builds the
//! driver's earnings summary.
//!
//! ## Recording a Trip
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_trip_earnings(trip, driver, earnings)                           │
//! │       │                                                                 │
//! │       ├──► daily_earnings    (driver, start day of trip)               │
//! │       │      read ─► add deltas ─► write whole document                 │
//! │       │                                                                 │
//! │       └──► driver_earnings   (driver, year, month of trip start)       │
//! │              read ─► add deltas ─► monthly bonus? ─► write              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Read-modify-write without a transaction: two completions for the same
//! driver and day racing each other lose one update. Fine for one driver on
//! one device.
//!
//! Both rollups are keyed by the trip's `start_time` in the calculator's
//! offset, so a trip started at 23:50 and finished after midnight counts
//! for the day it started.

use chrono::{DateTime, Duration, Utc};
use fleet_core::{
    collections, CommissionSettings, CoreError, DailyEarnings, Driver, DriverEarnings,
    EarningsCalculator, EarningsSummary, PaymentStatus, Trip, TripEarnings,
};
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::store::{DocumentStore, Query};

/// Repository for earnings rollups and commission settings.
#[derive(Debug, Clone)]
pub struct EarningsRepository {
    store: DocumentStore,
    calculator: EarningsCalculator,
}

impl EarningsRepository {
    pub fn new(store: DocumentStore, calculator: EarningsCalculator) -> Self {
        EarningsRepository { store, calculator }
    }

    pub fn calculator(&self) -> &EarningsCalculator {
        &self.calculator
    }

    // =========================================================================
    // Settings + Calculation
    // =========================================================================

    /// The commission settings singleton.
    ///
    /// Falls back to defaults when the document is absent, unreadable, or
    /// the store fails.
    pub async fn commission_settings(&self) -> CommissionSettings {
        match self
            .store
            .first::<CommissionSettings>(Query::new(collections::COMMISSION_SETTINGS))
            .await
        {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No commission settings stored, using defaults");
                CommissionSettings::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load commission settings, using defaults");
                CommissionSettings::default()
            }
        }
    }

    /// Computes a trip's earnings with the current settings.
    pub async fn calculate_trip_earnings(
        &self,
        trip: &Trip,
        driver: &Driver,
    ) -> DbResult<TripEarnings> {
        let settings = self.commission_settings().await;
        let earnings = self.calculator.compute(trip, driver, &settings)?;

        debug!(
            trip = %trip.id,
            total = earnings.total_earnings,
            details = %earnings.calculation_details,
            "Trip earnings calculated"
        );
        Ok(earnings)
    }

    // =========================================================================
    // Rollup Writes
    // =========================================================================

    /// Adds a completed trip to the driver's daily and monthly rollups.
    pub async fn record_trip_earnings(
        &self,
        trip: &Trip,
        driver: &Driver,
        earnings: &TripEarnings,
    ) -> DbResult<()> {
        let start = trip.start_time.ok_or_else(|| CoreError::MissingStartTime {
            trip_id: trip.id.clone(),
        })?;

        self.update_daily(&driver.driver_id, start, trip, earnings)
            .await?;

        let settings = self.commission_settings().await;
        self.update_monthly(driver, start, trip, earnings, &settings)
            .await?;

        info!(
            driver_id = %driver.driver_id,
            trip = %trip.id,
            total = earnings.total_earnings,
            "Trip earnings recorded"
        );
        Ok(())
    }

    async fn update_daily(
        &self,
        driver_id: &str,
        start: DateTime<Utc>,
        trip: &Trip,
        earnings: &TripEarnings,
    ) -> DbResult<()> {
        let now = Utc::now();

        match self.daily_earnings(driver_id, start).await? {
            Some(mut daily) => {
                add_to_daily(&mut daily, trip, earnings);
                daily.updated_at = Some(now);
                let id = daily.id.clone();
                self.store.set(collections::DAILY_EARNINGS, &id, &daily).await
            }
            None => {
                let mut daily = DailyEarnings {
                    driver_id: driver_id.to_string(),
                    date: Some(self.calculator.start_of_day(start)),
                    created_at: Some(now),
                    updated_at: Some(now),
                    ..DailyEarnings::default()
                };
                add_to_daily(&mut daily, trip, earnings);
                self.store
                    .add(collections::DAILY_EARNINGS, &daily)
                    .await
                    .map(|_| ())
            }
        }
    }

    async fn update_monthly(
        &self,
        driver: &Driver,
        start: DateTime<Utc>,
        trip: &Trip,
        earnings: &TripEarnings,
        settings: &CommissionSettings,
    ) -> DbResult<()> {
        let now = Utc::now();
        let (year, month) = self.calculator.year_month(start);

        match self
            .monthly_earnings(&driver.driver_id, year, month)
            .await?
        {
            Some(mut monthly) => {
                add_to_monthly(&mut monthly, trip, earnings, settings);
                monthly.updated_at = Some(now);
                let id = monthly.id.clone();
                self.store
                    .set(collections::DRIVER_EARNINGS, &id, &monthly)
                    .await
            }
            None => {
                let mut monthly = DriverEarnings {
                    driver_id: driver.driver_id.clone(),
                    date: Some(self.calculator.start_of_month(start)),
                    month,
                    year,
                    base_salary: driver.base_salary,
                    payment_status: PaymentStatus::Pending,
                    created_at: Some(now),
                    updated_at: Some(now),
                    ..DriverEarnings::default()
                };
                add_to_monthly(&mut monthly, trip, earnings, settings);
                self.store
                    .add(collections::DRIVER_EARNINGS, &monthly)
                    .await
                    .map(|_| ())
            }
        }
    }

    // =========================================================================
    // Rollup Reads
    // =========================================================================

    /// The monthly rollup for `(driver_id, year, month)`.
    pub async fn monthly_earnings(
        &self,
        driver_id: &str,
        year: i32,
        month: u32,
    ) -> DbResult<Option<DriverEarnings>> {
        self.store
            .first(
                Query::new(collections::DRIVER_EARNINGS)
                    .eq("driver_id", driver_id)
                    .eq("year", year)
                    .eq("month", month),
            )
            .await
    }

    /// The daily rollup for the local day containing `at`.
    pub async fn daily_earnings(
        &self,
        driver_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<DailyEarnings>> {
        let start = self.calculator.start_of_day(at);
        let end = start + Duration::days(1) - Duration::milliseconds(1);

        self.store
            .first(
                Query::new(collections::DAILY_EARNINGS)
                    .eq("driver_id", driver_id)
                    .gte("date", start)
                    .lte("date", end),
            )
            .await
    }

    /// Sum of daily `total_earned` with `date` in `[from, to]`.
    pub async fn earnings_in_range(
        &self,
        driver_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<f64> {
        let days: Vec<DailyEarnings> = self
            .store
            .query(
                &Query::new(collections::DAILY_EARNINGS)
                    .eq("driver_id", driver_id)
                    .gte("date", from)
                    .lte("date", to),
            )
            .await?;

        Ok(days.iter().map(|d| d.total_earned).sum())
    }

    /// Earnings overview as of now.
    pub async fn earnings_summary(&self, driver_id: &str) -> DbResult<EarningsSummary> {
        self.earnings_summary_at(driver_id, Utc::now()).await
    }

    /// Earnings overview as of `now`.
    ///
    /// Issues independent reads; a trip recorded in between may be
    /// partially reflected.
    pub async fn earnings_summary_at(
        &self,
        driver_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<EarningsSummary> {
        let today_earnings = self
            .daily_earnings(driver_id, now)
            .await?
            .map(|d| d.total_earned)
            .unwrap_or(0.0);

        let week_earnings = self
            .earnings_in_range(driver_id, self.calculator.start_of_week(now), now)
            .await?;

        let (year, month) = self.calculator.year_month(now);
        let monthly = self.monthly_earnings(driver_id, year, month).await?;

        let month_earnings = monthly.as_ref().map(|m| m.total_earnings).unwrap_or(0.0);
        let total_trips = monthly.as_ref().map(|m| m.total_trips).unwrap_or(0);
        let total_passengers = monthly.as_ref().map(|m| m.total_passengers).unwrap_or(0);
        let average_earnings_per_trip = if total_trips > 0 {
            month_earnings / f64::from(total_trips)
        } else {
            0.0
        };
        let pending_payment = match &monthly {
            Some(m) if m.payment_status == PaymentStatus::Pending => month_earnings,
            _ => 0.0,
        };

        Ok(EarningsSummary {
            today_earnings,
            week_earnings,
            month_earnings,
            total_trips,
            total_passengers,
            average_earnings_per_trip,
            last_payment_date: monthly.and_then(|m| m.payment_date),
            pending_payment,
        })
    }
}

// =============================================================================
// Rollup Arithmetic
// =============================================================================

fn add_to_daily(daily: &mut DailyEarnings, trip: &Trip, earnings: &TripEarnings) {
    daily.trips_count += 1;
    daily.passengers_count += trip.passengers;
    daily.commission_earned += earnings.base_commission;
    daily.bonus_earned += earnings.passenger_bonus + earnings.completion_bonus;
    daily.total_earned += earnings.total_earnings;
    daily.trip_ids.push(trip.id.clone());
}

fn add_to_monthly(
    monthly: &mut DriverEarnings,
    trip: &Trip,
    earnings: &TripEarnings,
    settings: &CommissionSettings,
) {
    monthly.total_trips += 1;
    monthly.total_passengers += trip.passengers;
    monthly.commission_earnings += earnings.total_earnings;
    monthly.total_earnings += earnings.total_earnings;
    monthly.trips_completed.push(trip.id.clone());

    // Awarded once, on the completion that reaches the threshold
    let threshold = settings.monthly_trip_bonus_threshold;
    if threshold > 0 && monthly.total_trips == threshold {
        monthly.bonus_earnings += settings.monthly_trip_bonus_amount;
        monthly.total_earnings += settings.monthly_trip_bonus_amount;
        info!(
            driver_id = %monthly.driver_id,
            year = monthly.year,
            month = monthly.month,
            bonus = settings.monthly_trip_bonus_amount,
            "Monthly trip bonus awarded"
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
