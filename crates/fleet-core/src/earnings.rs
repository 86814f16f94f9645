//! # Earnings Calculator
//!
//! Computes the commission breakdown of one completed trip.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  base       = driver.commission_rate          × passengers             │
//! │  passenger  = driver.commission_per_passenger × passengers             │
//! │  completion = driver.trip_completion_bonus                              │
//! │                                                                         │
//! │  peak       = settings.peak_hour_multiplier   if hour(start) in 7-9,  │
//! │                                                 17-19 (inclusive)     │
//! │             = 1.0                             otherwise                 │
//! │  weekend    = settings.weekend_multiplier     if Sat / Sun              │
//! │             = 1.0                             otherwise                 │
//! │                                                                         │
//! │  total      = (base + passenger + completion) × peak × weekend         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Local Time
//! Hour of day, weekday and calendar day are taken in a fixed UTC offset
//! (the fleet's local time). [`compute_trip_earnings`] uses UTC.
//!
//! The calculator is pure: no I/O, safe to call repeatedly.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc, Weekday,
};

use crate::error::{CoreError, CoreResult};
use crate::types::{CommissionSettings, Driver, Trip, TripEarnings};

/// Computes a trip's earnings with calendar classification in UTC.
///
/// ## Errors
/// [`CoreError::MissingStartTime`] when `trip.start_time` is absent.
pub fn compute_trip_earnings(
    trip: &Trip,
    driver: &Driver,
    settings: &CommissionSettings,
) -> CoreResult<TripEarnings> {
    EarningsCalculator::utc().compute(trip, driver, settings)
}

/// Earnings calculator bound to the fleet's local UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarningsCalculator {
    offset: FixedOffset,
}

impl Default for EarningsCalculator {
    fn default() -> Self {
        Self::utc()
    }
}

impl EarningsCalculator {
    pub fn new(offset: FixedOffset) -> Self {
        EarningsCalculator { offset }
    }

    /// Calculator classifying in UTC.
    pub fn utc() -> Self {
        EarningsCalculator { offset: Utc.fix() }
    }

    /// Builds a calculator from an offset in minutes east of UTC.
    ///
    /// Returns `None` when the offset is outside ±24h.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    // =========================================================================
    // Calculation
    // =========================================================================

    /// Computes the breakdown for a trip.
    pub fn compute(
        &self,
        trip: &Trip,
        driver: &Driver,
        settings: &CommissionSettings,
    ) -> CoreResult<TripEarnings> {
        let start = trip.start_time.ok_or_else(|| CoreError::MissingStartTime {
            trip_id: trip.id.clone(),
        })?;

        let passengers = f64::from(trip.passengers);
        let base_commission = driver.commission_rate * passengers;
        let passenger_bonus = driver.commission_per_passenger * passengers;
        let completion_bonus = driver.trip_completion_bonus;

        let peak_hour_multiplier = if self.is_peak(start) {
            settings.peak_hour_multiplier
        } else {
            1.0
        };
        let weekend_multiplier = if self.is_weekend(start) {
            settings.weekend_multiplier
        } else {
            1.0
        };

        let subtotal = base_commission + passenger_bonus + completion_bonus;
        let total_earnings = subtotal * peak_hour_multiplier * weekend_multiplier;

        let calculation_details = format!(
            "Base: ${:.2} + Passenger Bonus: ${:.2} + Completion Bonus: ${:.2} × Peak: {:.1} × Weekend: {:.1} = ${:.2}",
            base_commission,
            passenger_bonus,
            completion_bonus,
            peak_hour_multiplier,
            weekend_multiplier,
            total_earnings
        );

        Ok(TripEarnings {
            trip_id: trip.id.clone(),
            passengers: trip.passengers,
            base_commission,
            passenger_bonus,
            completion_bonus,
            peak_hour_multiplier,
            weekend_multiplier,
            total_earnings,
            calculation_details,
        })
    }

    // =========================================================================
    // Calendar Classification
    // =========================================================================

    /// Morning (07-09) and evening (17-19) rush, both end hours included.
    ///
    /// `settings.peak_hours` does not move these windows.
    pub fn is_peak(&self, ts: DateTime<Utc>) -> bool {
        matches!(ts.with_timezone(&self.offset).hour(), 7..=9 | 17..=19)
    }

    /// Saturday and Sunday only.
    pub fn is_weekend(&self, ts: DateTime<Utc>) -> bool {
        matches!(
            ts.with_timezone(&self.offset).weekday(),
            Weekday::Sat | Weekday::Sun
        )
    }

    /// Local calendar date of `ts`.
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// `(year, month)` of `ts` in local time.
    pub fn year_month(&self, ts: DateTime<Utc>) -> (i32, u32) {
        let local = ts.with_timezone(&self.offset);
        (local.year(), local.month())
    }

    /// The UTC instant of local midnight on the day of `ts`.
    pub fn start_of_day(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        self.midnight(self.local_date(ts))
    }

    /// Local midnight of the Monday starting the week of `ts`.
    pub fn start_of_week(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.local_date(ts);
        let back = i64::from(date.weekday().num_days_from_monday());
        self.midnight(date - Duration::days(back))
    }

    /// Local midnight of the first day of the month of `ts`.
    pub fn start_of_month(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = self.local_date(ts);
        self.midnight(date - Duration::days(i64::from(date.day0())))
    }

    /// The UTC instant of local midnight on `date`.
    pub fn midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(chrono::NaiveTime::MIN);
        let utc = local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> Driver {
        Driver {
            driver_id: "D1".to_string(),
            commission_rate: 0.05,
            commission_per_passenger: 2.0,
            trip_completion_bonus: 5.0,
            ..Driver::default()
        }
    }

    fn trip_at(y: i32, m: u32, d: u32, h: u32, min: u32, passengers: u32) -> Trip {
        Trip {
            id: "trip-1".to_string(),
            driver_id: "D1".to_string(),
            passengers,
            start_time: Some(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()),
            ..Trip::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_tuesday_morning_peak() {
        // 2024-01-02 is a Tuesday
        let trip = trip_at(2024, 1, 2, 8, 0, 4);
        let e = compute_trip_earnings(&trip, &driver(), &CommissionSettings::default()).unwrap();

        assert!(approx(e.base_commission, 0.2));
        assert!(approx(e.passenger_bonus, 8.0));
        assert!(approx(e.completion_bonus, 5.0));
        assert!(approx(e.peak_hour_multiplier, 1.5));
        assert!(approx(e.weekend_multiplier, 1.0));
        assert!(approx(e.total_earnings, 19.8));
        assert_eq!(e.trip_id, "trip-1");
        assert_eq!(
            e.calculation_details,
            "Base: $0.20 + Passenger Bonus: $8.00 + Completion Bonus: $5.00 × Peak: 1.5 × Weekend: 1.0 = $19.80"
        );
    }

    #[test]
    fn test_total_matches_formula() {
        let settings = CommissionSettings::default();
        let d = driver();
        for (hour, passengers) in [(3, 0), (8, 1), (12, 7), (18, 30), (23, 60)] {
            let trip = trip_at(2024, 1, 6, hour, 15, passengers);
            let e = compute_trip_earnings(&trip, &d, &settings).unwrap();
            let p = f64::from(passengers);
            let expected = (d.commission_rate * p
                + d.commission_per_passenger * p
                + d.trip_completion_bonus)
                * e.peak_hour_multiplier
                * e.weekend_multiplier;
            assert!(approx(e.total_earnings, expected));
        }
    }

    #[test]
    fn test_peak_boundary_hours() {
        let calc = EarningsCalculator::utc();

        for hour in [7, 9, 17, 19] {
            let ts = Utc.with_ymd_and_hms(2024, 1, 2, hour, 59, 0).unwrap();
            assert!(calc.is_peak(ts), "hour {} should be peak", hour);
        }
        for hour in [6, 10, 16, 20] {
            let ts = Utc.with_ymd_and_hms(2024, 1, 2, hour, 0, 0).unwrap();
            assert!(!calc.is_peak(ts), "hour {} should not be peak", hour);
        }
    }

    #[test]
    fn test_stored_peak_labels_do_not_move_peak() {
        let settings = CommissionSettings {
            peak_hours: vec!["12:00-13:00".to_string()],
            ..CommissionSettings::default()
        };

        // Tuesday 08:00 stays peak
        let morning = trip_at(2024, 1, 2, 8, 0, 4);
        let e = compute_trip_earnings(&morning, &driver(), &settings).unwrap();
        assert!(approx(e.peak_hour_multiplier, 1.5));
        assert!(approx(e.total_earnings, 19.8));

        // Tuesday 12:00 stays off-peak
        let noon = trip_at(2024, 1, 2, 12, 0, 4);
        let e = compute_trip_earnings(&noon, &driver(), &settings).unwrap();
        assert!(approx(e.peak_hour_multiplier, 1.0));
        assert!(approx(e.total_earnings, 13.2));

        let empty = CommissionSettings {
            peak_hours: Vec::new(),
            ..CommissionSettings::default()
        };
        let e = compute_trip_earnings(&morning, &driver(), &empty).unwrap();
        assert!(approx(e.total_earnings, 19.8));
    }

    #[test]
    fn test_weekend_classification() {
        let calc = EarningsCalculator::utc();
        // 2024-01-06 Saturday, 2024-01-07 Sunday, 2024-01-08 Monday, 2024-01-05 Friday
        let at = |d| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap();
        assert!(calc.is_weekend(at(6)));
        assert!(calc.is_weekend(at(7)));
        assert!(!calc.is_weekend(at(8)));
        assert!(!calc.is_weekend(at(5)));
    }

    #[test]
    fn test_weekend_peak_stacks() {
        // Saturday 18:00
        let trip = trip_at(2024, 1, 6, 18, 0, 4);
        let e = compute_trip_earnings(&trip, &driver(), &CommissionSettings::default()).unwrap();
        assert!(approx(e.total_earnings, 13.2 * 1.5 * 1.2));
    }

    #[test]
    fn test_missing_start_time_fails() {
        let trip = Trip {
            id: "no-start".to_string(),
            passengers: 2,
            ..Trip::default()
        };
        let err = compute_trip_earnings(&trip, &driver(), &CommissionSettings::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingStartTime { trip_id } if trip_id == "no-start"));
    }

    #[test]
    fn test_offset_shifts_classification() {
        // 06:30 UTC is 08:30 at +02:00
        let calc = EarningsCalculator::from_offset_minutes(120).unwrap();
        let trip = trip_at(2024, 1, 2, 6, 30, 4);
        let e = calc
            .compute(&trip, &driver(), &CommissionSettings::default())
            .unwrap();
        assert!(approx(e.peak_hour_multiplier, 1.5));

        let utc = compute_trip_earnings(&trip, &driver(), &CommissionSettings::default()).unwrap();
        assert!(approx(utc.peak_hour_multiplier, 1.0));
    }

    #[test]
    fn test_calendar_boundaries() {
        let calc = EarningsCalculator::from_offset_minutes(-300).unwrap();
        // 2024-03-01 02:00 UTC is still 2024-02-29 21:00 at -05:00
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 2, 0, 0).unwrap();

        assert_eq!(calc.year_month(ts), (2024, 2));
        assert_eq!(
            calc.start_of_day(ts),
            Utc.with_ymd_and_hms(2024, 2, 29, 5, 0, 0).unwrap()
        );
        assert_eq!(
            calc.start_of_month(ts),
            Utc.with_ymd_and_hms(2024, 2, 1, 5, 0, 0).unwrap()
        );
        // 2024-02-29 is a Thursday; the week starts Monday 2024-02-26
        assert_eq!(
            calc.start_of_week(ts),
            Utc.with_ymd_and_hms(2024, 2, 26, 5, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_offset() {
        assert!(EarningsCalculator::from_offset_minutes(24 * 60).is_none());
        assert!(EarningsCalculator::from_offset_minutes(-330).is_some());
    }
}
