//! # Earnings Commands

use super::AppContext;
use crate::error::AppResult;

/// Prints today / week / month totals and the monthly rollup.
pub async fn summary(ctx: &AppContext) -> AppResult<()> {
    let driver = ctx.require_driver().await?;
    let repo = ctx.db.earnings(ctx.config.calculator());

    let summary = repo.earnings_summary(&driver.driver_id).await?;

    println!("Earnings for {} ({})", driver.name, driver.driver_id);
    println!("  today:            {:>10.2}", summary.today_earnings);
    println!("  this week:        {:>10.2}", summary.week_earnings);
    println!("  this month:       {:>10.2}", summary.month_earnings);
    println!("  trips (month):    {:>10}", summary.total_trips);
    println!("  passengers:       {:>10}", summary.total_passengers);
    println!("  avg per trip:     {:>10.2}", summary.average_earnings_per_trip);
    println!("  pending payment:  {:>10.2}", summary.pending_payment);
    match summary.last_payment_date {
        Some(date) => println!("  last payment:     {}", date.format("%Y-%m-%d")),
        None => println!("  last payment:     -"),
    }

    let (year, month) = repo.calculator().year_month(chrono::Utc::now());
    if let Some(monthly) = repo.monthly_earnings(&driver.driver_id, year, month).await? {
        println!();
        println!("  {:04}-{:02} rollup", year, month);
        println!("    commission:     {:>10.2}", monthly.commission_earnings);
        println!("    bonuses:        {:>10.2}", monthly.bonus_earnings);
        println!("    base salary:    {:>10.2}", monthly.base_salary);
        println!("    payment:        {:>10}", monthly.payment_status.as_str());
    }
    Ok(())
}
