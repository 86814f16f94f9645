//! # Auth Commands

use tracing::debug;

use super::AppContext;
use crate::error::AppResult;

/// Logs in and saves the session for later invocations.
pub async fn login(ctx: &AppContext, identifier: &str, password: &str) -> AppResult<()> {
    let driver = ctx.auth.login(identifier, password).await?;
    println!("Logged in as {} ({})", driver.name, driver.driver_id);
    Ok(())
}

pub fn logout(ctx: &AppContext) -> AppResult<()> {
    ctx.auth.logout()?;
    println!("Logged out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> AppResult<()> {
    let driver = ctx.require_driver().await?;
    debug!(driver_id = %driver.driver_id, "whoami");

    println!("{} ({})", driver.name, driver.driver_id);
    if !driver.email.is_empty() {
        println!("  email:    {}", driver.email);
    }
    if !driver.contact.is_empty() {
        println!("  contact:  {}", driver.contact);
    }
    if !driver.license_number.is_empty() {
        println!("  license:  {}", driver.license_number);
    }
    println!(
        "  pay:      {:.2}/passenger + {:.2}/passenger bonus + {:.2}/trip",
        driver.commission_rate, driver.commission_per_passenger, driver.trip_completion_bonus
    );
    Ok(())
}
