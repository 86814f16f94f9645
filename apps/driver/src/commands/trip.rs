//! # Trip Commands
//!
//! ## Typical Session
//! ```text
//! $ fleet-driver scan-start terminal_id:T001
//! $ fleet-driver start --from terminal_id:T001 --destination T002 --passengers 4
//! $ fleet-driver passengers 5
//! $ fleet-driver scan-destination terminal_id:T002
//! ```

use fleet_core::{Terminal, Trip};

use super::AppContext;
use crate::error::{AppError, AppResult};
use crate::state::TripUiState;

/// Lists terminals.
pub async fn terminals(ctx: &AppContext) -> AppResult<()> {
    let terminals = ctx.db.trips().all_terminals().await?;
    if terminals.is_empty() {
        println!("No terminals");
    }
    for t in &terminals {
        println!(
            "{:<8} {:<24} {:<38} {}",
            t.terminal_id,
            t.name,
            t.id,
            if t.is_active { "" } else { "(inactive)" }
        );
    }
    Ok(())
}

/// Resolves a start terminal without starting anything.
pub async fn scan_start(ctx: &AppContext, qr: &str) -> AppResult<()> {
    let ctrl = ctx.trip_controller().await?;
    let terminal = ctrl.scan_start_terminal(qr).await?;
    println!("Start terminal: {} ({})", terminal.name, terminal.terminal_id);
    Ok(())
}

/// Scans the start terminal, selects the details and starts the trip.
pub async fn start(ctx: &AppContext, from: &str, destination: &str, passengers: u32) -> AppResult<()> {
    let ctrl = ctx.trip_controller().await?;
    ctrl.scan_start_terminal(from).await?;

    let destination_id = find_terminal(&ctrl.state(), destination)
        .map(|t| t.id.clone())
        .ok_or_else(|| AppError::not_found("Terminal", destination))?;
    ctrl.select_trip_details(&destination_id, passengers).await?;

    let trip = ctrl.start_trip().await?;
    println!("Trip {} started", trip.trip_id);
    print_trip(&ctrl.state(), &trip);
    Ok(())
}

/// Completes the trip in progress.
pub async fn scan_destination(ctx: &AppContext, qr: &str) -> AppResult<()> {
    let ctrl = ctx.trip_controller().await?;
    let trip = ctrl.scan_destination_terminal(qr).await?;

    let state = ctrl.state();
    println!("Trip {} completed", trip.trip_id);
    print_trip(&state, &trip);

    if let Some(earnings) = &state.last_earnings {
        println!("  earned:   {}", earnings.calculation_details);
    }
    if let Some(message) = &state.error_message {
        println!("  warning:  {}", message);
    }
    Ok(())
}

pub async fn passengers(ctx: &AppContext, count: u32) -> AppResult<()> {
    let ctrl = ctx.trip_controller().await?;
    ctrl.update_passenger_count(count).await?;
    println!("Passengers: {}", count);
    Ok(())
}

pub async fn cancel(ctx: &AppContext) -> AppResult<()> {
    let ctrl = ctx.trip_controller().await?;
    let trip = ctrl.state().current_trip;
    ctrl.cancel_trip().await?;

    match trip {
        Some(trip) => println!("Trip {} cancelled", trip.trip_id),
        None => println!("No trip in progress"),
    }
    Ok(())
}

/// Prints the trip in progress, then the history.
pub async fn history(ctx: &AppContext) -> AppResult<()> {
    let ctrl = ctx.trip_controller().await?;
    let state = ctrl.state();

    if let Some(trip) = &state.current_trip {
        println!("In progress:");
        print_trip(&state, trip);
        println!();
    }

    if state.history.is_empty() {
        println!("No completed trips");
    }
    for trip in &state.history {
        print_trip(&state, trip);
    }
    Ok(())
}

pub async fn delete_trip(ctx: &AppContext, id: &str) -> AppResult<()> {
    let ctrl = ctx.trip_controller().await?;
    if ctrl.delete_trip(id).await? {
        println!("Deleted {}", id);
    } else {
        println!("No trip {}", id);
    }
    Ok(())
}

/// Prints the CDN URL of a terminal's QR image.
pub async fn qr_url(ctx: &AppContext, terminal: &str, size: u32) -> AppResult<()> {
    let trips = ctx.db.trips();
    let found = match trips.terminal_by_id(terminal).await? {
        Some(t) => Some(t),
        None => trips
            .all_terminals()
            .await?
            .into_iter()
            .find(|t| t.terminal_id == terminal),
    };
    let found = found.ok_or_else(|| AppError::not_found("Terminal", terminal))?;

    match found.qr_image_url(&ctx.config.cdn, size) {
        Some(url) => println!("{}", url),
        None => println!("{} has no QR image", found.name),
    }
    Ok(())
}

/// Terminal by document id or `terminal_id`.
fn find_terminal<'a>(state: &'a TripUiState, key: &str) -> Option<&'a Terminal> {
    state
        .terminals
        .iter()
        .find(|t| t.id == key)
        .or_else(|| state.terminals.iter().find(|t| t.terminal_id == key))
}

fn print_trip(state: &TripUiState, trip: &Trip) {
    let arrival = trip
        .arrival_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let start = trip
        .start_time
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "  {}  {} -> {}  {} pax  {} .. {}  [{}]",
        trip.trip_id,
        state.terminal_name(&trip.start_terminal),
        state.terminal_name(&trip.destination_terminal),
        trip.passengers,
        start,
        arrival,
        trip.status
    );
}
