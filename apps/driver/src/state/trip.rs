//! # Trip State Controller
//!
//! Orchestrates one driver's trip lifecycle and publishes the UI state.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌────────┐ scan_start ┌─────────────────┐ select_trip ┌─────────────┐ │
//! │  │ NoTrip │───────────►│ TerminalScanned │────────────►│ PassengerCnt│ │
//! │  └────────┘            └─────────────────┘             │  Entered    │ │
//! │      ▲                                                 └──────┬──────┘ │
//! │      │                                                  start_trip     │
//! │      │ dismiss_completion                                     ▼        │
//! │  ┌───────────────┐   scan_destination (match)   ┌────────────────────┐ │
//! │  │ TripCompleted │◄─────────────────────────────│  TripInProgress    │ │
//! │  └───────────────┘                              │  (passengers edit) │ │
//! │                                                 └────────────────────┘ │
//! │                     scan_destination (mismatch): stays in progress     │
//! │                     cancel_trip: back to NoTrip                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Policy
//! Every action issues its calls, awaits them, and on failure stores the
//! message in `error_message` without changing the phase. Nothing is
//! retried; the driver re-scans or re-taps.
//!
//! ## Concurrency
//! The one-trip-per-driver check in [`TripController::start_trip`] is a
//! read followed by a write. Two devices logged in as the same driver can
//! both pass it.

use fleet_core::validation::{validate_active_terminal, validate_passenger_count, validate_trip_route};
use fleet_core::{
    CoreError, Driver, Terminal, Trip, TripEarnings, TripStatus, DEFAULT_HISTORY_LIMIT,
};
use fleet_db::{EarningsRepository, TripRepository};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{AppError, AppResult};

// =============================================================================
// UI State
// =============================================================================

/// Where the driver is in the trip lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TripPhase {
    #[default]
    NoTrip,
    TerminalScanned,
    PassengerCountEntered,
    TripInProgress,
    TripCompleted,
}

/// Everything the trip screen renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct TripUiState {
    pub phase: TripPhase,
    pub is_loading: bool,
    pub error_message: Option<String>,

    /// Terminal scanned to begin the trip.
    pub start_terminal: Option<Terminal>,
    pub selected_destination: Option<Terminal>,
    pub passenger_count: u32,

    /// The trip in progress, or the one just completed.
    pub current_trip: Option<Trip>,

    /// All terminals, for the destination picker.
    pub terminals: Vec<Terminal>,

    /// Completed trips, most recent first.
    pub history: Vec<Trip>,

    /// Terminal document id to name, for rendering `history`.
    pub terminal_names: HashMap<String, String>,

    /// Earnings of the trip just completed.
    pub last_earnings: Option<TripEarnings>,
}

impl TripUiState {
    /// Display name of a terminal id, falling back to the id.
    pub fn terminal_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.terminal_names
            .get(id)
            .map(String::as_str)
            .or_else(|| {
                self.terminals
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| t.name.as_str())
            })
            .unwrap_or(id)
    }

    /// Clears the trip-in-hand, keeping catalogs and history.
    fn clear_trip(&mut self) {
        self.phase = TripPhase::NoTrip;
        self.start_terminal = None;
        self.selected_destination = None;
        self.passenger_count = 0;
        self.current_trip = None;
        self.last_earnings = None;
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Trip lifecycle for the logged-in driver.
///
/// The driver is passed in at construction; a new controller is built per
/// login.
pub struct TripController {
    trips: TripRepository,
    earnings: EarningsRepository,
    driver: Driver,
    history_limit: u32,
    state: watch::Sender<TripUiState>,
}

impl TripController {
    pub fn new(trips: TripRepository, earnings: EarningsRepository, driver: Driver) -> Self {
        let (state, _) = watch::channel(TripUiState::default());
        TripController {
            trips,
            earnings,
            driver,
            history_limit: DEFAULT_HISTORY_LIMIT,
            state,
        }
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit.max(1);
        self
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<TripUiState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> TripUiState {
        self.state.borrow().clone()
    }

    fn update(&self, f: impl FnOnce(&mut TripUiState)) {
        self.state.send_modify(f);
    }

    /// Runs one user action: sets the loading flag, clears the previous
    /// error, and stores the new one on failure.
    async fn track<T>(
        &self,
        action: &'static str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        self.update(|s| {
            s.is_loading = true;
            s.error_message = None;
        });

        let result = fut.await;

        self.update(|s| {
            s.is_loading = false;
            if let Err(e) = &result {
                s.error_message = Some(e.message.clone());
            }
        });

        if let Err(e) = &result {
            warn!(action = action, code = ?e.code, error = %e.message, "Trip action failed");
        }
        result
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Loads terminals, any trip already in progress, and the history.
    ///
    /// A trip left in progress (app restart, another device) puts the
    /// controller straight into `TripInProgress`.
    pub async fn load(&self) -> AppResult<()> {
        self.track("load", async {
            let terminals = self.trips.all_terminals().await?;
            let current = self.trips.current_trip_for(&self.driver.driver_id).await?;

            let (start, destination) = match &current {
                Some(trip) => (
                    self.trips.terminal_by_id(&trip.start_terminal).await?,
                    self.trips.terminal_by_id(&trip.destination_terminal).await?,
                ),
                None => (None, None),
            };

            self.update(|s| {
                s.terminals = terminals;
                match current {
                    Some(trip) => {
                        s.phase = TripPhase::TripInProgress;
                        s.passenger_count = trip.passengers;
                        s.start_terminal = start;
                        s.selected_destination = destination;
                        s.current_trip = Some(trip);
                        s.last_earnings = None;
                    }
                    None if s.phase == TripPhase::TripInProgress => s.clear_trip(),
                    None => {}
                }
            });

            self.load_history().await
        })
        .await?;

        let state = self.state();
        debug!(
            driver_id = %self.driver.driver_id,
            phase = ?state.phase,
            terminals = state.terminals.len(),
            "Trip state loaded"
        );
        Ok(())
    }

    /// Reloads the completed-trip history.
    pub async fn refresh_history(&self) -> AppResult<()> {
        self.track("refresh_history", self.load_history()).await
    }

    async fn load_history(&self) -> AppResult<()> {
        let history = self
            .trips
            .completed_trips_for(&self.driver.driver_id, self.history_limit)
            .await?;

        let ids: Vec<String> = history
            .iter()
            .flat_map(|t| [t.start_terminal.clone(), t.destination_terminal.clone()])
            .collect();
        let names: HashMap<String, String> = self
            .trips
            .terminals_by_ids(&ids)
            .await?
            .into_iter()
            .map(|(id, t)| (id, t.name))
            .collect();

        self.update(|s| {
            s.history = history;
            s.terminal_names = names;
        });
        Ok(())
    }

    // =========================================================================
    // Starting a Trip
    // =========================================================================

    /// Resolves the start terminal from a scanned QR payload.
    ///
    /// On a miss the phase is unchanged and the driver can rescan.
    pub async fn scan_start_terminal(&self, qr: &str) -> AppResult<Terminal> {
        self.track("scan_start_terminal", async {
            if self.state.borrow().phase == TripPhase::TripInProgress {
                return Err(AppError::validation("A trip is already in progress"));
            }

            let terminal = self
                .trips
                .resolve_terminal_by_qr(qr)
                .await?
                .ok_or_else(|| AppError::not_found("Terminal", qr.trim()))?;
            validate_active_terminal(&terminal)?;

            info!(terminal_id = %terminal.terminal_id, name = %terminal.name, "Start terminal scanned");
            self.update(|s| {
                s.clear_trip();
                s.phase = TripPhase::TerminalScanned;
                s.start_terminal = Some(terminal.clone());
            });
            Ok(terminal)
        })
        .await
    }

    /// Chooses the destination (by terminal document id) and passenger count.
    pub async fn select_trip_details(&self, destination_id: &str, passengers: u32) -> AppResult<()> {
        self.track("select_trip_details", async {
            let (phase, start, known) = {
                let s = self.state.borrow();
                let known = s.terminals.iter().find(|t| t.id == destination_id).cloned();
                (s.phase, s.start_terminal.clone(), known)
            };

            let start = match (phase, start) {
                (TripPhase::TerminalScanned | TripPhase::PassengerCountEntered, Some(start)) => start,
                _ => return Err(AppError::validation("Scan the start terminal first")),
            };
            validate_passenger_count(passengers)?;

            let destination = match known {
                Some(t) => t,
                None => self
                    .trips
                    .terminal_by_id(destination_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Terminal", destination_id))?,
            };
            validate_trip_route(&start, &destination)?;

            self.update(|s| {
                s.phase = TripPhase::PassengerCountEntered;
                s.selected_destination = Some(destination);
                s.passenger_count = passengers;
            });
            Ok(())
        })
        .await
    }

    /// Creates the trip from the selected details.
    ///
    /// Refused while the driver already has a trip in progress.
    pub async fn start_trip(&self) -> AppResult<Trip> {
        self.track("start_trip", async {
            let (phase, start, destination, passengers) = {
                let s = self.state.borrow();
                (
                    s.phase,
                    s.start_terminal.clone(),
                    s.selected_destination.clone(),
                    s.passenger_count,
                )
            };

            let (start, destination) = match (phase, start, destination) {
                (TripPhase::PassengerCountEntered, Some(start), Some(destination)) => {
                    (start, destination)
                }
                _ => {
                    return Err(AppError::validation(
                        "Choose a destination and passenger count first",
                    ))
                }
            };

            if let Some(existing) = self.trips.current_trip_for(&self.driver.driver_id).await? {
                return Err(AppError::validation(format!(
                    "Trip {} is already in progress",
                    existing.trip_id
                )));
            }

            let id = self
                .trips
                .start_trip(&self.driver.driver_id, &start.id, &destination.id, passengers)
                .await?;
            let trip = self
                .trips
                .trip_by_id(&id)
                .await?
                .ok_or_else(|| AppError::not_found("Trip", &id))?;

            self.update(|s| {
                s.phase = TripPhase::TripInProgress;
                s.current_trip = Some(trip.clone());
            });
            Ok(trip)
        })
        .await
    }

    // =========================================================================
    // Trip in Progress
    // =========================================================================

    /// Completes the trip if the scanned terminal is its destination.
    ///
    /// A different terminal is rejected and the trip stays in progress.
    /// Once completed, the trip's earnings are calculated and recorded; if
    /// that fails the trip stays completed and the failure is shown in
    /// `error_message`.
    pub async fn scan_destination_terminal(&self, qr: &str) -> AppResult<Trip> {
        self.track("scan_destination_terminal", async {
            let trip = self.trip_in_progress()?;

            let scanned = self
                .trips
                .resolve_terminal_by_qr(qr)
                .await?
                .ok_or_else(|| AppError::not_found("Terminal", qr.trim()))?;

            if scanned.id != trip.destination_terminal {
                let expected = self.expected_destination_name(&trip).await;
                warn!(
                    trip = %trip.trip_id,
                    expected = %expected,
                    scanned = %scanned.name,
                    "Destination mismatch"
                );
                return Err(CoreError::DestinationMismatch {
                    expected,
                    scanned: scanned.name,
                }
                .into());
            }

            let arrived_at = self.trips.complete_trip(&trip.id, &scanned.id).await?;
            let completed = Trip {
                destination_terminal: scanned.id.clone(),
                arrival_time: Some(arrived_at),
                status: TripStatus::Completed,
                updated_at: Some(arrived_at),
                ..trip
            };

            self.update(|s| {
                s.phase = TripPhase::TripCompleted;
                s.current_trip = Some(completed.clone());
                s.last_earnings = None;
            });

            match self.record_earnings(&completed).await {
                Ok(earnings) => self.update(|s| s.last_earnings = Some(earnings)),
                Err(e) => {
                    warn!(trip = %completed.trip_id, error = %e, "Earnings not recorded");
                    self.update(|s| {
                        s.error_message =
                            Some(format!("Trip completed, but earnings were not recorded: {}", e.message))
                    });
                }
            }

            if let Err(e) = self.load_history().await {
                warn!(error = %e, "History refresh after completion failed");
            }
            Ok(completed)
        })
        .await
    }

    async fn record_earnings(&self, trip: &Trip) -> AppResult<TripEarnings> {
        let earnings = self.earnings.calculate_trip_earnings(trip, &self.driver).await?;
        self.earnings
            .record_trip_earnings(trip, &self.driver, &earnings)
            .await?;
        Ok(earnings)
    }

    async fn expected_destination_name(&self, trip: &Trip) -> String {
        let cached = {
            let s = self.state.borrow();
            s.selected_destination
                .as_ref()
                .filter(|t| t.id == trip.destination_terminal)
                .or_else(|| s.terminals.iter().find(|t| t.id == trip.destination_terminal))
                .map(|t| t.name.clone())
        };
        if let Some(name) = cached {
            return name;
        }
        match self.trips.terminal_by_id(&trip.destination_terminal).await {
            Ok(Some(t)) => t.name,
            _ => trip.destination_terminal.clone(),
        }
    }

    /// Changes the passenger count.
    ///
    /// Before a trip starts this only edits the selection. During a trip
    /// the stored trip is updated first and local state follows on success.
    pub async fn update_passenger_count(&self, count: u32) -> AppResult<()> {
        self.track("update_passenger_count", async {
            validate_passenger_count(count)?;

            let phase = self.state.borrow().phase;
            match phase {
                TripPhase::TerminalScanned | TripPhase::PassengerCountEntered => {
                    self.update(|s| s.passenger_count = count);
                    Ok(())
                }
                TripPhase::TripInProgress => {
                    let trip = self.trip_in_progress()?;
                    self.trips.update_passengers(&trip.id, count).await?;
                    self.update(|s| {
                        s.passenger_count = count;
                        if let Some(t) = s.current_trip.as_mut() {
                            t.passengers = count;
                        }
                    });
                    Ok(())
                }
                TripPhase::TripCompleted => {
                    let trip = self.state.borrow().current_trip.clone();
                    Err(match trip {
                        Some(t) => CoreError::InvalidTripStatus {
                            trip_id: t.trip_id,
                            status: t.status.to_string(),
                        }
                        .into(),
                        None => AppError::validation("No trip in progress"),
                    })
                }
                TripPhase::NoTrip => Err(AppError::validation("No trip in progress")),
            }
        })
        .await
    }

    /// Cancels the trip in progress, or drops an unstarted selection.
    pub async fn cancel_trip(&self) -> AppResult<()> {
        self.track("cancel_trip", async {
            let phase = self.state.borrow().phase;
            if phase == TripPhase::TripInProgress {
                let trip = self.trip_in_progress()?;
                self.trips.cancel_trip(&trip.id).await?;
                info!(trip = %trip.trip_id, "Trip cancelled by driver");
            }
            self.update(TripUiState::clear_trip);
            Ok(())
        })
        .await
    }

    fn trip_in_progress(&self) -> AppResult<Trip> {
        let s = self.state.borrow();
        match (&s.phase, &s.current_trip) {
            (TripPhase::TripInProgress, Some(trip)) => Ok(trip.clone()),
            _ => Err(AppError::validation("No trip in progress")),
        }
    }

    // =========================================================================
    // Housekeeping
    // =========================================================================

    /// Leaves the completion screen.
    pub fn dismiss_completion(&self) {
        self.update(|s| {
            if s.phase == TripPhase::TripCompleted {
                s.clear_trip();
            }
        });
    }

    /// Drops everything, as on logout.
    pub fn reset(&self) {
        self.state.send_replace(TripUiState::default());
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error_message = None);
    }

    /// Deletes one of the driver's trips.
    ///
    /// The trip in progress must be cancelled first.
    pub async fn delete_trip(&self, trip_id: &str) -> AppResult<bool> {
        self.track("delete_trip", async {
            let trip = match self.trips.trip_by_id(trip_id).await? {
                Some(trip) => trip,
                None => return Ok(false),
            };
            if trip.driver_id != self.driver.driver_id {
                return Err(AppError::auth("Trip belongs to another driver"));
            }
            if trip.is_in_progress() {
                return Err(AppError::validation("Cancel the trip before deleting it"));
            }

            let deleted = self.trips.delete_trip(trip_id).await?;
            self.update(|s| {
                s.history.retain(|t| t.id != trip_id);
                if s.current_trip.as_ref().is_some_and(|t| t.id == trip_id) {
                    s.clear_trip();
                }
            });
            Ok(deleted)
        })
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
