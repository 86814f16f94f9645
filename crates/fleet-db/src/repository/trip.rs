//! # Trip Repository
//!
//! Terminals and trips: QR resolution and the trip lifecycle writes.
//!
//! ## Trip Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start_trip        add     {status: in_progress, start_time: now, ...} │
//! │  update_passengers patch   {passengers}                                 │
//! │  complete_trip     patch   {status: completed, arrival_time: now,      │
//! │                             destination_terminal}                       │
//! │  cancel_trip       patch   {status: cancelled}                          │
//! │  delete_trip       delete                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Known Gaps
//! - "One in-progress trip per driver" is not enforced here. Callers check
//!   [`TripRepository::current_trip_for`] first, which is not atomic.
//! - `complete_trip` is not guarded: completing twice rewrites the same
//!   fields and succeeds both times.

use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use fleet_core::validation::validate_passenger_count;
use fleet_core::{collections, timestamp, QrPayload, Terminal, TerminalLookup, Trip, TripStatus};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbResult;
use crate::store::{Direction, DocumentStore, Query};

/// Repository for terminal and trip documents.
#[derive(Debug, Clone)]
pub struct TripRepository {
    store: DocumentStore,
}

impl TripRepository {
    pub fn new(store: DocumentStore) -> Self {
        TripRepository { store }
    }

    // =========================================================================
    // Terminals
    // =========================================================================

    /// Resolves a scanned QR payload to a terminal.
    ///
    /// ## Resolution Order
    /// 1. `qr_code` equals the payload
    /// 2. For `terminal_id:<x>`: `terminal_id` equals `x`, then document id `x`
    /// 3. `terminal_id` equals the whole payload
    ///
    /// ## Returns
    /// * `Ok(Some(terminal))` - first hit
    /// * `Ok(None)` - no strategy matched
    /// * `Err(_)` - blank payload, or the store failed
    pub async fn resolve_terminal_by_qr(&self, code: &str) -> DbResult<Option<Terminal>> {
        let payload = QrPayload::parse(code)?;
        debug!(payload = %payload.as_str(), "Resolving terminal");

        for lookup in payload.lookups() {
            let found: Option<Terminal> = match &lookup {
                TerminalLookup::ByQrCode(qr) => {
                    self.store
                        .first(Query::new(collections::TERMINALS).eq("qr_code", qr))
                        .await?
                }
                TerminalLookup::ByTerminalId(terminal_id) => {
                    self.store
                        .first(Query::new(collections::TERMINALS).eq("terminal_id", terminal_id))
                        .await?
                }
                TerminalLookup::ByDocumentId(id) => {
                    self.store.get(collections::TERMINALS, id).await?
                }
            };

            if let Some(terminal) = found {
                debug!(?lookup, terminal = %terminal.id, "Terminal resolved");
                return Ok(Some(terminal));
            }
        }

        debug!(payload = %payload.as_str(), "No terminal matched");
        Ok(None)
    }

    /// All terminals, by name.
    pub async fn all_terminals(&self) -> DbResult<Vec<Terminal>> {
        self.store
            .query(&Query::new(collections::TERMINALS).order_by("name", Direction::Asc))
            .await
    }

    pub async fn terminal_by_id(&self, id: &str) -> DbResult<Option<Terminal>> {
        self.store.get(collections::TERMINALS, id).await
    }

    /// Terminals keyed by document id. Unknown ids are absent from the map.
    pub async fn terminals_by_ids(&self, ids: &[String]) -> DbResult<HashMap<String, Terminal>> {
        let mut unique: Vec<String> = ids.to_vec();
        unique.sort();
        unique.dedup();

        let terminals: Vec<Terminal> = self.store.get_many(collections::TERMINALS, &unique).await?;
        Ok(terminals.into_iter().map(|t| (t.id.clone(), t)).collect())
    }

    // =========================================================================
    // Trips
    // =========================================================================

    /// Creates an in-progress trip and returns its document id.
    ///
    /// The caller must already have checked that the driver has no trip in
    /// progress.
    pub async fn start_trip(
        &self,
        driver_id: &str,
        start_terminal_id: &str,
        destination_terminal_id: &str,
        passengers: u32,
    ) -> DbResult<String> {
        validate_passenger_count(passengers)?;

        let now = Utc::now();
        let trip = Trip {
            id: String::new(),
            trip_id: generate_trip_number(now),
            driver_id: driver_id.to_string(),
            start_terminal: start_terminal_id.to_string(),
            destination_terminal: destination_terminal_id.to_string(),
            passengers,
            start_time: Some(now),
            arrival_time: None,
            status: TripStatus::InProgress,
            created_at: Some(now),
            updated_at: Some(now),
        };

        let id = self.store.add(collections::TRIPS, &trip).await?;

        info!(
            id = %id,
            trip_id = %trip.trip_id,
            driver_id = %driver_id,
            passengers = passengers,
            "Trip started"
        );
        Ok(id)
    }

    /// Marks a trip completed at `arrival_terminal_id`.
    ///
    /// Not idempotent-guarded: a second call overwrites `arrival_time` and
    /// succeeds.
    /// Marks a trip completed at `arrival_terminal_id` and returns the
    /// arrival time written.
    pub async fn complete_trip(
        &self,
        trip_id: &str,
        arrival_terminal_id: &str,
    ) -> DbResult<DateTime<Utc>> {
        // Stored precision, so callers can mirror the document exactly
        let arrived_at = Utc::now().trunc_subsecs(3);
        let now = timestamp::format(&arrived_at);
        self.store
            .update(
                collections::TRIPS,
                trip_id,
                json!({
                    "status": TripStatus::Completed,
                    "arrival_time": now,
                    "destination_terminal": arrival_terminal_id,
                    "updated_at": now,
                }),
            )
            .await?;

        info!(trip = %trip_id, arrival_terminal = %arrival_terminal_id, "Trip completed");
        Ok(arrived_at)
    }

    pub async fn cancel_trip(&self, trip_id: &str) -> DbResult<()> {
        self.set_status(trip_id, TripStatus::Cancelled).await?;
        info!(trip = %trip_id, "Trip cancelled");
        Ok(())
    }

    async fn set_status(&self, trip_id: &str, status: TripStatus) -> DbResult<()> {
        self.store
            .update(
                collections::TRIPS,
                trip_id,
                json!({
                    "status": status,
                    "updated_at": timestamp::format(&Utc::now()),
                }),
            )
            .await
    }

    /// The driver's in-progress trip, if any.
    ///
    /// If several exist (a consistency anomaly), the first in store order
    /// is returned.
    pub async fn current_trip_for(&self, driver_id: &str) -> DbResult<Option<Trip>> {
        let mut trips: Vec<Trip> = self
            .store
            .query(
                &Query::new(collections::TRIPS)
                    .eq("driver_id", driver_id)
                    .eq("status", TripStatus::InProgress),
            )
            .await?;

        if trips.len() > 1 {
            warn!(
                driver_id = %driver_id,
                count = trips.len(),
                "Driver has more than one trip in progress"
            );
        }

        Ok(if trips.is_empty() {
            None
        } else {
            Some(trips.swap_remove(0))
        })
    }

    /// Sets the passenger count of an existing trip.
    ///
    /// ## Errors
    /// `NotFound` when the trip does not exist.
    pub async fn update_passengers(&self, trip_id: &str, count: u32) -> DbResult<()> {
        validate_passenger_count(count)?;

        self.store
            .update(
                collections::TRIPS,
                trip_id,
                json!({
                    "passengers": count,
                    "updated_at": timestamp::format(&Utc::now()),
                }),
            )
            .await?;

        debug!(trip = %trip_id, passengers = count, "Passenger count updated");
        Ok(())
    }

    /// Completed trips, most recent arrival first.
    pub async fn completed_trips_for(&self, driver_id: &str, limit: u32) -> DbResult<Vec<Trip>> {
        self.store
            .query(
                &Query::new(collections::TRIPS)
                    .eq("driver_id", driver_id)
                    .eq("status", TripStatus::Completed)
                    .order_by("arrival_time", Direction::Desc)
                    .limit(limit),
            )
            .await
    }

    pub async fn trip_by_id(&self, trip_id: &str) -> DbResult<Option<Trip>> {
        self.store.get(collections::TRIPS, trip_id).await
    }

    /// Deletes a trip. Returns whether it existed.
    pub async fn delete_trip(&self, trip_id: &str) -> DbResult<bool> {
        let deleted = self.store.delete(collections::TRIPS, trip_id).await?;
        info!(trip = %trip_id, deleted, "Trip delete requested");
        Ok(deleted)
    }
}

/// Human-readable trip number: `TRIP-YYYYMMDD-XXXXXX`.
fn generate_trip_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    format!("TRIP-{}-{}", now.format("%Y%m%d"), suffix)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use fleet_core::CoreError;

    async fn setup() -> (DocumentStore, TripRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        (db.store(), db.trips())
    }

    async fn add_terminal(store: &DocumentStore, terminal_id: &str, qr: &str) -> String {
        let terminal = Terminal {
            id: String::new(),
            terminal_id: terminal_id.to_string(),
            name: format!("Terminal {}", terminal_id),
            qr_code: qr.to_string(),
            latitude: 14.6,
            longitude: 121.0,
            qr_code_url: String::new(),
            is_active: true,
            created_at: None,
            updated_at: None,
        };
        store.add(collections::TERMINALS, &terminal).await.unwrap()
    }

    #[tokio::test]
    async fn test_resolve_by_exact_qr_code() {
        let (store, repo) = setup().await;
        let id = add_terminal(&store, "T1", "ABC123").await;

        let terminal = repo.resolve_terminal_by_qr("ABC123").await.unwrap().unwrap();
        assert_eq!(terminal.id, id);
    }

    #[tokio::test]
    async fn test_resolve_prefixed_payload_falls_back_to_terminal_id() {
        let (store, repo) = setup().await;
        let id = add_terminal(&store, "T1", "SOMETHING-ELSE").await;

        let terminal = repo
            .resolve_terminal_by_qr("terminal_id:T1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(terminal.id, id);
        assert_eq!(terminal.terminal_id, "T1");
    }

    #[tokio::test]
    async fn test_resolve_prefixed_payload_by_document_id() {
        let (store, repo) = setup().await;
        let id = add_terminal(&store, "T1", "QR").await;

        let terminal = repo
            .resolve_terminal_by_qr(&format!("terminal_id:{}", id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(terminal.id, id);
    }

    #[tokio::test]
    async fn test_resolve_bare_terminal_id() {
        let (store, repo) = setup().await;
        let id = add_terminal(&store, "T7", "QR7").await;

        let terminal = repo.resolve_terminal_by_qr(" T7 ").await.unwrap().unwrap();
        assert_eq!(terminal.id, id);
    }

    #[tokio::test]
    async fn test_resolve_prefers_qr_code_match() {
        let (store, repo) = setup().await;
        // A terminal whose qr_code is literally another terminal's id
        let by_qr = add_terminal(&store, "T2", "T1").await;
        add_terminal(&store, "T1", "OTHER").await;

        let terminal = repo.resolve_terminal_by_qr("T1").await.unwrap().unwrap();
        assert_eq!(terminal.id, by_qr);
    }

    #[tokio::test]
    async fn test_resolve_unknown_and_blank() {
        let (store, repo) = setup().await;
        add_terminal(&store, "T1", "ABC123").await;

        assert!(repo.resolve_terminal_by_qr("nope").await.unwrap().is_none());

        let err = repo.resolve_terminal_by_qr("   ").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_start_and_current_trip() {
        let (_, repo) = setup().await;
        assert!(repo.current_trip_for("D1").await.unwrap().is_none());

        let id = repo.start_trip("D1", "a", "b", 4).await.unwrap();
        let trip = repo.current_trip_for("D1").await.unwrap().unwrap();

        assert_eq!(trip.id, id);
        assert_eq!(trip.status, TripStatus::InProgress);
        assert_eq!(trip.passengers, 4);
        assert!(trip.start_time.is_some());
        assert!(trip.arrival_time.is_none());
        assert!(trip.trip_id.starts_with("TRIP-"));
        assert_eq!(trip.trip_id.len(), "TRIP-20240102-ABCDEF".len());

        assert!(repo.current_trip_for("D2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_trip_rejects_too_many_passengers() {
        let (_, repo) = setup().await;
        let err = repo.start_trip("D1", "a", "b", 500).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_complete_trip() {
        let (_, repo) = setup().await;
        let id = repo.start_trip("D1", "a", "b", 2).await.unwrap();

        let arrived_at = repo.complete_trip(&id, "b").await.unwrap();

        let trip = repo.trip_by_id(&id).await.unwrap().unwrap();
        assert_eq!(trip.status, TripStatus::Completed);
        assert_eq!(trip.destination_terminal, "b");
        assert_eq!(trip.arrival_time, Some(arrived_at));
        assert_eq!(trip.updated_at, Some(arrived_at));
        assert!(repo.current_trip_for("D1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_complete_trip_twice_is_not_guarded() {
        let (_, repo) = setup().await;
        let id = repo.start_trip("D1", "a", "b", 2).await.unwrap();

        repo.complete_trip(&id, "b").await.unwrap();
        repo.complete_trip(&id, "b").await.unwrap();

        let trip = repo.trip_by_id(&id).await.unwrap().unwrap();
        assert_eq!(trip.status, TripStatus::Completed);
    }

    #[tokio::test]
    async fn test_complete_missing_trip() {
        let (_, repo) = setup().await;
        assert!(repo.complete_trip("missing", "b").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_cancel_trip() {
        let (_, repo) = setup().await;
        let id = repo.start_trip("D1", "a", "b", 1).await.unwrap();

        repo.cancel_trip(&id).await.unwrap();

        let trip = repo.trip_by_id(&id).await.unwrap().unwrap();
        assert_eq!(trip.status, TripStatus::Cancelled);
        assert!(repo.current_trip_for("D1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_passengers() {
        let (_, repo) = setup().await;
        let id = repo.start_trip("D1", "a", "b", 1).await.unwrap();

        repo.update_passengers(&id, 9).await.unwrap();
        assert_eq!(repo.trip_by_id(&id).await.unwrap().unwrap().passengers, 9);

        let err = repo.update_passengers("missing", 3).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_completed_history_order_and_limit() {
        let (store, repo) = setup().await;
        for (day, passengers) in [(3, 1), (1, 2), (2, 3)] {
            let id = repo.start_trip("D1", "a", "b", passengers).await.unwrap();
            repo.complete_trip(&id, "b").await.unwrap();
            store
                .update(
                    collections::TRIPS,
                    &id,
                    json!({ "arrival_time": format!("2024-01-0{}T12:00:00.000Z", day) }),
                )
                .await
                .unwrap();
        }
        // Still running, never listed
        repo.start_trip("D1", "a", "b", 9).await.unwrap();

        let history = repo.completed_trips_for("D1", 20).await.unwrap();
        let order: Vec<u32> = history.iter().map(|t| t.passengers).collect();
        assert_eq!(order, vec![1, 3, 2]);

        let limited = repo.completed_trips_for("D1", 2).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_terminals_by_ids() {
        let (store, repo) = setup().await;
        let a = add_terminal(&store, "T1", "A").await;
        let b = add_terminal(&store, "T2", "B").await;

        let map = repo
            .terminals_by_ids(&[a.clone(), b.clone(), a.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&a].terminal_id, "T1");
        assert_eq!(map[&b].terminal_id, "T2");
    }

    #[tokio::test]
    async fn test_delete_trip() {
        let (_, repo) = setup().await;
        let id = repo.start_trip("D1", "a", "b", 1).await.unwrap();

        assert!(repo.delete_trip(&id).await.unwrap());
        assert!(repo.trip_by_id(&id).await.unwrap().is_none());
        assert!(!repo.delete_trip(&id).await.unwrap());
    }
}
