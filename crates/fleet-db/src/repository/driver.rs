//! # Driver Repository
//!
//! Lookups used by login and session restore, and profile writes.
//!
//! Duplicate emails are not prevented by the store; lookups return the
//! first match in store order.

use chrono::Utc;
use fleet_core::{collections, Driver};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::store::{DocumentStore, Query};

/// Repository for driver documents.
#[derive(Debug, Clone)]
pub struct DriverRepository {
    store: DocumentStore,
}

impl DriverRepository {
    pub fn new(store: DocumentStore) -> Self {
        DriverRepository { store }
    }

    /// Active driver with this email.
    pub async fn find_active_by_email(&self, email: &str) -> DbResult<Option<Driver>> {
        debug!(email = %email, "Looking up driver by email");
        self.store
            .first(
                Query::new(collections::DRIVERS)
                    .eq("email", email)
                    .eq("is_active", true),
            )
            .await
    }

    /// Active driver with this human-readable driver id.
    pub async fn find_active_by_driver_id(&self, driver_id: &str) -> DbResult<Option<Driver>> {
        debug!(driver_id = %driver_id, "Looking up driver by driver_id");
        self.store
            .first(
                Query::new(collections::DRIVERS)
                    .eq("driver_id", driver_id)
                    .eq("is_active", true),
            )
            .await
    }

    /// Driver by document id, active or not.
    pub async fn driver_by_id(&self, id: &str) -> DbResult<Option<Driver>> {
        self.store.get(collections::DRIVERS, id).await
    }

    /// Inserts a new driver and returns its document id.
    pub async fn insert(&self, driver: &Driver) -> DbResult<String> {
        let now = Utc::now();
        let mut doc = driver.clone();
        doc.created_at = Some(doc.created_at.unwrap_or(now));
        doc.updated_at = Some(now);

        let id = self.store.add(collections::DRIVERS, &doc).await?;
        info!(id = %id, driver_id = %driver.driver_id, "Driver inserted");
        Ok(id)
    }

    /// Writes the whole driver document under `driver.id`.
    pub async fn save(&self, driver: &Driver) -> DbResult<()> {
        if driver.id.is_empty() {
            return Err(DbError::not_found(collections::DRIVERS, "<empty id>"));
        }

        let mut doc = driver.clone();
        doc.updated_at = Some(Utc::now());
        self.store.set(collections::DRIVERS, &driver.id, &doc).await?;

        info!(id = %driver.id, driver_id = %driver.driver_id, "Driver saved");
        Ok(())
    }
}
