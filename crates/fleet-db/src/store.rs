//! # Document Store
//!
//! Collection/document CRUD and simple queries over SQLite.
//!
//! ## Storage Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         documents table                                 │
//! │                                                                         │
//! │  collection │ id (uuid)  │ data                                        │
//! │  ───────────┼────────────┼──────────────────────────────────────────── │
//! │  terminals  │ 6f1c…      │ {"terminal_id":"T1","qr_code":"ABC123",…}   │
//! │  trips      │ 0b9e…      │ {"driver_id":"D1","status":"in_progress",…} │
//! │                                                                         │
//! │  The document id lives in its own column. It is stripped from the      │
//! │  body on write and injected into the `id` field on read.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Queries
//! ```text
//! Query::new("trips")
//!     .eq("driver_id", "D1")              json_extract(data,'$.driver_id') = ?
//!     .eq("status", TripStatus::Completed)
//!     .order_by("arrival_time", Desc)     ORDER BY json_extract(...) DESC
//!     .limit(20)                          LIMIT ?
//! ```
//!
//! Results come back in insertion order unless ordered. Every document is
//! decoded into its typed struct at this boundary; a document that does not
//! fit surfaces [`DbError::Deserialization`] instead of being skipped.

use chrono::{DateTime, Utc};
use fleet_core::{timestamp, PaymentStatus, TripStatus};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

// =============================================================================
// Query Model
// =============================================================================

/// A scalar a document field can be compared with.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Real(f64),
    Bool(bool),
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Text(v.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Real(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// Timestamps compare in their stored text encoding.
impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Text(timestamp::format(&v))
    }
}

impl From<TripStatus> for FieldValue {
    fn from(v: TripStatus) -> Self {
        FieldValue::Text(v.as_str().to_string())
    }
}

impl From<PaymentStatus> for FieldValue {
    fn from(v: PaymentStatus) -> Self {
        FieldValue::Text(v.as_str().to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    fn sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => " = ",
            FilterOp::Gte => " >= ",
            FilterOp::Lte => " <= ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: FieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A filtered, optionally ordered and limited read of one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new(collection: impl Into<String>) -> Self {
        Query {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn eq(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn gte(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filter(field, FilterOp::Gte, value)
    }

    pub fn lte(self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filter(field, FilterOp::Lte, value)
    }

    fn filter(mut self, field: &str, op: FilterOp, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =============================================================================
// Document Store
// =============================================================================

/// Handle to the document collections.
///
/// Cheap to clone (wraps the pool).
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        DocumentStore { pool }
    }

    /// Fetches one document by id.
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> DbResult<Option<T>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(data,)| decode(collection, id, &data)).transpose()
    }

    /// Fetches the documents with the given ids, skipping missing ones.
    pub async fn get_many<T: DeserializeOwned>(
        &self,
        collection: &str,
        ids: &[String],
    ) -> DbResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(collection.to_string());
        qb.push(" AND id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") ORDER BY rowid ASC");

        let rows = qb
            .build_query_as::<(String, String)>()
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|(id, data)| decode(collection, id, data))
            .collect()
    }

    /// Inserts a document under a fresh uuid and returns the id.
    pub async fn add<T: Serialize>(&self, collection: &str, doc: &T) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let data = encode(doc)?;
        let now = timestamp::format(&Utc::now());

        sqlx::query(
            "INSERT INTO documents (collection, id, data, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
        )
        .bind(collection)
        .bind(&id)
        .bind(&data)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(collection = %collection, id = %id, "Document added");
        Ok(id)
    }

    /// Writes the whole document, creating it if absent.
    pub async fn set<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> DbResult<()> {
        let data = encode(doc)?;
        let now = timestamp::format(&Utc::now());

        sqlx::query(
            "INSERT INTO documents (collection, id, data, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4) \
             ON CONFLICT (collection, id) DO UPDATE SET \
                 data = excluded.data, \
                 updated_at = excluded.updated_at",
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        debug!(collection = %collection, id = %id, "Document set");
        Ok(())
    }

    /// Merges `fields` into an existing document.
    ///
    /// Uses JSON merge-patch semantics: a `null` value removes the field.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] when the document does not exist.
    pub async fn update(&self, collection: &str, id: &str, fields: Value) -> DbResult<()> {
        let mut fields = fields;
        let obj = fields
            .as_object_mut()
            .ok_or_else(|| DbError::Serialization("update fields must be a JSON object".into()))?;
        obj.remove("id");
        let patch = fields.to_string();
        let now = timestamp::format(&Utc::now());

        let result = sqlx::query(
            "UPDATE documents SET data = json_patch(data, ?1), updated_at = ?2 \
             WHERE collection = ?3 AND id = ?4",
        )
        .bind(&patch)
        .bind(&now)
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(collection, id));
        }

        debug!(collection = %collection, id = %id, "Document updated");
        Ok(())
    }

    /// Deletes a document. Returns whether it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Runs a query and decodes every match.
    pub async fn query<T: DeserializeOwned>(&self, query: &Query) -> DbResult<Vec<T>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, data FROM documents WHERE collection = ");
        qb.push_bind(query.collection.clone());

        for filter in &query.filters {
            qb.push(" AND ");
            push_field(&mut qb, &filter.field)?;
            qb.push(filter.op.sql());
            push_value(&mut qb, &filter.value);
        }

        match &query.order_by {
            Some((field, direction)) => {
                qb.push(" ORDER BY ");
                push_field(&mut qb, field)?;
                qb.push(match direction {
                    Direction::Asc => " ASC",
                    Direction::Desc => " DESC",
                });
                qb.push(", rowid ASC");
            }
            None => {
                qb.push(" ORDER BY rowid ASC");
            }
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }

        let rows = qb
            .build_query_as::<(String, String)>()
            .fetch_all(&self.pool)
            .await?;

        debug!(
            collection = %query.collection,
            filters = query.filters.len(),
            count = rows.len(),
            "Query executed"
        );

        rows.iter()
            .map(|(id, data)| decode(&query.collection, id, data))
            .collect()
    }

    /// Runs a query and returns its first match.
    pub async fn first<T: DeserializeOwned>(&self, query: Query) -> DbResult<Option<T>> {
        let mut docs = self.query(&query.limit(1)).await?;
        Ok(if docs.is_empty() {
            None
        } else {
            Some(docs.swap_remove(0))
        })
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Serializes a document body, dropping its `id` field.
fn encode<T: Serialize>(doc: &T) -> DbResult<String> {
    let mut value = serde_json::to_value(doc).map_err(|e| DbError::Serialization(e.to_string()))?;
    value
        .as_object_mut()
        .ok_or_else(|| DbError::Serialization("document must be a JSON object".into()))?
        .remove("id");
    serde_json::to_string(&value).map_err(|e| DbError::Serialization(e.to_string()))
}

/// Decodes a stored body into `T`, injecting the document id.
fn decode<T: DeserializeOwned>(collection: &str, id: &str, data: &str) -> DbResult<T> {
    let invalid = |reason: String| {
        warn!(collection = %collection, id = %id, reason = %reason, "Rejected malformed document");
        DbError::Deserialization {
            collection: collection.to_string(),
            id: id.to_string(),
            reason,
        }
    };

    let mut value: Value = serde_json::from_str(data).map_err(|e| invalid(e.to_string()))?;
    match value.as_object_mut() {
        Some(obj) => {
            obj.insert("id".to_string(), Value::String(id.to_string()));
        }
        None => return Err(invalid("document body is not an object".to_string())),
    }

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Pushes the SQL expression for a document field.
///
/// Field names are inlined (not bound) so SQLite can match them against
/// the expression indexes; they are restricted to `[A-Za-z0-9_]`.
fn push_field(qb: &mut QueryBuilder<Sqlite>, field: &str) -> DbResult<()> {
    if field == "id" {
        qb.push("id");
        return Ok(());
    }
    let valid = !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(DbError::Internal(format!("invalid field name: {:?}", field)));
    }
    qb.push("json_extract(data, '$.");
    qb.push(field);
    qb.push("')");
    Ok(())
}

fn push_value(qb: &mut QueryBuilder<Sqlite>, value: &FieldValue) {
    match value {
        FieldValue::Text(v) => qb.push_bind(v.clone()),
        FieldValue::Int(v) => qb.push_bind(*v),
        FieldValue::Real(v) => qb.push_bind(*v),
        // JSON booleans extract as 0 / 1
        FieldValue::Bool(v) => qb.push_bind(i64::from(*v)),
    };
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use fleet_core::{collections, Terminal, Trip};
    use serde_json::json;

    async fn store() -> DocumentStore {
        Database::new(DbConfig::in_memory()).await.unwrap().store()
    }

    fn terminal(terminal_id: &str, qr: &str) -> Terminal {
        Terminal {
            id: String::new(),
            terminal_id: terminal_id.to_string(),
            name: format!("Terminal {}", terminal_id),
            qr_code: qr.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            qr_code_url: String::new(),
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_add_get_injects_id() {
        let store = store().await;
        let id = store
            .add(collections::TERMINALS, &terminal("T1", "ABC"))
            .await
            .unwrap();

        let got: Terminal = store.get(collections::TERMINALS, &id).await.unwrap().unwrap();
        assert_eq!(got.id, id);
        assert_eq!(got.terminal_id, "T1");

        let missing: Option<Terminal> = store.get(collections::TERMINALS, "nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_id_not_stored_in_body() {
        let store = store().await;
        let mut t = terminal("T1", "ABC");
        t.id = "should-not-persist".to_string();
        let id = store.add(collections::TERMINALS, &t).await.unwrap();

        let (data,): (String,) = sqlx::query_as("SELECT data FROM documents WHERE id = ?1")
            .bind(&id)
            .fetch_one(&store.pool)
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&data).unwrap();
        assert!(body.get("id").is_none());
    }

    #[tokio::test]
    async fn test_query_filters_order_limit() {
        let store = store().await;
        for (i, status) in ["completed", "in_progress", "completed", "completed"]
            .iter()
            .enumerate()
        {
            store
                .add(
                    collections::TRIPS,
                    &json!({
                        "driver_id": "D1",
                        "start_terminal": "a",
                        "destination_terminal": "b",
                        "passengers": i,
                        "status": status,
                        "arrival_time": format!("2024-01-0{}T10:00:00.000Z", i + 1),
                    }),
                )
                .await
                .unwrap();
        }

        let trips: Vec<Trip> = store
            .query(
                &Query::new(collections::TRIPS)
                    .eq("driver_id", "D1")
                    .eq("status", TripStatus::Completed)
                    .order_by("arrival_time", Direction::Desc)
                    .limit(2),
            )
            .await
            .unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].passengers, 3);
        assert_eq!(trips[1].passengers, 2);

        let in_range: Vec<Trip> = store
            .query(
                &Query::new(collections::TRIPS)
                    .gte("arrival_time", "2024-01-02T00:00:00.000Z")
                    .lte("arrival_time", "2024-01-03T23:59:59.999Z"),
            )
            .await
            .unwrap();
        let passengers: Vec<u32> = in_range.iter().map(|t| t.passengers).collect();
        assert_eq!(passengers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_bool_and_number_filters() {
        let store = store().await;
        let mut inactive = terminal("T2", "X");
        inactive.is_active = false;
        store.add(collections::TERMINALS, &terminal("T1", "A")).await.unwrap();
        store.add(collections::TERMINALS, &inactive).await.unwrap();

        let active: Vec<Terminal> = store
            .query(&Query::new(collections::TERMINALS).eq("is_active", true))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].terminal_id, "T1");
    }

    #[tokio::test]
    async fn test_payment_status_filter() {
        let store = store().await;
        for (month, status) in [(1, "pending"), (2, "paid")] {
            store
                .add(
                    collections::DRIVER_EARNINGS,
                    &json!({ "driver_id": "D1", "year": 2024, "month": month, "payment_status": status }),
                )
                .await
                .unwrap();
        }

        let paid: Vec<fleet_core::DriverEarnings> = store
            .query(&Query::new(collections::DRIVER_EARNINGS).eq("payment_status", PaymentStatus::Paid))
            .await
            .unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].month, 2);
    }

    #[tokio::test]
    async fn test_update_merges_and_requires_existing() {
        let store = store().await;
        let id = store
            .add(collections::TERMINALS, &terminal("T1", "A"))
            .await
            .unwrap();

        store
            .update(collections::TERMINALS, &id, json!({ "name": "Renamed" }))
            .await
            .unwrap();
        let got: Terminal = store.get(collections::TERMINALS, &id).await.unwrap().unwrap();
        assert_eq!(got.name, "Renamed");
        assert_eq!(got.qr_code, "A");

        let err = store
            .update(collections::TERMINALS, "missing", json!({ "name": "x" }))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_set_upserts() {
        let store = store().await;
        store
            .set(collections::TERMINALS, "fixed", &terminal("T1", "A"))
            .await
            .unwrap();
        store
            .set(collections::TERMINALS, "fixed", &terminal("T1", "B"))
            .await
            .unwrap();

        let all: Vec<Terminal> = store
            .query(&Query::new(collections::TERMINALS))
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].qr_code, "B");
        assert_eq!(all[0].id, "fixed");
    }

    #[tokio::test]
    async fn test_malformed_document_surfaces_error() {
        let store = store().await;
        store
            .set(
                collections::TRIPS,
                "bad",
                &json!({ "driver_id": "D1", "passengers": "four", "status": "in_progress" }),
            )
            .await
            .unwrap();

        let err = store
            .get::<Trip>(collections::TRIPS, "bad")
            .await
            .unwrap_err();
        match err {
            DbError::Deserialization { collection, id, .. } => {
                assert_eq!(collection, "trips");
                assert_eq!(id, "bad");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_many_and_delete() {
        let store = store().await;
        let a = store.add(collections::TERMINALS, &terminal("T1", "A")).await.unwrap();
        let b = store.add(collections::TERMINALS, &terminal("T2", "B")).await.unwrap();

        let got: Vec<Terminal> = store
            .get_many(collections::TERMINALS, &[b.clone(), "missing".to_string(), a.clone()])
            .await
            .unwrap();
        assert_eq!(got.len(), 2);

        assert!(store.delete(collections::TERMINALS, &a).await.unwrap());
        assert!(!store.delete(collections::TERMINALS, &a).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_bad_field_names() {
        let store = store().await;
        let err = store
            .query::<Terminal>(&Query::new(collections::TERMINALS).eq("name') OR 1=1 --", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Internal(_)));
    }
}
