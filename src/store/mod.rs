//! Document store abstraction.
//!
//! Every persisted record lives in a named collection as a JSON object keyed
//! by a string id. Backends: [`postgres::PgStore`] (JSONB table) and
//! [`memory::MemoryStore`] (in-process, used by tests and `HOSTEL_STORE=memory`).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A stored JSON object.
pub type Document = serde_json::Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("document in {collection} is not a JSON object")]
    NotAnObject { collection: String },
}

/// Result of a conditional merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    Missing,
    Mismatch,
}

/// Equality filters, an optional inclusive range on one string field and an
/// optional ordering.
///
/// Range bounds and ordering compare as strings, which is correct for the ISO
/// dates and RFC 3339 timestamps every collection stores.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub range: Option<RangeFilter>,
    pub order: Option<(String, Order)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct RangeFilter {
    pub field: String,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn between(mut self, field: &str, from: Option<String>, to: Option<String>) -> Self {
        self.range = Some(RangeFilter {
            field: field.to_string(),
            from,
            to,
        });
        self
    }

    pub fn order_by(mut self, field: &str, order: Order) -> Self {
        self.order = Some((field.to_string(), order));
        self
    }

    /// Sort fetched rows by the ordering field; missing values sort first.
    pub fn sort(&self, rows: &mut [(String, Document)]) {
        let Some((field, order)) = &self.order else {
            return;
        };
        rows.sort_by(|(_, a), (_, b)| {
            let a = a.get(field).and_then(Value::as_str).unwrap_or("");
            let b = b.get(field).and_then(Value::as_str).unwrap_or("");
            match order {
                Order::Asc => a.cmp(b),
                Order::Desc => b.cmp(a),
            }
        });
    }

    /// In-process evaluation, shared by the memory backend.
    pub fn matches(&self, doc: &Document) -> bool {
        let eq_ok = self
            .filters
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected));
        if !eq_ok {
            return false;
        }

        match &self.range {
            None => true,
            Some(range) => {
                let Some(value) = doc.get(&range.field).and_then(Value::as_str) else {
                    return false;
                };
                let above = range.from.as_deref().map_or(true, |from| value >= from);
                let below = range.to.as_deref().map_or(true, |to| value <= to);
                above && below
            }
        }
    }
}

/// Collection-scoped access to the external document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<(), StoreError>;

    /// Shallow-merge `patch` into an existing document. Returns `false` when
    /// the document does not exist.
    async fn merge(&self, collection: &str, id: &str, patch: Document)
        -> Result<bool, StoreError>;

    /// Store under a freshly generated id and return it.
    async fn insert(&self, collection: &str, doc: Document) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.set(collection, &id, doc).await?;
        Ok(id)
    }

    /// Merge only if `doc[field] == expected`, atomically.
    async fn merge_if(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        expected: &Value,
        patch: Document,
    ) -> Result<MergeOutcome, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    /// All matching documents as `(id, document)` pairs, in the query's order
    /// or by id when none is given.
    async fn query(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<(String, Document)>, StoreError>;

    async fn count(&self, collection: &str, query: &Query) -> Result<u64, StoreError> {
        Ok(self.query(collection, query).await?.len() as u64)
    }
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject {
            collection: std::any::type_name::<T>().to_string(),
        }),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}
