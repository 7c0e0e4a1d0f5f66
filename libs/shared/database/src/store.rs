use std::cmp::Ordering;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use shared_models::error::AppError;

/// Logical collections of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Institutions,
    Services,
    Collaborators,
    Bookings,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Institutions,
        Collection::Services,
        Collection::Collaborators,
        Collection::Bookings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Institutions => "institutions",
            Collection::Services => "services",
            Collection::Collaborators => "collaborators",
            Collection::Bookings => "bookings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    In,
    ArrayContains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Conjunction of filters plus an optional ordering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        });
        self
    }

    pub fn any_of<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::In,
            value: Value::Array(values.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            op: FilterOp::ArrayContains,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &Map<String, Value>) -> bool {
        self.filters.iter().all(|filter| {
            let field = doc.get(&filter.field);
            match filter.op {
                FilterOp::Eq => field == Some(&filter.value),
                FilterOp::In => match (&filter.value, field) {
                    (Value::Array(candidates), Some(value)) => candidates.contains(value),
                    _ => false,
                },
                FilterOp::ArrayContains => match field {
                    Some(Value::Array(items)) => items.contains(&filter.value),
                    _ => false,
                },
            }
        })
    }
}

/// Total order over JSON scalars used for in-process sorting. Missing fields sort first.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: &'static str, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Concurrent edits kept conflicting on {collection}/{id}")]
    Contention { collection: &'static str, id: String },
}

impl StoreError {
    pub fn not_found(collection: Collection, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.as_str(),
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StoreError::Serialization(_) | StoreError::InvalidDocument(_) => {
                AppError::Internal(err.to_string())
            }
            StoreError::Backend(msg) => AppError::Database(msg),
            StoreError::Contention { .. } => AppError::Conflict(err.to_string()),
        }
    }
}

/// Narrow document persistence contract.
///
/// Documents are JSON objects; `get` and `list` inject the document id as `id`.
/// `update` merges top-level fields and fails on a missing document, `delete`
/// of a missing document is a no-op. The array helpers are set semantics on a
/// single document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Value>, StoreError>;

    async fn count(&self, collection: Collection, query: &Query) -> Result<usize, StoreError>;

    async fn create(&self, collection: Collection, data: Value) -> Result<String, StoreError>;

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError>;

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    async fn array_union(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    async fn array_remove(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError>;
}

pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(StoreError::from)
}

/// Serializes a record for storage, dropping its `id` (the store owns it).
pub fn encode<T: Serialize>(record: &T) -> Result<Value, StoreError> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    Ok(value)
}

pub async fn fetch_one<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
) -> Result<Option<T>, StoreError> {
    store.get(collection, id).await?.map(decode).transpose()
}

pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: Collection,
    query: &Query,
) -> Result<Vec<T>, StoreError> {
    store
        .list(collection, query)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}
