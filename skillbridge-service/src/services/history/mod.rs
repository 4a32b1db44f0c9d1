//! History persistence port.
//!
//! A history record is an arbitrary JSON object persisted verbatim. No schema
//! is enforced beyond "must be an object".

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryHistoryStore;
pub use mongo::MongoHistoryStore;

/// A persisted request/response record.
pub type HistoryRecord = serde_json::Map<String, serde_json::Value>;

/// Identifier field owned by the store. Never taken from a client record and
/// never returned by `fetch_all`.
pub const ID_FIELD: &str = "_id";

/// Remove store-owned fields from a record about to be persisted.
pub fn strip_store_fields(record: &mut HistoryRecord) {
    record.remove(ID_FIELD);
}

/// Error type for store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Record could not be encoded: {0}")]
    Serialization(String),

    #[error("Store operation failed: {0}")]
    Operation(String),
}

/// Document store backend for history records.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Backend name, for logs and readiness output.
    fn name(&self) -> &str;

    /// Persist a record and return its generated identifier.
    async fn persist(&self, record: HistoryRecord) -> Result<String, StoreError>;

    /// Every persisted record, in whatever order the backend yields them.
    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, StoreError>;

    /// Whether the backend is currently reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}
