//! Backend trait behind the gateway.

use async_trait::async_trait;

use crate::{
    Result,
    entity::{EntityId, StoredRecord},
};

/// Persistence backend for entity records.
///
/// Works on JSON bodies keyed by `(kind, id)` so one handle can serve every
/// entity type; the typed layer lives in [`crate::Gateway`].
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Round-trip to the backing store.
    async fn ping(&self) -> Result<()>;

    async fn fetch(&self, kind: &str, id: EntityId) -> Result<Option<StoredRecord>>;

    /// All records of `kind`, ascending by id.
    async fn fetch_all(&self, kind: &str) -> Result<Vec<StoredRecord>>;

    /// Insert a record and return its id. `None` lets the store assign one.
    async fn insert(
        &self,
        kind: &str,
        id: Option<EntityId>,
        data: &serde_json::Value,
    ) -> Result<EntityId>;

    /// Replace the body of an existing record. Returns `false` if no record
    /// matched.
    async fn update(&self, kind: &str, id: EntityId, data: &serde_json::Value) -> Result<bool>;

    /// Returns `true` if a record was removed.
    async fn remove(&self, kind: &str, id: EntityId) -> Result<bool>;
}
