//! The capability a record type needs to be managed by the gateway.

use serde::{Serialize, de::DeserializeOwned};

/// Primary key of a persisted entity.
pub type EntityId = i64;

/// A record type the gateway can store.
///
/// `KIND` namespaces the records of this type inside the store. `id` is
/// `None` until the store has assigned one.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: &'static str;

    fn id(&self) -> Option<EntityId>;

    fn set_id(&mut self, id: EntityId);
}

/// Implement [`Entity`] for a struct with an `id: Option<EntityId>` field.
///
/// ```ignore
/// givers_persistence::impl_entity!(Donation, "donation");
/// ```
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty, $kind:literal) => {
        impl $crate::Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<$crate::EntityId> {
                self.id
            }

            fn set_id(&mut self, id: $crate::EntityId) {
                self.id = Some(id);
            }
        }
    };
}

/// Backend-level row: an entity body tagged with its kind and key.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: String,
    pub id: EntityId,
    pub data: serde_json::Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}
