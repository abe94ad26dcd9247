//! Typed CRUD over any [`Entity`] through one store handle.

use std::sync::Arc;

use {
    givers_config::DatabaseConfig,
    tracing::{error, info, warn},
};

use crate::{
    Error, Result,
    entity::{Entity, EntityId, StoredRecord},
    store::EntityStore,
    store_sqlite::SqliteStore,
};

/// Outcome of a single-record lookup.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    StoreError(Error),
}

impl<T> Lookup<T> {
    /// Collapse to the sentinel form: `None` for both absent and failed.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(entity) => Some(entity),
            Self::NotFound | Self::StoreError(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Entry point for entity persistence.
///
/// Reads and deletes never fail from the caller's point of view: errors are
/// logged and turned into `None`, an empty `Vec` or `false`. Creates and
/// updates return `Result` and always propagate store errors.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn EntityStore>,
}

impl Gateway {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Gateway over a lazily connected SQLite pool. No I/O happens until the
    /// first operation; migrations are the caller's job.
    pub fn sqlite(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteStore::lazy(config)?)))
    }

    /// Reach the backing store. Never fails; `false` means unreachable.
    pub async fn test_connection(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => {
                info!("connected to backing store");
                true
            },
            Err(e) => {
                error!(error = %e, "failed to connect to backing store");
                false
            },
        }
    }

    /// Look up one record, keeping "absent" and "failed" apart.
    pub async fn lookup<T: Entity>(&self, id: EntityId) -> Lookup<T> {
        let record = match self.store.fetch(T::KIND, id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Lookup::NotFound,
            Err(e) => return Lookup::StoreError(e),
        };
        match decode::<T>(record) {
            Ok(entity) => Lookup::Found(entity),
            Err(e) => Lookup::StoreError(e),
        }
    }

    /// `None` when the record is missing or the lookup failed.
    pub async fn get_by_id<T: Entity>(&self, id: EntityId) -> Option<T> {
        match self.lookup::<T>(id).await {
            Lookup::StoreError(e) => {
                error!(entity = T::KIND, id, error = %e, "error getting entity");
                None
            },
            other => other.found(),
        }
    }

    /// Every record of `T` in ascending id order, or the store error.
    pub async fn try_get_all<T: Entity>(&self) -> Result<Vec<T>> {
        self.store
            .fetch_all(T::KIND)
            .await?
            .into_iter()
            .map(decode::<T>)
            .collect()
    }

    /// Every record of `T`; empty on failure.
    pub async fn get_all<T: Entity>(&self) -> Vec<T> {
        self.try_get_all::<T>().await.unwrap_or_else(|e| {
            error!(entity = T::KIND, error = %e, "error getting all entities");
            Vec::new()
        })
    }

    /// Persist a new record and return it with its store-assigned id.
    pub async fn create<T: Entity>(&self, mut entity: T) -> Result<T> {
        let result: Result<EntityId> = async {
            let data = serde_json::to_value(&entity)?;
            self.store.insert(T::KIND, entity.id(), &data).await
        }
        .await;

        match result {
            Ok(id) => {
                entity.set_id(id);
                info!(entity = T::KIND, id, "created entity");
                Ok(entity)
            },
            Err(e) => {
                error!(entity = T::KIND, error = %e, "error creating entity");
                Err(e)
            },
        }
    }

    /// Persist changes to an existing record, keyed by the entity's own id.
    pub async fn update<T: Entity>(&self, entity: T) -> Result<T> {
        let result: Result<EntityId> = async {
            let id = entity.id().ok_or(Error::MissingId { kind: T::KIND })?;
            let data = serde_json::to_value(&entity)?;
            if self.store.update(T::KIND, id, &data).await? {
                Ok(id)
            } else {
                Err(Error::not_found(T::KIND, id))
            }
        }
        .await;

        match result {
            Ok(id) => {
                info!(entity = T::KIND, id, "updated entity");
                Ok(entity)
            },
            Err(e) => {
                error!(entity = T::KIND, error = %e, "error updating entity");
                Err(e)
            },
        }
    }

    /// Look up then remove. `Ok(false)` when there was nothing to remove.
    pub async fn try_delete<T: Entity>(&self, id: EntityId) -> Result<bool> {
        if self.store.fetch(T::KIND, id).await?.is_none() {
            return Ok(false);
        }
        let removed = self.store.remove(T::KIND, id).await?;
        if removed {
            info!(entity = T::KIND, id, "deleted entity");
        } else {
            warn!(entity = T::KIND, id, "entity vanished before it could be deleted");
        }
        Ok(removed)
    }

    /// `true` only if a record was found and removed; `false` when missing
    /// or on failure.
    pub async fn delete_by_id<T: Entity>(&self, id: EntityId) -> bool {
        self.try_delete::<T>(id).await.unwrap_or_else(|e| {
            error!(entity = T::KIND, id, error = %e, "error deleting entity");
            false
        })
    }
}

fn decode<T: Entity>(record: StoredRecord) -> Result<T> {
    let mut entity: T = serde_json::from_value(record.data)?;
    entity.set_id(record.id);
    Ok(entity)
}
