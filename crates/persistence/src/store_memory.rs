//! In-memory store for tests and demos.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;

use crate::{
    Error, Result,
    entity::{EntityId, StoredRecord},
    store::EntityStore,
    store_sqlite::now_ms,
};

#[derive(Default)]
struct Inner {
    records: BTreeMap<(String, EntityId), StoredRecord>,
    /// Highest id handed out or stored per kind.
    sequences: HashMap<String, EntityId>,
}

/// Store backed by a `BTreeMap`. No persistence.
///
/// Ids follow the same rules as [`crate::SqliteStore`]: each kind has its
/// own id space and ids are never reused.
///
/// [`InMemoryStore::set_online`] simulates an unreachable backend: while
/// offline every operation fails with [`Error::Unavailable`].
pub struct InMemoryStore {
    inner: Mutex<Inner>,
    online: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            online: AtomicBool::new(true),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Unavailable)
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        self.check_online()
    }

    async fn fetch(&self, kind: &str, id: EntityId) -> Result<Option<StoredRecord>> {
        self.check_online()?;
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.records.get(&(kind.to_string(), id)).cloned())
    }

    async fn fetch_all(&self, kind: &str) -> Result<Vec<StoredRecord>> {
        self.check_online()?;
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .records
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        kind: &str,
        id: Option<EntityId>,
        data: &serde_json::Value,
    ) -> Result<EntityId> {
        self.check_online()?;
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let last_id = inner.sequences.get(kind).copied().unwrap_or(0);
        let id = match id {
            Some(id) => {
                if inner.records.contains_key(&(kind.to_string(), id)) {
                    return Err(Error::Conflict {
                        kind: kind.to_string(),
                        id,
                    });
                }
                id
            },
            None => last_id + 1,
        };
        inner.sequences.insert(kind.to_string(), last_id.max(id));

        let now = now_ms();
        inner.records.insert((kind.to_string(), id), StoredRecord {
            kind: kind.to_string(),
            id,
            data: data.clone(),
            created_at_ms: now,
            updated_at_ms: now,
        });
        Ok(id)
    }

    async fn update(&self, kind: &str, id: EntityId, data: &serde_json::Value) -> Result<bool> {
        self.check_online()?;
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(record) = inner.records.get_mut(&(kind.to_string(), id)) else {
            return Ok(false);
        };
        record.data = data.clone();
        record.updated_at_ms = now_ms();
        Ok(true)
    }

    async fn remove(&self, kind: &str, id: EntityId) -> Result<bool> {
        self.check_online()?;
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.records.remove(&(kind.to_string(), id)).is_some())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[tokio::test]
    async fn assigns_sequential_ids_per_kind() {
        let store = InMemoryStore::new();
        let a = store.insert("donation", None, &json!({"n": 1})).await.unwrap();
        let b = store.insert("report", None, &json!({"n": 2})).await.unwrap();
        let c = store.insert("donation", None, &json!({"n": 3})).await.unwrap();
        assert_eq!((a, b, c), (1, 1, 2));
    }

    #[tokio::test]
    async fn removed_ids_are_not_reused() {
        let store = InMemoryStore::new();
        store.insert("donation", None, &json!({})).await.unwrap();
        let second = store.insert("donation", None, &json!({})).await.unwrap();
        assert!(store.remove("donation", second).await.unwrap());
        assert_eq!(store.insert("donation", None, &json!({})).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn explicit_id_advances_counter() {
        let store = InMemoryStore::new();
        store.insert("donation", Some(10), &json!({})).await.unwrap();
        let next = store.insert("donation", None, &json!({})).await.unwrap();
        assert_eq!(next, 11);
    }

    #[tokio::test]
    async fn duplicate_explicit_id_conflicts() {
        let store = InMemoryStore::new();
        store.insert("donation", Some(3), &json!({})).await.unwrap();
        let err = store.insert("donation", Some(3), &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { id: 3, .. }));
    }

    #[tokio::test]
    async fn fetch_all_is_scoped_to_kind() {
        let store = InMemoryStore::new();
        store.insert("donation", None, &json!({"a": 1})).await.unwrap();
        store.insert("report", None, &json!({"b": 2})).await.unwrap();
        store.insert("donation", None, &json!({"c": 3})).await.unwrap();

        let donations = store.fetch_all("donation").await.unwrap();
        assert_eq!(donations.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        let report = store.fetch("report", 1).await.unwrap().unwrap();
        assert_eq!(report.data, json!({"b": 2}));
        assert!(store.fetch("report", 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_and_remove_report_misses() {
        let store = InMemoryStore::new();
        assert!(!store.update("donation", 1, &json!({})).await.unwrap());
        assert!(!store.remove("donation", 1).await.unwrap());

        let id = store.insert("donation", None, &json!({"v": 1})).await.unwrap();
        assert!(store.update("donation", id, &json!({"v": 2})).await.unwrap());
        let record = store.fetch("donation", id).await.unwrap().unwrap();
        assert_eq!(record.data, json!({"v": 2}));
        assert!(store.remove("donation", id).await.unwrap());
    }

    #[tokio::test]
    async fn offline_store_fails_everything() {
        let store = InMemoryStore::new();
        store.set_online(false);
        assert!(matches!(store.ping().await, Err(Error::Unavailable)));
        assert!(store.fetch_all("donation").await.is_err());
        assert!(store.insert("donation", None, &json!({})).await.is_err());

        store.set_online(true);
        assert!(store.ping().await.is_ok());
    }
}
