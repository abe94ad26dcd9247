//! SQLite-backed entity store using sqlx.

use std::{
    str::FromStr,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use {
    async_trait::async_trait,
    givers_config::DatabaseConfig,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
};

use crate::{
    Error, Result,
    entity::{EntityId, StoredRecord},
    store::EntityStore,
};

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// SQLite-backed persistence for every entity kind, in a single `entities`
/// table keyed by `(kind, id)`. Ids are assigned per kind from
/// `entity_sequences`.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Build a store whose pool connects on first use.
    ///
    /// Only the URL is validated here. Call [`crate::run_migrations`] on
    /// [`SqliteStore::pool`] before the first query.
    pub fn lazy(config: &DatabaseConfig) -> Result<Self> {
        let url = config.resolved_url();
        let options =
            SqliteConnectOptions::from_str(&url)?.create_if_missing(config.create_if_missing);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy_with(options);
        debug!(url = %url, "configured lazy sqlite pool");
        Ok(Self { pool })
    }

    /// Build a lazy store and run migrations, which opens the first
    /// connection.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let store = Self::lazy(config)?;
        crate::run_migrations(&store.pool).await?;
        Ok(store)
    }

    /// Create a store using an existing pool (migrations must already be run).
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct EntityRow {
    id: i64,
    kind: String,
    data: String,
    created_at_ms: i64,
    updated_at_ms: i64,
}

fn is_duplicate_key(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => {
            e.is_unique_violation() || e.message().contains("UNIQUE constraint failed")
        },
        _ => false,
    }
}

impl TryFrom<EntityRow> for StoredRecord {
    type Error = serde_json::Error;

    fn try_from(r: EntityRow) -> std::result::Result<Self, Self::Error> {
        Ok(Self {
            kind: r.kind,
            id: r.id,
            data: serde_json::from_str(&r.data)?,
            created_at_ms: r.created_at_ms as u64,
            updated_at_ms: r.updated_at_ms as u64,
        })
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch(&self, kind: &str, id: EntityId) -> Result<Option<StoredRecord>> {
        let row = sqlx::query_as::<_, EntityRow>(
            "SELECT id, kind, data, created_at_ms, updated_at_ms FROM entities WHERE kind = ? AND id = ?",
        )
        .bind(kind)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(StoredRecord::try_from).transpose()?)
    }

    async fn fetch_all(&self, kind: &str) -> Result<Vec<StoredRecord>> {
        let rows = sqlx::query_as::<_, EntityRow>(
            "SELECT id, kind, data, created_at_ms, updated_at_ms FROM entities WHERE kind = ? ORDER BY id",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(StoredRecord::try_from(row)?);
        }
        Ok(records)
    }

    async fn insert(
        &self,
        kind: &str,
        id: Option<EntityId>,
        data: &serde_json::Value,
    ) -> Result<EntityId> {
        let data = serde_json::to_string(data)?;
        let now = now_ms() as i64;
        let mut tx = self.pool.begin().await?;

        let id = match id {
            Some(id) => {
                sqlx::query(
                    "INSERT INTO entity_sequences (kind, last_id) VALUES (?, ?)
                     ON CONFLICT(kind) DO UPDATE SET last_id = MAX(last_id, excluded.last_id)",
                )
                .bind(kind)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                id
            },
            None => {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO entity_sequences (kind, last_id) VALUES (?, 1)
                     ON CONFLICT(kind) DO UPDATE SET last_id = last_id + 1
                     RETURNING last_id",
                )
                .bind(kind)
                .fetch_one(&mut *tx)
                .await?
            },
        };

        let inserted = sqlx::query(
            "INSERT INTO entities (kind, id, data, created_at_ms, updated_at_ms) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(kind)
        .bind(id)
        .bind(data)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await;

        // Dropping `tx` on the error paths rolls back the sequence bump.
        match inserted {
            Ok(_) => {},
            Err(e) if is_duplicate_key(&e) => {
                return Err(Error::Conflict {
                    kind: kind.to_string(),
                    id,
                });
            },
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;
        Ok(id)
    }

    async fn update(&self, kind: &str, id: EntityId, data: &serde_json::Value) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE entities SET data = ?, updated_at_ms = ? WHERE kind = ? AND id = ?",
        )
        .bind(serde_json::to_string(data)?)
        .bind(now_ms() as i64)
        .bind(kind)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, kind: &str, id: EntityId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entities WHERE kind = ? AND id = ?")
            .bind(kind)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
