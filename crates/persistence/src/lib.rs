//! Generic persistence gateway for givers.
//!
//! Any record type implementing [`Entity`] can be created, read, updated and
//! deleted through one [`Gateway`] handle. The gateway sits on top of an
//! [`EntityStore`] backend: SQLite via sqlx for real use, an in-memory map for
//! tests and demos.
//!
//! Read and delete paths degrade to sentinel values (`None`, empty `Vec`,
//! `false`) on failure; write paths always propagate errors. The typed
//! [`Gateway::lookup`] and [`Gateway::try_delete`] variants keep "not found"
//! and "store error" apart for callers that need the distinction.

pub mod entities;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;

pub use {
    entity::{Entity, EntityId, StoredRecord},
    error::{Error, Result},
    gateway::{Gateway, Lookup},
    store::EntityStore,
    store_memory::InMemoryStore,
    store_sqlite::SqliteStore,
};

/// Run database migrations for the persistence crate.
///
/// Creates the `entities` table and its index. Must run before a
/// [`SqliteStore`] built with [`SqliteStore::lazy`] is used.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
