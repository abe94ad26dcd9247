use thiserror::Error;

use crate::entity::EntityId;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: EntityId },

    #[error("{kind} has no id; it must be created before it can be updated")]
    MissingId { kind: &'static str },

    #[error("{kind} {id} already exists")]
    Conflict { kind: String, id: EntityId },

    #[error("store unavailable")]
    Unavailable,

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(kind: &'static str, id: EntityId) -> Self {
        Self::NotFound { kind, id }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
