//! Config schema types.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GiversConfig {
    pub database: DatabaseConfig,
    pub toasts: ToastConfig,
}

/// Backing store settings for the persistence gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL. When unset, `sqlite:<data_dir>/givers.db?mode=rwc`
    /// is used.
    pub url: Option<String>,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection before the operation fails.
    pub acquire_timeout_secs: u64,
    /// Create the database file on first connect.
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            acquire_timeout_secs: 30,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    /// The configured URL, or the default SQLite file under the data dir.
    #[must_use]
    pub fn resolved_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "sqlite:{}?mode=rwc",
                crate::loader::data_dir().join("givers.db").display()
            ),
        }
    }
}

/// Toast notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    /// Maximum number of toasts visible at once. Defaults to 3.
    pub max_visible: usize,
    /// Time-to-live for toasts shown without an explicit duration.
    /// Zero or negative disables auto-dismiss.
    pub default_duration_ms: i64,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            max_visible: 3,
            default_duration_ms: 5000,
        }
    }
}
