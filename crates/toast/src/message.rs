use std::fmt;

use serde::{Deserialize, Serialize};

/// Visual weight of a toast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Default,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A visible toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastMessage {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Severity,
    pub created_at_ms: u64,
    /// Zero or negative means the toast stays until dismissed.
    pub duration_ms: i64,
}

impl ToastMessage {
    #[must_use]
    pub fn auto_dismisses(&self) -> bool {
        self.duration_ms > 0
    }

    /// Clock time at which the expiry timer fires, if there is one.
    #[must_use]
    pub fn expires_at_ms(&self) -> Option<u64> {
        self.auto_dismisses()
            .then(|| self.created_at_ms.saturating_add(self.duration_ms as u64))
    }
}

/// Caller-supplied content for a new toast.
///
/// A `None` duration uses the service's configured default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub duration_ms: Option<i64>,
}

impl ToastOptions {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: i64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Never auto-dismiss.
    #[must_use]
    pub fn sticky(self) -> Self {
        self.with_duration_ms(0)
    }
}
