//! Configuration validation.
//!
//! Checks TOML config text for syntax errors, unknown or misspelled keys,
//! type errors and values that are legal but probably not intended.

use std::{collections::HashMap, fmt, path::Path};

use crate::schema::GiversConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// One of "syntax", "unknown-field", "type-error", "value".
    pub category: &'static str,
    /// Dotted path, e.g. "toasts.max_visible".
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} [{}] {}", self.severity, self.category, self.message)
        } else {
            write!(
                f,
                "{} [{}] {}: {}",
                self.severity, self.category, self.path, self.message
            )
        }
    }
}

/// Result of validating a configuration file.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Known keys per table, mirroring `schema.rs`.
fn known_sections() -> HashMap<&'static str, &'static [&'static str]> {
    HashMap::from([
        (
            "database",
            &[
                "url",
                "max_connections",
                "acquire_timeout_secs",
                "create_if_missing",
            ][..],
        ),
        ("toasts", &["max_visible", "default_duration_ms"][..]),
    ])
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}

fn unknown_field(path: String, key: &str, candidates: &[&str]) -> Diagnostic {
    let message = match suggest(key, candidates, 3) {
        Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
        None => "unknown field".to_string(),
    };
    Diagnostic {
        severity: Severity::Error,
        category: "unknown-field",
        path,
        message,
    }
}

/// Validate a config file. Non-TOML files are checked for parseability only.
#[must_use]
pub fn validate(path: &Path) -> ValidationResult {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message: format!("failed to read config file: {e}"),
                }],
                config_path: Some(path.to_path_buf()),
            };
        },
    };

    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    let mut result = if is_toml {
        validate_toml_str(&content)
    } else {
        match crate::loader::parse_config(&content, path) {
            Ok(config) => {
                let mut diagnostics = Vec::new();
                check_values(&config, &mut diagnostics);
                ValidationResult {
                    diagnostics,
                    config_path: None,
                }
            },
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "type-error",
                    path: String::new(),
                    message: e.to_string(),
                }],
                config_path: None,
            },
        }
    };
    result.config_path = Some(path.to_path_buf());
    result
}

/// Validate TOML text without touching the file system.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&value, &mut diagnostics);

    match toml::from_str::<GiversConfig>(toml_str) {
        Ok(config) => check_values(&config, &mut diagnostics),
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(value: &toml::Value, diagnostics: &mut Vec<Diagnostic>) {
    let Some(root) = value.as_table() else {
        return;
    };
    let sections = known_sections();
    let section_names: Vec<&str> = sections.keys().copied().collect();

    for (key, child) in root {
        let Some(fields) = sections.get(key.as_str()) else {
            diagnostics.push(unknown_field(key.clone(), key, &section_names));
            continue;
        };
        let Some(table) = child.as_table() else {
            continue;
        };
        for field in table.keys() {
            if !fields.contains(&field.as_str()) {
                diagnostics.push(unknown_field(format!("{key}.{field}"), field, fields));
            }
        }
    }
}

fn check_values(config: &GiversConfig, diagnostics: &mut Vec<Diagnostic>) {
    if config.toasts.max_visible == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "value",
            path: "toasts.max_visible".into(),
            message: "must be at least 1".into(),
        });
    } else if config.toasts.max_visible > 3 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "value",
            path: "toasts.max_visible".into(),
            message: format!(
                "{} toasts may overflow small screens; 3 is the default",
                config.toasts.max_visible
            ),
        });
    }

    if config.toasts.default_duration_ms <= 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "value",
            path: "toasts.default_duration_ms".into(),
            message: "auto-dismiss is disabled for toasts without an explicit duration".into(),
        });
    }

    if config.database.max_connections == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "value",
            path: "database.max_connections".into(),
            message: "must be at least 1".into(),
        });
    }

    if let Some(url) = &config.database.url
        && !url.starts_with("sqlite:")
    {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "value",
            path: "database.url".into(),
            message: "only sqlite: URLs are supported by the bundled store".into(),
        });
    }
}
