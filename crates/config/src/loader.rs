use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::GiversConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["givers.toml", "givers.yaml", "givers.yml", "givers.json"];

/// Load config from the given path (any supported format).
///
/// `${VAR}` placeholders are expanded before parsing and `GIVERS_*`
/// overrides are applied afterwards.
pub fn load_config(path: &Path) -> Result<GiversConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let raw = substitute_env(&raw);
    let mut config = parse_config(&raw, path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./givers.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/givers/givers.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to defaults (plus env overrides) when nothing is found or the
/// file fails to load.
pub fn discover_and_load() -> GiversConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    let mut config = GiversConfig::default();
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    dirs.extend(config_dir());
    find_config_file_in(&dirs)
}

fn find_config_file_in(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.is_file())
}

/// Returns the user-global config directory (`~/.config/givers/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "givers").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the default SQLite database.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "givers")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Serialize `config` to TOML at `path`, creating parent directories.
pub fn save_config(config: &GiversConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(config)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Apply `GIVERS_*` environment overrides on top of a parsed config.
///
/// Unparseable numeric overrides are ignored with a warning.
pub fn apply_env_overrides(config: &mut GiversConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut GiversConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("GIVERS_DATABASE_URL").filter(|v| !v.is_empty()) {
        config.database.url = Some(url);
    }
    if let Some(raw) = lookup("GIVERS_TOAST_MAX_VISIBLE") {
        match raw.parse() {
            Ok(n) => config.toasts.max_visible = n,
            Err(e) => warn!(value = %raw, error = %e, "ignoring GIVERS_TOAST_MAX_VISIBLE"),
        }
    }
    if let Some(raw) = lookup("GIVERS_TOAST_DURATION_MS") {
        match raw.parse() {
            Ok(ms) => config.toasts.default_duration_ms = ms,
            Err(e) => warn!(value = %raw, error = %e, "ignoring GIVERS_TOAST_DURATION_MS"),
        }
    }
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> Result<GiversConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("givers.toml", "[toasts]\nmax_visible = 5\n")]
    #[case("givers.yaml", "toasts:\n  max_visible: 5\n")]
    #[case("givers.json", "{\"toasts\": {\"max_visible\": 5}}")]
    fn parses_every_format(#[case] name: &str, #[case] body: &str) {
        let config = parse_config(body, Path::new(name)).unwrap();
        assert_eq!(config.toasts.max_visible, 5);
        assert_eq!(config.toasts.default_duration_ms, 5000);
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = parse_config("", Path::new("givers.ini")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { ref extension } if extension == "ini"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("givers.toml")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("givers.toml");
        let mut config = GiversConfig::default();
        config.database.max_connections = 2;
        config.toasts.default_duration_ms = 0;
        save_config(&config, &path).unwrap();

        let loaded = parse_config(&std::fs::read_to_string(&path).unwrap(), &path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn finds_first_existing_file_in_search_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("givers.yaml"), "{}").unwrap();
        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            find_config_file_in(&dirs),
            Some(second.path().join("givers.yaml"))
        );

        std::fs::write(first.path().join("givers.json"), "{}").unwrap();
        assert_eq!(
            find_config_file_in(&dirs),
            Some(first.path().join("givers.json"))
        );
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = GiversConfig::default();
        apply_overrides_with(&mut config, |name| match name {
            "GIVERS_DATABASE_URL" => Some("sqlite::memory:".into()),
            "GIVERS_TOAST_MAX_VISIBLE" => Some("4".into()),
            "GIVERS_TOAST_DURATION_MS" => Some("-1".into()),
            _ => None,
        });
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.toasts.max_visible, 4);
        assert_eq!(config.toasts.default_duration_ms, -1);
    }

    #[test]
    fn bad_numeric_override_is_ignored() {
        let mut config = GiversConfig::default();
        apply_overrides_with(&mut config, |name| {
            (name == "GIVERS_TOAST_MAX_VISIBLE").then(|| "many".to_string())
        });
        assert_eq!(config.toasts.max_visible, 3);
    }
}
