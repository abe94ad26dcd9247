//! Configuration loading, validation and env substitution for givers.
//!
//! Config files: `givers.toml`, `givers.yaml` or `givers.json`.
//! Searched in `./` then `~/.config/givers/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values and a small set of
//! `GIVERS_*` environment overrides applied after parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, data_dir, discover_and_load, find_config_file,
        load_config, save_config,
    },
    schema::{DatabaseConfig, GiversConfig, ToastConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
