use std::path::Path;

use {anyhow::Result, clap::Subcommand};

use givers_config::{
    GiversConfig,
    validate::{self, Severity, ValidationResult},
};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration (file, env substitution and overrides applied).
    Show,
    /// Validate the configuration file and report errors/warnings.
    Validate {
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
}

pub fn handle_config(
    action: ConfigAction,
    explicit_path: Option<&Path>,
    config: &GiversConfig,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        },
        ConfigAction::Validate { verbose } => {
            let path = explicit_path
                .map(Path::to_path_buf)
                .or_else(givers_config::find_config_file);
            let Some(path) = path else {
                eprintln!("No config file found; defaults are in use.");
                return Ok(());
            };
            let result = validate::validate(&path);
            report(&result, verbose);
            let errors = result.count(Severity::Error);
            if errors > 0 {
                anyhow::bail!("{errors} error(s) in {}", path.display());
            }
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn report(result: &ValidationResult, verbose: bool) {
    if let Some(ref path) = result.config_path {
        eprintln!("Checking {}\n", path.display());
    }

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    if shown > 0 {
        eprintln!();
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("givers.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn validate_accepts_clean_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[toasts]\nmax_visible = 3\n");
        let action = ConfigAction::Validate { verbose: true };
        handle_config(action, Some(&path), &GiversConfig::default()).unwrap();
    }

    #[test]
    fn validate_fails_on_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[toasts]\nmax_visible = 0\n");
        let action = ConfigAction::Validate { verbose: false };
        let err = handle_config(action, Some(&path), &GiversConfig::default()).unwrap_err();
        assert!(err.to_string().contains("1 error(s)"), "{err}");
    }

    #[test]
    fn show_prints_valid_toml() {
        let rendered = toml::to_string_pretty(&GiversConfig::default()).unwrap();
        let parsed: GiversConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, GiversConfig::default());
        handle_config(ConfigAction::Show, None, &GiversConfig::default()).unwrap();
    }
}
