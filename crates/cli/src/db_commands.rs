use std::sync::Arc;

use {
    anyhow::Context,
    clap::Subcommand,
    givers_config::{DatabaseConfig, GiversConfig},
    givers_persistence::{Gateway, SqliteStore},
};

#[derive(Subcommand)]
pub enum DbAction {
    /// Check that the configured database is reachable.
    Check,
    /// Run all pending database migrations.
    Migrate,
}

pub async fn handle_db(action: DbAction, config: &GiversConfig) -> anyhow::Result<()> {
    match action {
        DbAction::Check => check(&config.database).await,
        DbAction::Migrate => migrate(&config.database).await,
    }
}

/// Make sure the default database location exists before SQLite tries to
/// create a file there.
fn ensure_data_dir(config: &DatabaseConfig) -> anyhow::Result<()> {
    if config.url.is_none() {
        let dir = givers_config::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }
    Ok(())
}

/// Open a migrated store and wrap it in a gateway.
pub async fn open_gateway(config: &DatabaseConfig) -> anyhow::Result<Gateway> {
    ensure_data_dir(config)?;
    let store = SqliteStore::open(config)
        .await
        .context("opening database")?;
    Ok(Gateway::new(Arc::new(store)))
}

async fn check(config: &DatabaseConfig) -> anyhow::Result<()> {
    ensure_data_dir(config)?;
    let gateway = Gateway::sqlite(config)?;
    if gateway.test_connection().await {
        println!("Database reachable: {}", config.resolved_url());
        Ok(())
    } else {
        anyhow::bail!("database unreachable: {}", config.resolved_url())
    }
}

async fn migrate(config: &DatabaseConfig) -> anyhow::Result<()> {
    open_gateway(config).await?;
    println!("Migrations applied: {}", config.resolved_url());
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, givers_persistence::entities::Donation};

    fn file_config(dir: &tempfile::TempDir) -> DatabaseConfig {
        DatabaseConfig {
            url: Some(format!(
                "sqlite:{}?mode=rwc",
                dir.path().join("givers.db").display()
            )),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn migrate_then_use() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(&dir);

        migrate(&config).await.unwrap();
        assert!(dir.path().join("givers.db").exists());

        let gateway = open_gateway(&config).await.unwrap();
        let saved = gateway
            .create(Donation::new("Ada", 2_500, "Food Aid"))
            .await
            .unwrap();
        assert!(saved.id.is_some());
        assert_eq!(gateway.get_all::<Donation>().await.len(), 1);
    }

    #[tokio::test]
    async fn check_reports_unreachable_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: Some(format!(
                "sqlite:{}",
                dir.path().join("missing/sub/givers.db").display()
            )),
            create_if_missing: false,
            acquire_timeout_secs: 2,
            ..Default::default()
        };
        assert!(check(&config).await.is_err());
    }

    #[tokio::test]
    async fn check_succeeds_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        check(&file_config(&dir)).await.unwrap();
    }
}
