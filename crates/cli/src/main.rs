mod config_commands;
mod db_commands;
mod entity_commands;
mod toasts;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    givers_config::GiversConfig,
    givers_toast::{ToastService, TokioScheduler},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "givers", about = "Givers: donations and incident reports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of the standard locations.
    #[arg(long, global = true, env = "GIVERS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Database management (check, migrate).
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
    /// Record and inspect donations.
    Donations {
        #[command(subcommand)]
        action: entity_commands::DonationAction,
    },
    /// File and inspect incident reports.
    Reports {
        #[command(subcommand)]
        action: entity_commands::ReportAction,
    },
    /// Register and inspect users.
    Users {
        #[command(subcommand)]
        action: entity_commands::UserAction,
    },
    /// Configuration inspection.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output stays pipeable.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GiversConfig> {
    match path {
        Some(path) => givers_config::load_config(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(givers_config::discover_and_load()),
    }
}

/// Toast manager for this invocation, printing every new toast to stderr.
fn toast_service(config: &GiversConfig) -> anyhow::Result<Arc<ToastService>> {
    let scheduler = TokioScheduler::try_current().context("no tokio runtime for toast timers")?;
    let service = Arc::new(ToastService::with_config(
        Arc::new(scheduler),
        &config.toasts,
    ));
    toasts::attach_renderer(&service);
    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "givers starting");

    let config = load_config(cli.config.as_ref())?;
    debug!(
        max_visible = config.toasts.max_visible,
        "configuration loaded"
    );

    match cli.command {
        Commands::Db { action } => db_commands::handle_db(action, &config).await,
        Commands::Donations { action } => {
            let toasts = toast_service(&config)?;
            entity_commands::handle_donations(action, &config, &toasts).await
        },
        Commands::Reports { action } => {
            let toasts = toast_service(&config)?;
            entity_commands::handle_reports(action, &config, &toasts).await
        },
        Commands::Users { action } => {
            let toasts = toast_service(&config)?;
            entity_commands::handle_users(action, &config, &toasts).await
        },
        Commands::Config { action } => {
            config_commands::handle_config(action, cli.config.as_deref(), &config)
        },
    }
}
