//! storemap CLI
//!
//! Runs the service headless and loads district/store datasets.
//!
//! ```sh
//! # Serve with the default config (~/.config/storemap/config.toml)
//! storemap
//!
//! # Custom config and port
//! storemap --config /etc/storemap/config.toml --api-port 8080
//!
//! # Validate config without starting
//! storemap --check
//!
//! # Load a district GeoJSON FeatureCollection, then a JSON array of stores
//! storemap import-districts data/districts.geojson
//! storemap import-stores data/stores.json
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use storemap::application::ImportService;
use storemap::config::AppConfig;
use storemap::server::{init_tracing, open_repositories, ServerHandle, ServerOptions};

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// storemap: convenience-store locator backend.
#[derive(Parser, Debug)]
#[command(
    name = "storemap",
    version,
    about = "Convenience-store location service with spatial search",
    long_about = "storemap REST API server and dataset importer.\n\n\
                  Default config: ~/.config/storemap/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "STOREMAP_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long, global = true)]
    no_migrate: bool,

    /// Skip creating the default admin user.
    #[arg(long)]
    no_admin: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST API (default).
    Serve,
    /// Upsert districts by name from a GeoJSON FeatureCollection.
    ImportDistricts { file: PathBuf },
    /// Create stores from a JSON array, skipping names that already exist.
    ImportStores { file: PathBuf },
}

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(storemap::default_config_path);

    let mut config = match AppConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", config_path.display(), e);
            eprintln!("Using default configuration.");
            AppConfig::default()
        }
    };

    if let Some(port) = cli.api_port {
        config.server.api_port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    if cli.check {
        config.validate()?;
        println!("Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.api_host, config.server.api_port);
        println!("   Database    : {}", config.database.connection_url());
        println!("   Log level   : {}", config.logging.level);
        println!("   Log format  : {}", config.logging.format);
        return Ok(());
    }

    init_tracing(&config);
    info!("Configuration loaded from {}", config_path.display());

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, !cli.no_migrate, !cli.no_admin).await,
        Command::ImportDistricts { file } => {
            import(&config, !cli.no_migrate, &file, Dataset::Districts).await
        }
        Command::ImportStores { file } => {
            import(&config, !cli.no_migrate, &file, Dataset::Stores).await
        }
    }
}

async fn serve(config: AppConfig, auto_migrate: bool, create_default_admin: bool) -> CliResult {
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate,
        create_default_admin,
    })
    .await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Dataset {
    Districts,
    Stores,
}

async fn import(config: &AppConfig, auto_migrate: bool, file: &Path, dataset: Dataset) -> CliResult {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {}", file.display(), e))?;
    let payload: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| format!("{} is not valid JSON: {}", file.display(), e))?;

    let (db, repos) = open_repositories(config, auto_migrate).await?;
    let service = ImportService::new(repos);

    info!(file = %file.display(), ?dataset, "Importing");
    let result = match dataset {
        Dataset::Districts => service.import_districts(&payload).await,
        Dataset::Stores => service.import_stores(&payload).await,
    };
    if let Err(e) = db.close().await {
        error!(error = %e, "Error closing database connection");
    }

    let report = result?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
