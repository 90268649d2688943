//! Server runtime
//!
//! [`ServerHandle`] owns the whole lifecycle: metrics recorder, database
//! and migrations, the bootstrap administrator, the REST API and graceful
//! shutdown. The `storemap` CLI and `storemap-service` binary both start
//! the service through it.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::UserService;
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::{init_database, run_migrations, SeaOrmRepositoryProvider};
use crate::interfaces::create_api_router;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

pub type StartupError = Box<dyn std::error::Error + Send + Sync>;

/// Options for starting the service.
pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup.
    pub auto_migrate: bool,
    /// Create the `[admin]` user when no user exists.
    pub create_default_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
        }
    }
}

/// The global recorder can be installed once per process; later starts
/// reuse its handle.
fn prometheus_handle() -> Result<PrometheusHandle, StartupError> {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus metrics recorder installed");
    Ok(HANDLE.get_or_init(|| handle).clone())
}

/// Connect, optionally migrate, and build the repository provider.
pub async fn open_repositories(
    config: &AppConfig,
    auto_migrate: bool,
) -> Result<(DatabaseConnection, Arc<dyn RepositoryProvider>), StartupError> {
    let db = init_database(&config.database.to_database_config()).await?;
    if auto_migrate {
        info!("Running database migrations...");
        run_migrations(&db).await?;
    }
    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
    Ok((db, repos))
}

/// Handle to a running service.
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub config: AppConfig,
    /// Address the API is bound to
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the service: metrics, database, migrations, bootstrap
    /// administrator, then the REST API.
    pub async fn start(opts: ServerOptions) -> Result<Self, StartupError> {
        let config = opts.config;
        config.validate()?;
        info!("Starting storemap service...");

        let prometheus = prometheus_handle()?;
        let jwt_config: JwtConfig = config.security.to_jwt_config();
        info!(
            access_hours = jwt_config.expiration_hours,
            refresh_days = jwt_config.refresh_expiration_days,
            "JWT configured"
        );

        let (db, repos) = open_repositories(&config, opts.auto_migrate).await?;

        if opts.create_default_admin {
            bootstrap_admin(repos.clone(), jwt_config.clone(), &config).await;
        }

        let router = create_api_router(db.clone(), repos.clone(), jwt_config, prometheus);

        let addr = format!("{}:{}", config.server.api_host, config.server.api_port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let signal = shutdown.signal();
        let api_server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            signal.wait().await;
            info!("REST API received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!(error = %e, "REST API server error");
            }
        });

        Ok(Self {
            repos,
            config,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGINT/SIGTERM.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the API task after shutdown was triggered, bounded by
    /// `server.shutdown_timeout`, then close the database.
    pub async fn wait(self) {
        info!("Waiting for in-flight requests...");
        let api_task = self.api_task;
        let drained = self
            .shutdown
            .drain(async move {
                if let Err(e) = api_task.await {
                    error!(error = %e, "REST API task panicked");
                }
            })
            .await;
        if drained {
            info!("REST API stopped");
        }

        if let Err(e) = self.db.close().await {
            warn!(error = %e, "Error closing database connection");
        } else {
            info!("Database connection closed");
        }
        info!("storemap shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down storemap service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Create the configured administrator when no user exists yet.
async fn bootstrap_admin(
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    config: &AppConfig,
) {
    let service = UserService::new(repos, jwt_config);
    let admin = &config.admin;
    match service
        .bootstrap_admin(&admin.username, &admin.email, &admin.password)
        .await
    {
        Ok(Some(user)) => {
            info!(username = %user.username, email = %user.email, "Default administrator created");
            warn!("Change the default administrator password");
        }
        Ok(None) => {}
        Err(e) => error!(error = %e, "Failed to create default administrator"),
    }
}

/// Initialise the global tracing subscriber. `RUST_LOG` wins over
/// `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.database.url = Some("sqlite::memory:".into());
        config.database.max_connections = 1;
        config
    }

    #[tokio::test]
    async fn starts_bootstraps_admin_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: test_config(),
            ..Default::default()
        })
        .await
        .unwrap();
        assert!(handle.is_running());
        assert_ne!(handle.local_addr.port(), 0);
        assert_eq!(handle.repos.users().count_users().await.unwrap(), 1);
        handle.shutdown().await;
    }
}
