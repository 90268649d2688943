//! # storemap
//!
//! Convenience-store locator backend: districts with boundaries, stores
//! with locations, an item catalog with per-store inventory, users with
//! JWT authentication, and radius search over all of it.
//!
//! ## Architecture
//!
//! - **domain**: aggregates, geometry value objects and repository traits
//! - **application**: use-case services (catalog, identity, import)
//! - **infrastructure**: SeaORM entities, migrations, repositories, crypto
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: lifecycle, tracing and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::create_api_router;
