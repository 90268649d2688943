//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;

pub use database::{init_database, run_migrations, DatabaseConfig};
pub use database::repositories::SeaOrmRepositoryProvider;
