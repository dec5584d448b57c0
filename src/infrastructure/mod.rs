//! Infrastructure layer - external concerns

pub mod database;
pub mod ocpi_client;
pub mod storage;

pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmPartyRepository};
pub use ocpi_client::HttpOcpiClient;
pub use storage::InMemoryPartyRepository;
