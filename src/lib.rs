//! # Texnouz OCPI node
//!
//! OCPI credentials handshake: remote party registry, token rotation and the
//! authorization gate in front of every OCPI module.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: parties, tokens, credentials, versions and errors
//! - **application**: party store, registration state machine, authorization
//!   gate and party administration
//! - **infrastructure**: SeaORM persistence and the outbound OCPI HTTP client
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig};

pub use interfaces::http::create_api_router;

pub use server::{ServerHandle, ServerOptions};
