//! Versions module: version list and per-version endpoint map

pub mod handlers;

pub use handlers::*;
