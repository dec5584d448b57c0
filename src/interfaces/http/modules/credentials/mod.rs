//! Credentials module: the registration handshake endpoint

pub mod handlers;

pub use handlers::*;
