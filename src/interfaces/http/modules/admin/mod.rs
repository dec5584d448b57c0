//! Operator API for managing remote parties

pub mod dto;
pub mod handlers;
pub mod middleware;

pub use dto::*;
pub use handlers::*;
pub use middleware::{admin_key_middleware, hash_api_key, AdminKey};
