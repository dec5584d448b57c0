pub mod admin;
pub mod credentials;
pub mod gate;
pub mod health;
pub mod metrics;
pub mod request_id;
pub mod versions;
