//! HTTP interfaces
//!
//! - `envelope`: domain error → OCPI envelope mapping
//! - `common`: shared extractors
//! - `modules`: OCPI credentials / versions, admin API, health, metrics and
//!   the request-id and authorization-gate middlewares
//! - `router`: route table with Swagger documentation

pub mod common;
pub mod envelope;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiContext};
