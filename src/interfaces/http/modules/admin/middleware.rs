//! X-API-Key guard for the admin API
//!
//! Only the SHA-256 hash of the configured key is kept in memory.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::domain::DomainError;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Hex encoded SHA-256 of an API key
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Expected key hash; `None` closes the admin API.
#[derive(Clone, Default)]
pub struct AdminKey(Option<Arc<str>>);

impl AdminKey {
    pub fn new(api_key: Option<&str>) -> Self {
        Self(
            api_key
                .filter(|k| !k.is_empty())
                .map(|k| Arc::from(hash_api_key(k))),
        )
    }

    pub fn accepts(&self, presented: Option<&str>) -> bool {
        match (&self.0, presented) {
            (Some(expected), Some(key)) => hash_api_key(key) == **expected,
            _ => false,
        }
    }
}

pub async fn admin_key_middleware(
    State(key): State<AdminKey>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if key.accepts(presented) {
        next.run(request).await
    } else {
        DomainError::Forbidden("missing or invalid API key".to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn only_the_configured_key_is_accepted() {
        let key = AdminKey::new(Some("secret"));
        assert!(key.accepts(Some("secret")));
        assert!(!key.accepts(Some("Secret")));
        assert!(!key.accepts(None));

        let closed = AdminKey::new(None);
        assert!(!closed.accepts(Some("secret")));
        assert!(!AdminKey::new(Some("")).accepts(Some("")));
    }
}
