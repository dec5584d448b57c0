//! Validated JSON extractor for Axum
//!
//! `ValidatedJson<T>` works like `axum::Json<T>`, but additionally runs
//! `validator::Validate::validate()` on the deserialized value. Both parse
//! and validation failures are rejected as
//! [`DomainError::MalformedCredentials`], i.e. a 400 envelope with status
//! 2001.

use axum::extract::FromRequest;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::domain::DomainError;

pub struct ValidatedJson<T>(pub T);

/// Flatten field errors into `field: code` pairs.
fn describe(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{}: {}", field, msg)
            })
        })
        .collect();
    fields.sort();

    if fields.is_empty() {
        errors.to_string()
    } else {
        fields.join("; ")
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = DomainError;

    async fn from_request(req: axum::extract::Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| DomainError::MalformedCredentials(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| DomainError::MalformedCredentials(describe(&errors)))?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use axum::Router;

    use crate::domain::Credentials;

    async fn handler(ValidatedJson(_body): ValidatedJson<Credentials>) -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new().route("/test", post(handler))
    }

    async fn send(body: impl Into<Body>) -> axum::http::Response<Body> {
        use tower::Service;
        let req = Request::builder()
            .method("POST")
            .uri("/test")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        let mut svc = app().into_service();
        svc.call(req).await.unwrap()
    }

    async fn status_code(resp: axum::http::Response<Body>) -> u64 {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["status_code"].as_u64().unwrap()
    }

    fn credentials(party_id: &str) -> serde_json::Value {
        serde_json::json!({
            "token": "emsp-tok",
            "url": "https://emsp/versions",
            "business_details": {"name": "Gefion"},
            "country_code": "DE",
            "party_id": party_id
        })
    }

    #[tokio::test]
    async fn valid_body_returns_ok() {
        let resp = send(serde_json::to_vec(&credentials("GEF")).unwrap()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn invalid_json_is_malformed_credentials() {
        let resp = send("not json").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(status_code(resp).await, 2001);
    }

    #[tokio::test]
    async fn validation_failure_is_malformed_credentials() {
        let resp = send(serde_json::to_vec(&credentials("TOOLONG")).unwrap()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(status_code(resp).await, 2001);
    }
}
