//! HTTP client for the counter-party's OCPI endpoints
//!
//! Every call carries `Authorization: Token <token>` plus fresh request and
//! correlation ids. Anything other than a 2xx answer wrapping a 1000-family
//! envelope is reported as [`DomainError::RemoteUnreachable`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::application::ports::{CredentialsApi, VersionResolver};
use crate::domain::{
    Credentials, DomainError, DomainResult, OcpiResponse, Version, VersionDetails,
};

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

pub struct HttpOcpiClient {
    http: reqwest::Client,
}

impl HttpOcpiClient {
    /// Fails when the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("texnouz-ocpi/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    fn request(&self, method: Method, url: &str, token: &str) -> RequestBuilder {
        let id = Uuid::new_v4().to_string();
        self.http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", token))
            .header(REQUEST_ID_HEADER, &id)
            .header(CORRELATION_ID_HEADER, &id)
    }

    /// Send and unwrap the envelope, returning its `data`.
    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> DomainResult<Option<T>> {
        let response = request.send().await.map_err(unreachable)?;
        let url = response.url().to_string();
        let status = response.status();
        debug!(%url, status = status.as_u16(), "OCPI response");

        let envelope: OcpiResponse<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => {
                return Err(DomainError::RemoteUnreachable(format!(
                    "{} returned an unreadable body: {}",
                    url, e
                )))
            }
            Err(_) => {
                return Err(DomainError::RemoteUnreachable(format!(
                    "{} answered HTTP {}",
                    url, status
                )))
            }
        };

        if !status.is_success() || !envelope.is_success() {
            return Err(DomainError::RemoteUnreachable(format!(
                "{} answered HTTP {} with status {}: {}",
                url,
                status.as_u16(),
                envelope.status_code,
                envelope.status_message.unwrap_or_default()
            )));
        }
        Ok(envelope.data)
    }

    async fn call_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> DomainResult<T> {
        self.call(request)
            .await?
            .ok_or_else(|| DomainError::RemoteUnreachable("response carried no data".to_string()))
    }
}

fn unreachable(e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::RemoteUnreachable(format!("request timed out: {}", e))
    } else {
        DomainError::RemoteUnreachable(e.to_string())
    }
}

#[async_trait]
impl VersionResolver for HttpOcpiClient {
    async fn versions(&self, versions_url: &str, token: &str) -> DomainResult<Vec<Version>> {
        self.call_data(self.request(Method::GET, versions_url, token))
            .await
    }

    async fn version_details(&self, details_url: &str, token: &str) -> DomainResult<VersionDetails> {
        self.call_data(self.request(Method::GET, details_url, token))
            .await
    }
}

#[async_trait]
impl CredentialsApi for HttpOcpiClient {
    async fn register(
        &self,
        credentials_url: &str,
        token: &str,
        ours: &Credentials,
    ) -> DomainResult<Credentials> {
        self.call_data(self.request(Method::POST, credentials_url, token).json(ours))
            .await
    }

    async fn update(
        &self,
        credentials_url: &str,
        token: &str,
        ours: &Credentials,
    ) -> DomainResult<Credentials> {
        self.call_data(self.request(Method::PUT, credentials_url, token).json(ours))
            .await
    }

    async fn unregister(&self, credentials_url: &str, token: &str) -> DomainResult<()> {
        self.call::<serde_json::Value>(self.request(Method::DELETE, credentials_url, token))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_connection_is_remote_unreachable() {
        let client = HttpOcpiClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .versions("http://127.0.0.1:9/ocpi/versions", "tok")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RemoteUnreachable(_)));
    }
}
