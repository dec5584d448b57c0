//! Outbound ports: what the handshake needs from the counter-party's server
//!
//! [`VersionResolver`] fetches the versions / version-details documents,
//! [`CredentialsApi`] calls the remote credentials module. The production
//! implementation of both is
//! [`HttpOcpiClient`](crate::infrastructure::ocpi_client::HttpOcpiClient).

use async_trait::async_trait;

use crate::domain::{
    select_mutual_version, Credentials, DomainError, DomainResult, Version, VersionDetails,
    VersionNumber, CREDENTIALS_MODULE,
};

#[async_trait]
pub trait VersionResolver: Send + Sync {
    /// Versions advertised at `versions_url`.
    async fn versions(&self, versions_url: &str, token: &str) -> DomainResult<Vec<Version>>;

    /// Endpoint map of one version.
    async fn version_details(&self, details_url: &str, token: &str) -> DomainResult<VersionDetails>;
}

#[async_trait]
pub trait CredentialsApi: Send + Sync {
    /// POST our credentials; returns the counter-party's (rotated) credentials.
    async fn register(
        &self,
        credentials_url: &str,
        token: &str,
        ours: &Credentials,
    ) -> DomainResult<Credentials>;

    /// PUT our new credentials; returns the counter-party's rotated credentials.
    async fn update(
        &self,
        credentials_url: &str,
        token: &str,
        ours: &Credentials,
    ) -> DomainResult<Credentials>;

    async fn unregister(&self, credentials_url: &str, token: &str) -> DomainResult<()>;
}

/// Outcome of version discovery against a counter-party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub versions_url: String,
    pub version: VersionNumber,
    pub credentials_url: String,
}

/// Discover the mutual version and the credentials endpoint.
pub async fn resolve_credentials_endpoint(
    resolver: &dyn VersionResolver,
    versions_url: &str,
    token: &str,
) -> DomainResult<ResolvedVersion> {
    let versions = resolver.versions(versions_url, token).await?;
    let (version, entry) = select_mutual_version(&versions).ok_or_else(|| {
        let offered: Vec<&str> = versions.iter().map(|v| v.version.as_str()).collect();
        DomainError::NoCompatibleVersion(format!(
            "{} offers [{}]",
            versions_url,
            offered.join(", ")
        ))
    })?;

    let details = resolver.version_details(&entry.url, token).await?;
    let credentials_url = details.endpoint(CREDENTIALS_MODULE).ok_or_else(|| {
        DomainError::NoCompatibleVersion(format!(
            "version {} at {} has no credentials endpoint",
            version, entry.url
        ))
    })?;

    Ok(ResolvedVersion {
        versions_url: versions_url.to_string(),
        version,
        credentials_url: credentials_url.to_string(),
    })
}
