//! Inbound side of the credentials handshake
//!
//! ```text
//! PRE_REGISTERED --POST--> REGISTERED --PUT--> REGISTERED --DELETE--> (removed)
//! PRE_REGISTERED --PUT--> 405 (not yet registered)
//! ```
//!
//! Every transition runs under the caller's identity lock. The token is
//! re-resolved once the lock is held, so a request that lost a race against a
//! rotation or deletion sees `UnknownToken` instead of a torn record. Nothing
//! is written before version discovery has succeeded.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use super::{ensure_same_identity, LocalParty};
use crate::application::ports::{resolve_credentials_endpoint, ResolvedVersion, VersionResolver};
use crate::application::store::PartyStore;
use crate::application::tokens::{mask_token, TokenGenerator};
use crate::domain::{
    AccessStatus, Credentials, DomainError, DomainResult, LocalAccessInfo, RemoteAccessInfo,
    RemoteLink, RemoteParty, RemoteStatus, DISCOVERY_TOKEN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    Register,
    Update,
}

impl Exchange {
    fn method(&self) -> &'static str {
        match self {
            Self::Register => "POST",
            Self::Update => "PUT",
        }
    }
}

pub struct CredentialsService {
    store: Arc<PartyStore>,
    resolver: Arc<dyn VersionResolver>,
    tokens: TokenGenerator,
    local: LocalParty,
    timeout: Duration,
}

impl CredentialsService {
    pub fn new(
        store: Arc<PartyStore>,
        resolver: Arc<dyn VersionResolver>,
        local: LocalParty,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            tokens: TokenGenerator::new(),
            local,
            timeout,
        }
    }

    pub fn local_party(&self) -> &LocalParty {
        &self.local
    }

    /// Public credentials served to callers without a usable token.
    pub fn discovery(&self) -> Credentials {
        self.local.credentials(DISCOVERY_TOKEN)
    }

    /// GET: our credentials as seen by the holder of `token`.
    pub fn current(&self, token: &str) -> Credentials {
        self.local.credentials(token)
    }

    /// POST: initial registration (idempotent re-registration allowed).
    pub async fn register(&self, token: &str, submitted: Credentials) -> DomainResult<Credentials> {
        self.exchange(Exchange::Register, token, submitted).await
    }

    /// PUT: credential rotation, only for registered parties.
    pub async fn update(&self, token: &str, submitted: Credentials) -> DomainResult<Credentials> {
        self.exchange(Exchange::Update, token, submitted).await
    }

    /// DELETE: drop the whole trust record. Returns the token that was used.
    pub async fn unregister(&self, token: &str) -> DomainResult<String> {
        let identity = self.caller(token)?.identity;
        let _guard = self.store.lock(&identity).await;

        let party = self.caller(token)?;
        self.store.delete(&party.identity).await?;

        info!(party = %party.identity, token = %mask_token(token), "Remote party unregistered");
        metrics::counter!("ocpi_credentials_exchanges_total", "method" => "DELETE", "outcome" => "success")
            .increment(1);
        Ok(token.to_string())
    }

    /// Party behind an ALLOWED token of an ENABLED relationship.
    fn caller(&self, token: &str) -> DomainResult<RemoteParty> {
        let party = self.store.resolve(token).ok_or(DomainError::UnknownToken)?;
        match party.local_access(token).map(|l| l.status) {
            Some(AccessStatus::Allowed) if party.is_enabled() => Ok(party),
            Some(AccessStatus::Allowed) => Err(DomainError::UnknownToken),
            _ => Err(DomainError::BlockedToken(token.to_string())),
        }
    }

    async fn discover(&self, submitted: &Credentials) -> DomainResult<ResolvedVersion> {
        let discovery =
            resolve_credentials_endpoint(self.resolver.as_ref(), &submitted.url, &submitted.token);
        match tokio::time::timeout(self.timeout, discovery).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::RemoteUnreachable(format!(
                "version discovery at {} timed out after {}s",
                submitted.url,
                self.timeout.as_secs()
            ))),
        }
    }

    async fn exchange(
        &self,
        kind: Exchange,
        token: &str,
        submitted: Credentials,
    ) -> DomainResult<Credentials> {
        let result = self.try_exchange(kind, token, submitted).await;
        let outcome = if result.is_ok() { "success" } else { "failure" };
        metrics::counter!("ocpi_credentials_exchanges_total", "method" => kind.method(), "outcome" => outcome)
            .increment(1);
        result
    }

    async fn try_exchange(
        &self,
        kind: Exchange,
        token: &str,
        submitted: Credentials,
    ) -> DomainResult<Credentials> {
        let identity = self.caller(token)?.identity;
        let _guard = self.store.lock(&identity).await;
        let party = self.caller(token)?;

        if kind == Exchange::Update && !party.is_registered() {
            return Err(DomainError::NotYetRegistered(token.to_string()));
        }
        ensure_same_identity(&party.identity, &submitted)?;

        let resolved = match self.discover(&submitted).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(party = %party.identity, method = kind.method(), error = %e, "Version discovery failed");
                return Err(e);
            }
        };

        let store = &self.store;
        let new_token = self
            .tokens
            .generate_unique(|t| t == token || store.resolve(t).is_some());

        let mut updated = party.clone();
        updated.business_details = submitted.business_details;
        updated.local_access_infos = vec![LocalAccessInfo::allowed(new_token.clone())];
        updated.remote_access_infos = vec![RemoteAccessInfo {
            token: submitted.token,
            link: RemoteLink::Resolved {
                versions_url: resolved.versions_url,
                version: resolved.version,
                credentials_url: resolved.credentials_url,
            },
            status: RemoteStatus::Online,
        }];
        updated.updated_at = Utc::now();

        self.store.upsert(updated).await?;

        info!(
            party = %party.identity,
            method = kind.method(),
            version = %resolved.version,
            "Credentials exchanged, inbound token rotated"
        );
        Ok(self.local.credentials(&new_token))
    }
}
