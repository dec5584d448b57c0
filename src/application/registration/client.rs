//! Outbound side of the credentials handshake
//!
//! [`RegistrationClient`] drives POST / PUT / DELETE against a counter-party's
//! credentials module. [`RemotePartyClient`] is the per-party handle every
//! outbound call goes through: it reads the outbound token from the store at
//! call time, so a rotation is visible to every handle on its next call.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, warn};
use validator::Validate;

use super::{ensure_same_identity, LocalParty};
use crate::application::ports::{
    resolve_credentials_endpoint, CredentialsApi, ResolvedVersion, VersionResolver,
};
use crate::application::store::PartyStore;
use crate::application::tokens::{mask_token, TokenGenerator};
use crate::domain::{
    Credentials, DomainError, DomainResult, LocalAccessInfo, PartyIdentity, RemoteAccessInfo,
    RemoteLink, RemoteParty, RemoteStatus,
};

/// Handle for calls towards one counter-party.
#[derive(Clone)]
pub struct RemotePartyClient {
    identity: PartyIdentity,
    store: Arc<PartyStore>,
    api: Arc<dyn CredentialsApi>,
    resolver: Arc<dyn VersionResolver>,
}

impl RemotePartyClient {
    pub fn new(
        identity: PartyIdentity,
        store: Arc<PartyStore>,
        api: Arc<dyn CredentialsApi>,
        resolver: Arc<dyn VersionResolver>,
    ) -> Self {
        Self {
            identity,
            store,
            api,
            resolver,
        }
    }

    pub fn identity(&self) -> &PartyIdentity {
        &self.identity
    }

    /// Outbound access as currently committed in the store.
    pub fn outbound(&self) -> DomainResult<RemoteAccessInfo> {
        self.store
            .get(&self.identity)
            .and_then(|p| p.outbound().cloned())
            .ok_or_else(|| {
                DomainError::PartyNotFound(format!("{} has no outbound token", self.identity))
            })
    }

    pub fn token(&self) -> DomainResult<String> {
        self.outbound().map(|o| o.token)
    }

    /// Discover the mutual version from the stored versions URL.
    pub async fn discover(&self) -> DomainResult<ResolvedVersion> {
        let outbound = self.outbound()?;
        let versions_url = outbound.link.versions_url().ok_or_else(|| {
            DomainError::PartyNotFound(format!("{} has no versions URL", self.identity))
        })?;
        resolve_credentials_endpoint(self.resolver.as_ref(), versions_url, &outbound.token).await
    }

    pub async fn post_credentials(&self, url: &str, ours: &Credentials) -> DomainResult<Credentials> {
        let token = self.token()?;
        self.api.register(url, &token, ours).await
    }

    pub async fn put_credentials(&self, url: &str, ours: &Credentials) -> DomainResult<Credentials> {
        let token = self.token()?;
        self.api.update(url, &token, ours).await
    }

    pub async fn delete_credentials(&self, url: &str) -> DomainResult<()> {
        let token = self.token()?;
        self.api.unregister(url, &token).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    Register,
    Update,
}

pub struct RegistrationClient {
    store: Arc<PartyStore>,
    api: Arc<dyn CredentialsApi>,
    resolver: Arc<dyn VersionResolver>,
    tokens: TokenGenerator,
    local: LocalParty,
    timeout: Duration,
}

impl RegistrationClient {
    pub fn new(
        store: Arc<PartyStore>,
        api: Arc<dyn CredentialsApi>,
        resolver: Arc<dyn VersionResolver>,
        local: LocalParty,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            api,
            resolver,
            tokens: TokenGenerator::new(),
            local,
            timeout,
        }
    }

    /// A handle for calls to `identity`.
    pub fn handle(&self, identity: &PartyIdentity) -> RemotePartyClient {
        RemotePartyClient::new(
            identity.clone(),
            self.store.clone(),
            self.api.clone(),
            self.resolver.clone(),
        )
    }

    /// Initial registration using the pre-shared outbound token.
    pub async fn register(&self, identity: &PartyIdentity) -> DomainResult<RemoteParty> {
        self.exchange(Exchange::Register, identity).await
    }

    /// Rotate credentials with an already registered party.
    pub async fn update(&self, identity: &PartyIdentity) -> DomainResult<RemoteParty> {
        self.exchange(Exchange::Update, identity).await
    }

    /// Ask the counter-party to drop us, then forget it locally.
    pub async fn unregister(&self, identity: &PartyIdentity) -> DomainResult<()> {
        let _guard = self.store.lock(identity).await;
        let party = self.party(identity)?;
        let credentials_url = match party.outbound().map(|o| &o.link) {
            Some(RemoteLink::Resolved {
                credentials_url, ..
            }) => credentials_url.clone(),
            _ => return Err(DomainError::NotYetRegistered(identity.to_string())),
        };

        self.bounded(self.handle(identity).delete_credentials(&credentials_url))
            .await?;
        self.store.delete(identity).await?;
        info!(party = %identity, "Unregistered from remote party");
        Ok(())
    }

    fn party(&self, identity: &PartyIdentity) -> DomainResult<RemoteParty> {
        self.store
            .get(identity)
            .ok_or_else(|| DomainError::PartyNotFound(identity.to_string()))
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = DomainResult<T>>,
    ) -> DomainResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::RemoteUnreachable(format!(
                "no answer within {}s",
                self.timeout.as_secs()
            ))),
        }
    }

    async fn exchange(&self, kind: Exchange, identity: &PartyIdentity) -> DomainResult<RemoteParty> {
        let guard = self.store.lock(identity).await;
        let original = self.party(identity)?;
        if kind == Exchange::Update && !original.is_registered() {
            return Err(DomainError::NotYetRegistered(identity.to_string()));
        }

        let handle = self.handle(identity);
        let resolved = self.bounded(handle.discover()).await?;

        // The counter-party calls our versions endpoint with this token while
        // handling the request, so it has to resolve before we send it.
        let store = &self.store;
        let inbound = self.tokens.generate_unique(|t| store.resolve(t).is_some());
        let mut staged = original.clone();
        staged.local_access_infos.push(LocalAccessInfo::allowed(inbound.clone()));
        self.store.upsert(staged).await?;
        let staging = StagedExchange::new(self.store.clone(), original.clone(), guard);

        let ours = self.local.credentials(&inbound);
        let sent = match kind {
            Exchange::Register => {
                self.bounded(handle.post_credentials(&resolved.credentials_url, &ours))
                    .await
            }
            Exchange::Update => {
                self.bounded(handle.put_credentials(&resolved.credentials_url, &ours))
                    .await
            }
        };
        let received = match sent.and_then(|c| validate_reply(&original, c)) {
            Ok(received) => received,
            Err(e) => {
                warn!(party = %identity, error = %e, "Credentials exchange failed, reverting");
                staging.revert().await;
                return Err(e);
            }
        };

        let link = self.link_for(&resolved, &received).await;
        let mut committed = original;
        committed.business_details = received.business_details;
        committed.local_access_infos = vec![LocalAccessInfo::allowed(inbound)];
        committed.remote_access_infos = vec![RemoteAccessInfo {
            token: received.token,
            status: if link.is_resolved() {
                RemoteStatus::Online
            } else {
                RemoteStatus::None
            },
            link,
        }];
        committed.updated_at = Utc::now();
        if let Err(e) = self.store.upsert(committed.clone()).await {
            staging.revert().await;
            return Err(e);
        }
        staging.commit();

        info!(
            party = %identity,
            outbound = %committed.outbound().map(|o| mask_token(&o.token)).unwrap_or_default(),
            "Credentials exchanged, outbound token replaced"
        );
        Ok(committed)
    }

    /// Link for the returned versions URL. Re-discovers with the new token
    /// when the counter-party moved its versions document.
    async fn link_for(&self, resolved: &ResolvedVersion, received: &Credentials) -> RemoteLink {
        if received.url == resolved.versions_url {
            return RemoteLink::Resolved {
                versions_url: resolved.versions_url.clone(),
                version: resolved.version,
                credentials_url: resolved.credentials_url.clone(),
            };
        }

        let discovery =
            resolve_credentials_endpoint(self.resolver.as_ref(), &received.url, &received.token);
        match self.bounded(discovery).await {
            Ok(moved) => RemoteLink::Resolved {
                versions_url: moved.versions_url,
                version: moved.version,
                credentials_url: moved.credentials_url,
            },
            Err(e) => {
                warn!(url = %received.url, error = %e, "Returned versions URL could not be resolved");
                RemoteLink::Unresolved {
                    versions_url: Some(received.url.clone()),
                }
            }
        }
    }
}

/// An exchange whose new inbound token is already in the store.
///
/// Owns the identity lock. Unless committed, the original party is put back
/// when it goes away, including when the exchange future is dropped midway.
struct StagedExchange {
    store: Arc<PartyStore>,
    original: Option<RemoteParty>,
    lock: Option<OwnedMutexGuard<()>>,
}

impl StagedExchange {
    fn new(store: Arc<PartyStore>, original: RemoteParty, lock: OwnedMutexGuard<()>) -> Self {
        Self {
            store,
            original: Some(original),
            lock: Some(lock),
        }
    }

    async fn revert(mut self) {
        if let Some(original) = self.original.take() {
            self.store.restore(original).await;
        }
    }

    fn commit(mut self) {
        self.original = None;
    }
}

impl Drop for StagedExchange {
    fn drop(&mut self) {
        let Some(original) = self.original.take() else {
            return;
        };
        warn!(party = %original.identity, "Credentials exchange abandoned, dropping staged token");

        // The staged token stops resolving right away; persisting the revert
        // happens in the background while still holding the identity lock.
        self.store.restore_index(original.clone());
        let store = self.store.clone();
        let lock = self.lock.take();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    let _lock = lock;
                    store.restore(original).await;
                });
            }
            Err(_) => {
                error!(party = %original.identity, "No runtime left to persist the reverted party");
            }
        }
    }
}

fn validate_reply(party: &RemoteParty, received: Credentials) -> DomainResult<Credentials> {
    received
        .validate()
        .map_err(|e| DomainError::MalformedCredentials(e.to_string()))?;
    ensure_same_identity(&party.identity, &received)?;
    Ok(received)
}
