//! In-process stand-ins for a counter-party, shared by the handshake tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::LocalParty;
use crate::application::ports::{CredentialsApi, VersionResolver};
use crate::application::store::PartyStore;
use crate::domain::{
    BusinessDetails, Credentials, DomainError, DomainResult, Endpoint, LocalAccessInfo,
    PartyIdentity, RemoteParty, Role, Version, VersionDetails, CREDENTIALS_MODULE,
};
use crate::infrastructure::storage::InMemoryPartyRepository;

pub fn local_party(country: &str, party_id: &str, role: Role) -> LocalParty {
    LocalParty {
        identity: PartyIdentity::new(country, party_id, role),
        business_details: BusinessDetails {
            name: format!("{} {}", country, party_id),
            website: None,
        },
        versions_url: format!("https://{}.example.com/ocpi/versions", party_id.to_lowercase()),
    }
}

pub fn submitted_credentials(token: &str, country: &str, party_id: &str) -> Credentials {
    Credentials {
        token: token.to_string(),
        url: "https://emsp/versions".to_string(),
        business_details: BusinessDetails {
            name: "Gefion".to_string(),
            website: Some("https://gefion.example.com".to_string()),
        },
        country_code: country.to_string(),
        party_id: party_id.to_string(),
    }
}

/// Store holding one pre-registered party with a single inbound token.
pub async fn seeded_store(identity: PartyIdentity, token: &str) -> Arc<PartyStore> {
    let store = Arc::new(PartyStore::new(Arc::new(InMemoryPartyRepository::new())));
    let mut party = RemoteParty::new(
        identity,
        BusinessDetails {
            name: "Seeded".to_string(),
            website: None,
        },
    );
    party.local_access_infos.push(LocalAccessInfo::allowed(token));
    store.upsert(party).await.unwrap();
    store
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub token: String,
    pub sent: Option<Credentials>,
    /// Whether the token we sent already resolved in our store at call time
    pub sent_token_resolvable: bool,
}

/// Scriptable counter-party serving a versions document and a credentials
/// module.
pub struct FakeRemote {
    versions_url: String,
    versions: Mutex<Vec<String>>,
    unreachable: AtomicBool,
    reject_credentials: AtomicBool,
    delay: Mutex<Duration>,
    tokens: Mutex<Vec<String>>,
    reply: Mutex<Credentials>,
    calls: Mutex<Vec<RecordedCall>>,
    observed_store: Mutex<Option<Arc<PartyStore>>>,
}

impl FakeRemote {
    pub fn new(versions_url: &str) -> Self {
        Self {
            versions_url: versions_url.to_string(),
            versions: Mutex::new(vec!["2.1.1".to_string(), "2.2".to_string()]),
            unreachable: AtomicBool::new(false),
            reject_credentials: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
            tokens: Mutex::new(Vec::new()),
            reply: Mutex::new(Credentials {
                token: "cpo-rotated".to_string(),
                url: versions_url.to_string(),
                business_details: BusinessDetails {
                    name: "Remote CPO".to_string(),
                    website: None,
                },
                country_code: "NL".to_string(),
                party_id: "CPO".to_string(),
            }),
            calls: Mutex::new(Vec::new()),
            observed_store: Mutex::new(None),
        }
    }

    pub fn set_versions(&self, versions: Vec<&str>) {
        *self.versions.lock().unwrap() = versions.into_iter().map(String::from).collect();
    }

    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, Ordering::SeqCst);
    }

    pub fn set_reject_credentials(&self, value: bool) {
        self.reject_credentials.store(value, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn set_reply(&self, reply: Credentials) {
        *self.reply.lock().unwrap() = reply;
    }

    /// Our own store, so calls can record whether the token we sent is
    /// already accepted by us.
    pub fn observe(&self, store: Arc<PartyStore>) {
        *self.observed_store.lock().unwrap() = Some(store);
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, token: &str) -> DomainResult<()> {
        self.tokens.lock().unwrap().push(token.to_string());
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(DomainError::RemoteUnreachable("connection refused".to_string()));
        }
        Ok(())
    }

    fn record(&self, method: &'static str, url: &str, token: &str, sent: Option<&Credentials>) {
        let sent_token_resolvable = match (sent, self.observed_store.lock().unwrap().as_ref()) {
            (Some(c), Some(store)) => store.resolve(&c.token).is_some(),
            _ => false,
        };
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            token: token.to_string(),
            sent: sent.cloned(),
            sent_token_resolvable,
        });
    }

    fn credentials_reply(&self) -> DomainResult<Credentials> {
        if self.reject_credentials.load(Ordering::SeqCst) {
            return Err(DomainError::RemoteUnreachable(
                "remote rejected request (2000)".to_string(),
            ));
        }
        Ok(self.reply.lock().unwrap().clone())
    }
}

#[async_trait]
impl VersionResolver for FakeRemote {
    async fn versions(&self, versions_url: &str, token: &str) -> DomainResult<Vec<Version>> {
        self.enter(token).await?;
        if versions_url != self.versions_url {
            return Err(DomainError::RemoteUnreachable(format!("404 at {}", versions_url)));
        }
        let base = versions_url.trim_end_matches("/versions");
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .map(|v| Version {
                version: v.clone(),
                url: format!("{}/{}", base, v),
            })
            .collect())
    }

    async fn version_details(&self, details_url: &str, token: &str) -> DomainResult<VersionDetails> {
        self.enter(token).await?;
        let version = details_url.rsplit('/').next().unwrap_or_default().to_string();
        Ok(VersionDetails {
            version,
            endpoints: vec![Endpoint {
                identifier: CREDENTIALS_MODULE.to_string(),
                url: format!("{}/credentials", details_url),
            }],
        })
    }
}

#[async_trait]
impl CredentialsApi for FakeRemote {
    async fn register(
        &self,
        credentials_url: &str,
        token: &str,
        ours: &Credentials,
    ) -> DomainResult<Credentials> {
        self.enter(token).await?;
        self.record("POST", credentials_url, token, Some(ours));
        self.credentials_reply()
    }

    async fn update(
        &self,
        credentials_url: &str,
        token: &str,
        ours: &Credentials,
    ) -> DomainResult<Credentials> {
        self.enter(token).await?;
        self.record("PUT", credentials_url, token, Some(ours));
        self.credentials_reply()
    }

    async fn unregister(&self, credentials_url: &str, token: &str) -> DomainResult<()> {
        self.enter(token).await?;
        self.record("DELETE", credentials_url, token, None);
        if self.reject_credentials.load(Ordering::SeqCst) {
            return Err(DomainError::RemoteUnreachable(
                "remote rejected request (2000)".to_string(),
            ));
        }
        Ok(())
    }
}
