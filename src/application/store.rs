//! Party store: token-indexed registry of remote parties
//!
//! Reads (`resolve`, `get`, `all`) go to an in-memory index and never wait on
//! I/O. Writes are serialized by a single commit mutex: validate against the
//! index, persist through the [`PartyRepository`], then swap the index. A
//! failed write leaves both the repository and the index untouched.
//!
//! Handshakes additionally hold a per-identity lock ([`PartyStore::lock`])
//! for their whole duration, network calls included.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::domain::{
    AccessStatus, DomainError, DomainResult, PartyIdentity, PartyRepository, PartyStatus,
    RemoteParty,
};

#[derive(Default)]
struct PartyIndex {
    parties: HashMap<PartyIdentity, RemoteParty>,
    tokens: HashMap<String, PartyIdentity>,
}

impl PartyIndex {
    fn insert(&mut self, party: RemoteParty) {
        self.remove(&party.identity);
        for token in party.local_tokens() {
            self.tokens.insert(token.to_string(), party.identity.clone());
        }
        self.parties.insert(party.identity.clone(), party);
    }

    fn remove(&mut self, identity: &PartyIdentity) -> Option<RemoteParty> {
        let party = self.parties.remove(identity)?;
        for token in party.local_tokens() {
            self.tokens.remove(token);
        }
        Some(party)
    }

    /// First local token of `party` already owned by another identity.
    fn conflicting_owner(&self, party: &RemoteParty) -> Option<&PartyIdentity> {
        party
            .local_tokens()
            .filter_map(|t| self.tokens.get(t))
            .find(|owner| **owner != party.identity)
    }
}

/// Shared, reference-counted party store
pub type SharedPartyStore = Arc<PartyStore>;

pub struct PartyStore {
    index: RwLock<PartyIndex>,
    commit: Mutex<()>,
    locks: DashMap<PartyIdentity, Arc<Mutex<()>>>,
    repository: Arc<dyn PartyRepository>,
}

impl PartyStore {
    /// Empty store writing through to `repository` (nothing is loaded).
    pub fn new(repository: Arc<dyn PartyRepository>) -> Self {
        Self {
            index: RwLock::new(PartyIndex::default()),
            commit: Mutex::new(()),
            locks: DashMap::new(),
            repository,
        }
    }

    /// Store populated with everything the repository holds.
    pub async fn open(repository: Arc<dyn PartyRepository>) -> DomainResult<Self> {
        let parties = repository.load_all().await?;
        let store = Self::new(repository);
        {
            let mut index = store.write();
            for party in parties {
                if let Some(owner) = index.conflicting_owner(&party) {
                    warn!(
                        party = %party.identity,
                        owner = %owner,
                        "Skipping party whose token is already owned by another party"
                    );
                    continue;
                }
                index.insert(party);
            }
            info!(parties = index.parties.len(), "Party store loaded");
        }
        Ok(store)
    }

    fn read(&self) -> RwLockReadGuard<'_, PartyIndex> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, PartyIndex> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Party owning the given inbound token.
    pub fn resolve(&self, token: &str) -> Option<RemoteParty> {
        let index = self.read();
        let identity = index.tokens.get(token)?;
        index.parties.get(identity).cloned()
    }

    pub fn get(&self, identity: &PartyIdentity) -> Option<RemoteParty> {
        self.read().parties.get(identity).cloned()
    }

    /// All parties, ordered by identity.
    pub fn all(&self) -> Vec<RemoteParty> {
        let mut parties: Vec<RemoteParty> = self.read().parties.values().cloned().collect();
        parties.sort_by(|a, b| a.identity.cmp(&b.identity));
        parties
    }

    pub fn len(&self) -> usize {
        self.read().parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn registered_count(&self) -> usize {
        self.read()
            .parties
            .values()
            .filter(|p| p.is_registered())
            .count()
    }

    /// Serializes handshakes for one identity. Hold the guard for the whole
    /// read-check-call-write sequence.
    pub async fn lock(&self, identity: &PartyIdentity) -> OwnedMutexGuard<()> {
        self.prune_locks();
        let lock = self
            .locks
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Insert or replace the party with the same identity.
    ///
    /// Fails with [`DomainError::IdentityImmutable`] if one of its inbound
    /// tokens already belongs to a different identity.
    pub async fn upsert(&self, party: RemoteParty) -> DomainResult<()> {
        let _commit = self.commit.lock().await;

        let conflict = self.read().conflicting_owner(&party).cloned();
        if let Some(owner) = conflict {
            return Err(DomainError::IdentityImmutable {
                field: "token owner",
                old: owner.to_string(),
                new: party.identity.to_string(),
            });
        }

        self.repository.save(&party).await?;
        debug!(party = %party.identity, tokens = party.local_access_infos.len(), "Party committed");
        self.write().insert(party);
        Ok(())
    }

    /// Remove the party and every token it owns.
    pub async fn delete(&self, identity: &PartyIdentity) -> DomainResult<Option<RemoteParty>> {
        let _commit = self.commit.lock().await;

        let exists = self.read().parties.contains_key(identity);
        if !exists {
            return Ok(None);
        }

        self.repository.delete(identity).await?;
        let removed = self.write().remove(identity);
        self.prune_locks();
        info!(party = %identity, "Party deleted");
        Ok(removed)
    }

    /// Drop identity locks nobody holds or waits on, for parties that no
    /// longer exist.
    fn prune_locks(&self) {
        self.locks.retain(|identity, lock| {
            Arc::strong_count(lock) > 1 || self.read().parties.contains_key(identity)
        });
    }

    /// Put `original` back into the in-memory index without touching the
    /// repository. Used when an abandoned handshake cannot await.
    pub fn restore_index(&self, original: RemoteParty) {
        self.write().insert(original);
    }

    /// Put `original` back after an abandoned handshake. The index is
    /// restored even when the repository write fails.
    pub async fn restore(&self, original: RemoteParty) {
        let _commit = self.commit.lock().await;
        if let Err(e) = self.repository.save(&original).await {
            error!(party = %original.identity, error = %e, "Failed to persist reverted party");
        }
        self.write().insert(original);
    }

    pub async fn set_party_status(
        &self,
        identity: &PartyIdentity,
        status: PartyStatus,
    ) -> DomainResult<RemoteParty> {
        let _guard = self.lock(identity).await;
        let mut party = self
            .get(identity)
            .ok_or_else(|| DomainError::PartyNotFound(identity.to_string()))?;
        party.status = status;
        party.updated_at = Utc::now();
        self.upsert(party.clone()).await?;
        Ok(party)
    }

    pub async fn set_token_status(
        &self,
        token: &str,
        status: AccessStatus,
    ) -> DomainResult<RemoteParty> {
        let identity = self
            .resolve(token)
            .map(|p| p.identity)
            .ok_or(DomainError::UnknownToken)?;
        let _guard = self.lock(&identity).await;

        // The token may have been rotated away while we waited.
        let mut party = self.resolve(token).ok_or(DomainError::UnknownToken)?;
        for access in party.local_access_infos.iter_mut().filter(|l| l.token == token) {
            access.status = status;
        }
        party.updated_at = Utc::now();
        self.upsert(party.clone()).await?;
        Ok(party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusinessDetails, LocalAccessInfo, Role};
    use crate::infrastructure::storage::InMemoryPartyRepository;

    fn party(country: &str, id: &str, tokens: &[&str]) -> RemoteParty {
        let mut p = RemoteParty::new(
            PartyIdentity::new(country, id, Role::Emsp),
            BusinessDetails {
                name: id.to_string(),
                website: None,
            },
        );
        p.local_access_infos = tokens.iter().map(|t| LocalAccessInfo::allowed(*t)).collect();
        p
    }

    fn store() -> (PartyStore, Arc<InMemoryPartyRepository>) {
        let repo = Arc::new(InMemoryPartyRepository::new());
        (PartyStore::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn resolves_tokens_to_their_party() {
        let (store, _) = store();
        store.upsert(party("DE", "GEF", &["a", "b"])).await.unwrap();
        store.upsert(party("NL", "TNM", &["c"])).await.unwrap();

        assert_eq!(store.resolve("a").unwrap().identity.party_id, "GEF");
        assert_eq!(store.resolve("b").unwrap().identity.party_id, "GEF");
        assert_eq!(store.resolve("c").unwrap().identity.party_id, "TNM");
        assert!(store.resolve("d").is_none());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn upsert_replaces_tokens_of_same_identity() {
        let (store, _) = store();
        store.upsert(party("DE", "GEF", &["old"])).await.unwrap();
        store.upsert(party("DE", "GEF", &["new"])).await.unwrap();

        assert!(store.resolve("old").is_none());
        assert!(store.resolve("new").is_some());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn token_cannot_move_to_another_identity() {
        let (store, repo) = store();
        store.upsert(party("DE", "GEF", &["shared"])).await.unwrap();

        let err = store
            .upsert(party("NL", "TNM", &["shared"]))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IdentityImmutable { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(repo.len(), 1);
        assert_eq!(store.resolve("shared").unwrap().identity.party_id, "GEF");
    }

    #[tokio::test]
    async fn delete_removes_every_token() {
        let (store, repo) = store();
        let p = party("DE", "GEF", &["a", "b"]);
        store.upsert(p.clone()).await.unwrap();

        let removed = store.delete(&p.identity).await.unwrap();
        assert!(removed.is_some());
        assert!(store.resolve("a").is_none());
        assert!(store.resolve("b").is_none());
        assert!(repo.is_empty());

        assert!(store.delete(&p.identity).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn open_loads_repository_content() {
        let repo = Arc::new(InMemoryPartyRepository::new());
        repo.save(&party("DE", "GEF", &["a"])).await.unwrap();

        let store = PartyStore::open(repo).await.unwrap();
        assert_eq!(store.resolve("a").unwrap().identity.country_code, "DE");
    }

    #[tokio::test]
    async fn failed_persistence_leaves_index_untouched() {
        let (store, repo) = store();
        store.upsert(party("DE", "GEF", &["a"])).await.unwrap();

        repo.fail_writes(true);
        let err = store.upsert(party("DE", "GEF", &["b"])).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
        assert!(store.resolve("a").is_some());
        assert!(store.resolve("b").is_none());
    }

    #[tokio::test]
    async fn token_and_party_status_updates() {
        let (store, _) = store();
        let p = party("DE", "GEF", &["a"]);
        store.upsert(p.clone()).await.unwrap();

        store.set_token_status("a", AccessStatus::Blocked).await.unwrap();
        assert_eq!(
            store.resolve("a").unwrap().local_access("a").unwrap().status,
            AccessStatus::Blocked
        );

        store
            .set_party_status(&p.identity, PartyStatus::Disabled)
            .await
            .unwrap();
        assert_eq!(store.get(&p.identity).unwrap().status, PartyStatus::Disabled);

        assert_eq!(
            store.set_token_status("zzz", AccessStatus::Allowed).await.unwrap_err(),
            DomainError::UnknownToken
        );
    }

    #[tokio::test]
    async fn identity_lock_serializes_holders() {
        let (store, _) = store();
        let store = Arc::new(store);
        let identity = PartyIdentity::new("DE", "GEF", Role::Emsp);

        let guard = store.lock(&identity).await;
        let contender = {
            let store = store.clone();
            let identity = identity.clone();
            tokio::spawn(async move {
                let _g = store.lock(&identity).await;
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn delete_prunes_idle_identity_locks() {
        let (store, _) = store();
        let p = party("DE", "GEF", &["a"]);
        let identity = p.identity.clone();
        store.upsert(p).await.unwrap();

        drop(store.lock(&identity).await);
        assert_eq!(store.locks.len(), 1);

        store.delete(&identity).await.unwrap();
        assert!(store.locks.is_empty());
    }

    #[tokio::test]
    async fn held_lock_survives_delete() {
        let (store, _) = store();
        let p = party("DE", "GEF", &["a"]);
        let identity = p.identity.clone();
        store.upsert(p).await.unwrap();

        let guard = store.lock(&identity).await;
        store.delete(&identity).await.unwrap();
        assert_eq!(store.locks.len(), 1);

        drop(guard);
        drop(store.lock(&PartyIdentity::new("NL", "TNM", Role::Emsp)).await);
        assert_eq!(store.locks.len(), 1);
        assert!(!store.locks.contains_key(&identity));
    }

    #[tokio::test]
    async fn restore_reverts_index_even_if_repository_fails() {
        let (store, repo) = store();
        let original = party("DE", "GEF", &["a"]);
        store.upsert(original.clone()).await.unwrap();

        let mut staged = original.clone();
        staged.local_access_infos.push(LocalAccessInfo::allowed("staged"));
        store.upsert(staged).await.unwrap();
        assert!(store.resolve("staged").is_some());

        repo.fail_writes(true);
        store.restore(original.clone()).await;
        assert!(store.resolve("staged").is_none());
        assert_eq!(store.get(&original.identity), Some(original));
    }
}
