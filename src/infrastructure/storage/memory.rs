//! In-memory party repository

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{DomainError, DomainResult, PartyIdentity, PartyRepository, RemoteParty};

/// In-memory repository for development and testing
pub struct InMemoryPartyRepository {
    parties: DashMap<PartyIdentity, RemoteParty>,
    fail_writes: AtomicBool,
}

impl InMemoryPartyRepository {
    pub fn new() -> Self {
        Self {
            parties: DashMap::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `save`/`delete` fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    fn check_writable(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::Storage("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryPartyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PartyRepository for InMemoryPartyRepository {
    async fn load_all(&self) -> DomainResult<Vec<RemoteParty>> {
        Ok(self.parties.iter().map(|e| e.value().clone()).collect())
    }

    async fn save(&self, party: &RemoteParty) -> DomainResult<()> {
        self.check_writable()?;
        self.parties.insert(party.identity.clone(), party.clone());
        Ok(())
    }

    async fn delete(&self, identity: &PartyIdentity) -> DomainResult<()> {
        self.check_writable()?;
        self.parties.remove(identity);
        Ok(())
    }
}
