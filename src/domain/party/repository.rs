//! Remote party persistence interface

use async_trait::async_trait;

use super::{PartyIdentity, RemoteParty};
use crate::domain::DomainResult;

/// Durable backing store for remote parties.
///
/// `save` and `delete` must be atomic per party: either every access info row
/// of the party is written/removed, or none is.
#[async_trait]
pub trait PartyRepository: Send + Sync {
    async fn load_all(&self) -> DomainResult<Vec<RemoteParty>>;
    async fn save(&self, party: &RemoteParty) -> DomainResult<()>;
    async fn delete(&self, identity: &PartyIdentity) -> DomainResult<()>;
}
