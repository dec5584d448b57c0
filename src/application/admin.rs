//! Operator-facing management of remote parties

use std::sync::Arc;

use tracing::info;

use crate::application::store::PartyStore;
use crate::application::tokens::{mask_token, TokenGenerator};
use crate::domain::{
    AccessStatus, BusinessDetails, DomainError, DomainResult, LocalAccessInfo, PartyIdentity,
    PartyStatus, RemoteAccessInfo, RemoteLink, RemoteParty, RemoteStatus,
};

/// Input for [`PartyAdministration::add_remote_party`].
#[derive(Debug, Clone, Default)]
pub struct NewRemoteParty {
    pub business_details: BusinessDetails,
    /// Inbound token the counter-party will present; generated when absent
    pub token: Option<String>,
    /// Pre-shared outbound token for registering with the counter-party
    pub remote_token: Option<String>,
    pub remote_versions_url: Option<String>,
}

pub struct PartyAdministration {
    store: Arc<PartyStore>,
    tokens: TokenGenerator,
}

impl PartyAdministration {
    pub fn new(store: Arc<PartyStore>) -> Self {
        Self {
            store,
            tokens: TokenGenerator::new(),
        }
    }

    pub fn list(&self) -> Vec<RemoteParty> {
        self.store.all()
    }

    pub fn get(&self, identity: &PartyIdentity) -> DomainResult<RemoteParty> {
        self.store
            .get(identity)
            .ok_or_else(|| DomainError::PartyNotFound(identity.to_string()))
    }

    /// Create a pre-registered party. Returns it with its inbound token.
    pub async fn add_remote_party(
        &self,
        identity: PartyIdentity,
        new: NewRemoteParty,
    ) -> DomainResult<RemoteParty> {
        let _guard = self.store.lock(&identity).await;
        if self.store.get(&identity).is_some() {
            return Err(DomainError::Forbidden(format!("{} already exists", identity)));
        }

        let token = match new.token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                let store = &self.store;
                self.tokens.generate_unique(|t| store.resolve(t).is_some())
            }
        };

        let mut party = RemoteParty::new(identity, new.business_details);
        party.local_access_infos.push(LocalAccessInfo::allowed(token.clone()));
        if let Some(remote_token) = new.remote_token.filter(|t| !t.is_empty()) {
            party.remote_access_infos.push(RemoteAccessInfo {
                token: remote_token,
                link: RemoteLink::Unresolved {
                    versions_url: new.remote_versions_url,
                },
                status: RemoteStatus::None,
            });
        }

        self.store.upsert(party.clone()).await?;
        info!(party = %party.identity, token = %mask_token(&token), "Remote party added");
        Ok(party)
    }

    pub async fn remove(&self, identity: &PartyIdentity) -> DomainResult<RemoteParty> {
        let _guard = self.store.lock(identity).await;
        self.store
            .delete(identity)
            .await?
            .ok_or_else(|| DomainError::PartyNotFound(identity.to_string()))
    }

    pub async fn set_status(
        &self,
        identity: &PartyIdentity,
        status: PartyStatus,
    ) -> DomainResult<RemoteParty> {
        let party = self.store.set_party_status(identity, status).await?;
        info!(party = %identity, status = status.as_str(), "Party status changed");
        Ok(party)
    }

    pub async fn set_token_status(
        &self,
        token: &str,
        status: AccessStatus,
    ) -> DomainResult<RemoteParty> {
        let party = self.store.set_token_status(token, status).await?;
        info!(party = %party.identity, token = %mask_token(token), status = status.as_str(), "Token status changed");
        Ok(party)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::infrastructure::storage::InMemoryPartyRepository;

    fn admin() -> PartyAdministration {
        PartyAdministration::new(Arc::new(PartyStore::new(Arc::new(
            InMemoryPartyRepository::new(),
        ))))
    }

    fn gef() -> PartyIdentity {
        PartyIdentity::new("DE", "GEF", Role::Emsp)
    }

    #[tokio::test]
    async fn added_party_is_pre_registered_with_generated_token() {
        let admin = admin();
        let party = admin
            .add_remote_party(gef(), NewRemoteParty::default())
            .await
            .unwrap();

        assert!(!party.is_registered());
        assert_eq!(party.local_access_infos.len(), 1);
        assert_eq!(party.local_access_infos[0].token.len(), 43);
        assert!(party.remote_access_infos.is_empty());
        assert_eq!(admin.list().len(), 1);

        let again = admin.add_remote_party(gef(), NewRemoteParty::default()).await;
        assert!(matches!(again, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn pre_shared_outbound_token_is_kept_unresolved() {
        let admin = admin();
        let party = admin
            .add_remote_party(
                PartyIdentity::new("NL", "CPO", Role::Cpo),
                NewRemoteParty {
                    token: Some("inbound".into()),
                    remote_token: Some("seed".into()),
                    remote_versions_url: Some("https://cpo/versions".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(party.local_access_infos[0].token, "inbound");
        let outbound = party.outbound().unwrap();
        assert_eq!(outbound.token, "seed");
        assert_eq!(outbound.link.versions_url(), Some("https://cpo/versions"));
        assert!(!party.is_registered());
    }

    #[tokio::test]
    async fn inbound_token_cannot_be_shared() {
        let admin = admin();
        let with_token = |t: &str| NewRemoteParty {
            token: Some(t.to_string()),
            ..Default::default()
        };
        admin.add_remote_party(gef(), with_token("same")).await.unwrap();
        let err = admin
            .add_remote_party(PartyIdentity::new("NL", "TNM", Role::Emsp), with_token("same"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::IdentityImmutable { .. }));
    }

    #[tokio::test]
    async fn status_changes_and_removal() {
        let admin = admin();
        let party = admin
            .add_remote_party(gef(), NewRemoteParty::default())
            .await
            .unwrap();
        let token = party.local_access_infos[0].token.clone();

        let blocked = admin
            .set_token_status(&token, AccessStatus::Blocked)
            .await
            .unwrap();
        assert_eq!(blocked.local_access(&token).unwrap().status, AccessStatus::Blocked);

        let disabled = admin.set_status(&gef(), PartyStatus::Disabled).await.unwrap();
        assert!(!disabled.is_enabled());

        admin.remove(&gef()).await.unwrap();
        assert!(matches!(
            admin.remove(&gef()).await,
            Err(DomainError::PartyNotFound(_))
        ));
        assert!(matches!(admin.get(&gef()), Err(DomainError::PartyNotFound(_))));
    }
}
