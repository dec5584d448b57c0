//! SeaORM implementation of PartyRepository

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, warn};

use crate::domain::{
    BusinessDetails, DomainError, DomainResult, LocalAccessInfo, PartyIdentity, PartyRepository,
    RemoteAccessInfo, RemoteLink, RemoteParty, VersionNumber,
};
use crate::infrastructure::database::entities::{
    local_access_info, remote_access_info, remote_party,
};

pub struct SeaOrmPartyRepository {
    db: DatabaseConnection,
}

impl SeaOrmPartyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

async fn find_row(
    txn: &DatabaseTransaction,
    identity: &PartyIdentity,
) -> DomainResult<Option<remote_party::Model>> {
    remote_party::Entity::find()
        .filter(remote_party::Column::CountryCode.eq(identity.country_code.as_str()))
        .filter(remote_party::Column::PartyId.eq(identity.party_id.as_str()))
        .filter(remote_party::Column::Role.eq(remote_party::PartyRole::from(identity.role)))
        .one(txn)
        .await
        .map_err(db_err)
}

async fn delete_children(txn: &DatabaseTransaction, party_row: i32) -> DomainResult<()> {
    local_access_info::Entity::delete_many()
        .filter(local_access_info::Column::RemotePartyId.eq(party_row))
        .exec(txn)
        .await
        .map_err(db_err)?;
    remote_access_info::Entity::delete_many()
        .filter(remote_access_info::Column::RemotePartyId.eq(party_row))
        .exec(txn)
        .await
        .map_err(db_err)?;
    Ok(())
}

fn link_from_row(row: &remote_access_info::Model) -> RemoteLink {
    let version = row.version.as_deref().map(VersionNumber::from_str);
    match (&row.versions_url, version, &row.credentials_url) {
        (Some(versions_url), Some(Ok(version)), Some(credentials_url)) => RemoteLink::Resolved {
            versions_url: versions_url.clone(),
            version,
            credentials_url: credentials_url.clone(),
        },
        (_, Some(Err(e)), _) => {
            warn!(row = row.id, error = %e, "Stored version no longer supported, link reset");
            RemoteLink::Unresolved {
                versions_url: row.versions_url.clone(),
            }
        }
        _ => RemoteLink::Unresolved {
            versions_url: row.versions_url.clone(),
        },
    }
}

#[async_trait]
impl PartyRepository for SeaOrmPartyRepository {
    async fn load_all(&self) -> DomainResult<Vec<RemoteParty>> {
        let rows = remote_party::Entity::find()
            .order_by_asc(remote_party::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut locals: HashMap<i32, Vec<LocalAccessInfo>> = HashMap::new();
        for row in local_access_info::Entity::find()
            .order_by_asc(local_access_info::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            locals.entry(row.remote_party_id).or_default().push(LocalAccessInfo {
                token: row.token,
                status: row.status.into(),
                created_at: row.created_at,
            });
        }

        let mut remotes: HashMap<i32, Vec<RemoteAccessInfo>> = HashMap::new();
        for row in remote_access_info::Entity::find()
            .order_by_asc(remote_access_info::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            let link = link_from_row(&row);
            remotes.entry(row.remote_party_id).or_default().push(RemoteAccessInfo {
                token: row.token,
                link,
                status: row.status.into(),
            });
        }

        let parties = rows
            .into_iter()
            .map(|row| RemoteParty {
                identity: PartyIdentity::new(&row.country_code, &row.party_id, row.role.into()),
                business_details: BusinessDetails {
                    name: row.name,
                    website: row.website,
                },
                status: row.status.into(),
                local_access_infos: locals.remove(&row.id).unwrap_or_default(),
                remote_access_infos: remotes.remove(&row.id).unwrap_or_default(),
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect::<Vec<_>>();

        debug!(parties = parties.len(), "Loaded remote parties from database");
        Ok(parties)
    }

    async fn save(&self, party: &RemoteParty) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let row_id = match find_row(&txn, &party.identity).await? {
            Some(existing) => {
                let id = existing.id;
                let mut active: remote_party::ActiveModel = existing.into();
                active.name = Set(party.business_details.name.clone());
                active.website = Set(party.business_details.website.clone());
                active.status = Set(party.status.into());
                active.updated_at = Set(party.updated_at);
                active.update(&txn).await.map_err(db_err)?;
                delete_children(&txn, id).await?;
                id
            }
            None => {
                let active = remote_party::ActiveModel {
                    country_code: Set(party.identity.country_code.clone()),
                    party_id: Set(party.identity.party_id.clone()),
                    role: Set(party.identity.role.into()),
                    name: Set(party.business_details.name.clone()),
                    website: Set(party.business_details.website.clone()),
                    status: Set(party.status.into()),
                    created_at: Set(party.created_at),
                    updated_at: Set(party.updated_at),
                    ..Default::default()
                };
                active.insert(&txn).await.map_err(db_err)?.id
            }
        };

        for local in &party.local_access_infos {
            local_access_info::ActiveModel {
                remote_party_id: Set(row_id),
                token: Set(local.token.clone()),
                status: Set(local.status.into()),
                created_at: Set(local.created_at),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        for remote in &party.remote_access_infos {
            let (versions_url, version, credentials_url) = match &remote.link {
                RemoteLink::Unresolved { versions_url } => (versions_url.clone(), None, None),
                RemoteLink::Resolved {
                    versions_url,
                    version,
                    credentials_url,
                } => (
                    Some(versions_url.clone()),
                    Some(version.to_string()),
                    Some(credentials_url.clone()),
                ),
            };
            remote_access_info::ActiveModel {
                remote_party_id: Set(row_id),
                token: Set(remote.token.clone()),
                versions_url: Set(versions_url),
                version: Set(version),
                credentials_url: Set(credentials_url),
                status: Set(remote.status.into()),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)
    }

    async fn delete(&self, identity: &PartyIdentity) -> DomainResult<()> {
        let txn = self.db.begin().await.map_err(db_err)?;
        if let Some(row) = find_row(&txn, identity).await? {
            // SQLite only cascades with foreign_keys on; remove children explicitly
            delete_children(&txn, row.id).await?;
            remote_party::Entity::delete_by_id(row.id)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }
        txn.commit().await.map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessStatus, PartyStatus, RemoteStatus, Role};
    use crate::infrastructure::database::{init_database, run_migrations, DatabaseConfig};

    async fn repository() -> SeaOrmPartyRepository {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();
        SeaOrmPartyRepository::new(db)
    }

    fn registered_party() -> RemoteParty {
        let mut party = RemoteParty::new(
            PartyIdentity::new("DE", "GEF", Role::Emsp),
            BusinessDetails {
                name: "Gefion".into(),
                website: Some("https://gefion.example.com".into()),
            },
        );
        party.local_access_infos.push(LocalAccessInfo::allowed("inbound-1"));
        party.remote_access_infos.push(RemoteAccessInfo {
            token: "outbound-1".into(),
            link: RemoteLink::Resolved {
                versions_url: "https://emsp/versions".into(),
                version: VersionNumber::V22,
                credentials_url: "https://emsp/2.2/credentials".into(),
            },
            status: RemoteStatus::Online,
        });
        party
    }

    #[tokio::test]
    async fn saved_party_loads_back_with_its_tokens() {
        let repo = repository().await;
        let party = registered_party();
        repo.save(&party).await.unwrap();

        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        let loaded = &loaded[0];
        assert_eq!(loaded.identity, party.identity);
        assert_eq!(loaded.business_details, party.business_details);
        assert_eq!(loaded.local_access_infos[0].token, "inbound-1");
        assert_eq!(loaded.remote_access_infos, party.remote_access_infos);
        assert!(loaded.is_registered());
    }

    #[tokio::test]
    async fn save_replaces_previous_tokens() {
        let repo = repository().await;
        let mut party = registered_party();
        repo.save(&party).await.unwrap();

        party.local_access_infos = vec![LocalAccessInfo::allowed("inbound-2")];
        party.local_access_infos[0].status = AccessStatus::Blocked;
        party.status = PartyStatus::Disabled;
        repo.save(&party).await.unwrap();

        let loaded = repo.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].local_access_infos.len(), 1);
        assert_eq!(loaded[0].local_access_infos[0].token, "inbound-2");
        assert_eq!(loaded[0].local_access_infos[0].status, AccessStatus::Blocked);
        assert_eq!(loaded[0].status, PartyStatus::Disabled);
    }

    #[tokio::test]
    async fn delete_removes_party_and_tokens() {
        let repo = repository().await;
        let party = registered_party();
        repo.save(&party).await.unwrap();
        repo.delete(&party.identity).await.unwrap();
        assert!(repo.load_all().await.unwrap().is_empty());

        // a new party may reuse a token of a deleted one
        repo.save(&party).await.unwrap();
        assert_eq!(repo.load_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_inbound_token_is_rejected_atomically() {
        let repo = repository().await;
        repo.save(&registered_party()).await.unwrap();

        let mut other = RemoteParty::new(
            PartyIdentity::new("NL", "TNM", Role::Emsp),
            BusinessDetails::default(),
        );
        other.local_access_infos.push(LocalAccessInfo::allowed("inbound-1"));
        let err = repo.save(&other).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage(_)));
        assert_eq!(repo.load_all().await.unwrap().len(), 1);
    }
}
