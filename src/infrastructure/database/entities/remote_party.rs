//! Remote party entity for database

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{PartyStatus, Role};

/// OCPI role of the counter-party
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum PartyRole {
    #[sea_orm(string_value = "CPO")]
    Cpo,
    #[sea_orm(string_value = "EMSP")]
    Emsp,
}

impl From<Role> for PartyRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Cpo => Self::Cpo,
            Role::Emsp => Self::Emsp,
        }
    }
}

impl From<PartyRole> for Role {
    fn from(role: PartyRole) -> Self {
        match role {
            PartyRole::Cpo => Role::Cpo,
            PartyRole::Emsp => Role::Emsp,
        }
    }
}

/// Lifecycle status of the relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PartyState {
    #[sea_orm(string_value = "ENABLED")]
    Enabled,
    #[sea_orm(string_value = "DISABLED")]
    Disabled,
    #[sea_orm(string_value = "DELETED")]
    Deleted,
}

impl From<PartyStatus> for PartyState {
    fn from(status: PartyStatus) -> Self {
        match status {
            PartyStatus::Enabled => Self::Enabled,
            PartyStatus::Disabled => Self::Disabled,
            PartyStatus::Deleted => Self::Deleted,
        }
    }
}

impl From<PartyState> for PartyStatus {
    fn from(state: PartyState) -> Self {
        match state {
            PartyState::Enabled => PartyStatus::Enabled,
            PartyState::Disabled => PartyStatus::Disabled,
            PartyState::Deleted => PartyStatus::Deleted,
        }
    }
}

/// Remote party model - one trust relationship with a counter-party
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "remote_parties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// ISO 3166 alpha-2 country code
    pub country_code: String,

    /// Three character party id
    pub party_id: String,

    pub role: PartyRole,

    pub name: String,

    pub website: Option<String>,

    pub status: PartyState,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::local_access_info::Entity")]
    LocalAccessInfos,
    #[sea_orm(has_many = "super::remote_access_info::Entity")]
    RemoteAccessInfos,
}

impl Related<super::local_access_info::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocalAccessInfos.def()
    }
}

impl Related<super::remote_access_info::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RemoteAccessInfos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
