//! Inbound token entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::AccessStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TokenStatus {
    #[sea_orm(string_value = "ALLOWED")]
    Allowed,
    #[sea_orm(string_value = "BLOCKED")]
    Blocked,
}

impl From<AccessStatus> for TokenStatus {
    fn from(status: AccessStatus) -> Self {
        match status {
            AccessStatus::Allowed => Self::Allowed,
            AccessStatus::Blocked => Self::Blocked,
        }
    }
}

impl From<TokenStatus> for AccessStatus {
    fn from(status: TokenStatus) -> Self {
        match status {
            TokenStatus::Allowed => AccessStatus::Allowed,
            TokenStatus::Blocked => AccessStatus::Blocked,
        }
    }
}

/// Token a counter-party presents when calling us
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "local_access_infos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub remote_party_id: i32,

    #[sea_orm(unique)]
    pub token: String,

    pub status: TokenStatus,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::remote_party::Entity",
        from = "Column::RemotePartyId",
        to = "super::remote_party::Column::Id",
        on_delete = "Cascade"
    )]
    RemoteParty,
}

impl Related<super::remote_party::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RemoteParty.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
