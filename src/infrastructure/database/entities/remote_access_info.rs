//! Outbound token entity
//!
//! `version` and `credentials_url` are both set once the version has been
//! negotiated; a row with either missing is an unresolved link.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::RemoteStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum LinkStatus {
    #[sea_orm(string_value = "NONE")]
    None,
    #[sea_orm(string_value = "ONLINE")]
    Online,
}

impl From<RemoteStatus> for LinkStatus {
    fn from(status: RemoteStatus) -> Self {
        match status {
            RemoteStatus::None => Self::None,
            RemoteStatus::Online => Self::Online,
        }
    }
}

impl From<LinkStatus> for RemoteStatus {
    fn from(status: LinkStatus) -> Self {
        match status {
            LinkStatus::None => RemoteStatus::None,
            LinkStatus::Online => RemoteStatus::Online,
        }
    }
}

/// Token we present when calling a counter-party
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "remote_access_infos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub remote_party_id: i32,

    pub token: String,

    pub versions_url: Option<String>,

    /// Negotiated version, e.g. "2.2"
    pub version: Option<String>,

    pub credentials_url: Option<String>,

    pub status: LinkStatus,
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
