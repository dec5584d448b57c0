//! Remote party trust record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::version::VersionNumber;

/// OCPI business role
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Cpo,
    Emsp,
}

impl Role {
    /// Role a counter-party plays towards us.
    pub fn counterpart(&self) -> Self {
        match self {
            Self::Cpo => Self::Emsp,
            Self::Emsp => Self::Cpo,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cpo => "CPO",
            Self::Emsp => "EMSP",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CPO" => Ok(Self::Cpo),
            "EMSP" => Ok(Self::Emsp),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// (country code, party id, role). Never changes once a party exists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct PartyIdentity {
    pub country_code: String,
    pub party_id: String,
    pub role: Role,
}

impl PartyIdentity {
    pub fn new(country_code: impl Into<String>, party_id: impl Into<String>, role: Role) -> Self {
        Self {
            country_code: country_code.into(),
            party_id: party_id.into(),
            role,
        }
    }
}

impl std::fmt::Display for PartyIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}*{} ({})", self.country_code, self.party_id, self.role)
    }
}

/// Display name and public website of a party
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct BusinessDetails {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(url)]
    pub website: Option<String>,
}

/// Operational state of the relationship, independent of token validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartyStatus {
    Enabled,
    Disabled,
    Deleted,
}

impl PartyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Deleted => "DELETED",
        }
    }
}

impl std::str::FromStr for PartyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ENABLED" => Ok(Self::Enabled),
            "DISABLED" => Ok(Self::Disabled),
            "DELETED" => Ok(Self::Deleted),
            other => Err(format!("unknown party status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessStatus {
    Allowed,
    Blocked,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "ALLOWED",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl std::str::FromStr for AccessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALLOWED" => Ok(Self::Allowed),
            "BLOCKED" => Ok(Self::Blocked),
            other => Err(format!("unknown access status '{}'", other)),
        }
    }
}

/// Token the counter-party presents to us
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAccessInfo {
    pub token: String,
    pub status: AccessStatus,
    pub created_at: DateTime<Utc>,
}

impl LocalAccessInfo {
    pub fn allowed(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            status: AccessStatus::Allowed,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteStatus {
    None,
    Online,
}

/// Where and how we reach the counter-party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteLink {
    /// Version not negotiated yet; the versions URL may already be known
    /// (pre-shared out of band).
    Unresolved { versions_url: Option<String> },
    /// Version negotiated and credentials endpoint discovered.
    Resolved {
        versions_url: String,
        version: VersionNumber,
        credentials_url: String,
    },
}

impl RemoteLink {
    pub fn versions_url(&self) -> Option<&str> {
        match self {
            Self::Unresolved { versions_url } => versions_url.as_deref(),
            Self::Resolved { versions_url, .. } => Some(versions_url),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

/// Token we present to the counter-party
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAccessInfo {
    pub token: String,
    pub link: RemoteLink,
    pub status: RemoteStatus,
}

/// Whether the credentials handshake completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationState {
    PreRegistered,
    Registered,
}

/// Trust record for one counter-party
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteParty {
    pub identity: PartyIdentity,
    pub business_details: BusinessDetails,
    pub status: PartyStatus,
    pub local_access_infos: Vec<LocalAccessInfo>,
    pub remote_access_infos: Vec<RemoteAccessInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RemoteParty {
    pub fn new(identity: PartyIdentity, business_details: BusinessDetails) -> Self {
        let now = Utc::now();
        Self {
            identity,
            business_details,
            status: PartyStatus::Enabled,
            local_access_infos: Vec::new(),
            remote_access_infos: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Registered iff at least one outbound link has a negotiated version.
    pub fn is_registered(&self) -> bool {
        self.remote_access_infos.iter().any(|r| r.link.is_resolved())
    }

    pub fn registration_state(&self) -> RegistrationState {
        if self.is_registered() {
            RegistrationState::Registered
        } else {
            RegistrationState::PreRegistered
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.status == PartyStatus::Enabled
    }

    pub fn local_access(&self, token: &str) -> Option<&LocalAccessInfo> {
        self.local_access_infos.iter().find(|l| l.token == token)
    }

    /// Outbound access used for calls to this party: the first resolved one,
    /// otherwise the first pre-shared one.
    pub fn outbound(&self) -> Option<&RemoteAccessInfo> {
        self.remote_access_infos
            .iter()
            .find(|r| r.link.is_resolved())
            .or_else(|| self.remote_access_infos.first())
    }

    pub fn local_tokens(&self) -> impl Iterator<Item = &str> {
        self.local_access_infos.iter().map(|l| l.token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party() -> RemoteParty {
        RemoteParty::new(
            PartyIdentity::new("DE", "GEF", Role::Emsp),
            BusinessDetails {
                name: "Gefion".into(),
                website: None,
            },
        )
    }

    #[test]
    fn new_party_is_pre_registered() {
        let mut p = party();
        assert_eq!(p.registration_state(), RegistrationState::PreRegistered);

        p.remote_access_infos.push(RemoteAccessInfo {
            token: "remote".into(),
            link: RemoteLink::Unresolved {
                versions_url: Some("https://emsp/versions".into()),
            },
            status: RemoteStatus::None,
        });
        assert!(!p.is_registered());
    }

    #[test]
    fn resolved_link_marks_party_registered() {
        let mut p = party();
        p.remote_access_infos.push(RemoteAccessInfo {
            token: "remote".into(),
            link: RemoteLink::Resolved {
                versions_url: "https://emsp/versions".into(),
                version: VersionNumber::V211,
                credentials_url: "https://emsp/2.1.1/credentials".into(),
            },
            status: RemoteStatus::Online,
        });
        assert_eq!(p.registration_state(), RegistrationState::Registered);
        assert_eq!(p.outbound().map(|r| r.token.as_str()), Some("remote"));
    }

    #[test]
    fn outbound_prefers_resolved_link() {
        let mut p = party();
        p.remote_access_infos.push(RemoteAccessInfo {
            token: "seed".into(),
            link: RemoteLink::Unresolved { versions_url: None },
            status: RemoteStatus::None,
        });
        p.remote_access_infos.push(RemoteAccessInfo {
            token: "rotated".into(),
            link: RemoteLink::Resolved {
                versions_url: "https://cpo/versions".into(),
                version: VersionNumber::V22,
                credentials_url: "https://cpo/2.2/credentials".into(),
            },
            status: RemoteStatus::Online,
        });
        assert_eq!(p.outbound().map(|r| r.token.as_str()), Some("rotated"));
    }

    #[test]
    fn role_parsing_and_counterpart() {
        assert_eq!("emsp".parse::<Role>(), Ok(Role::Emsp));
        assert!("hub".parse::<Role>().is_err());
        assert_eq!(Role::Cpo.counterpart(), Role::Emsp);
        assert_eq!(
            PartyIdentity::new("NL", "TNM", Role::Cpo).to_string(),
            "NL*TNM (CPO)"
        );
    }
}
