//! Admin API DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::mask_token;
use crate::domain::{
    AccessStatus, BusinessDetails, PartyStatus, RegistrationState, RemoteLink, RemoteParty,
    RemoteStatus, Role, VersionNumber,
};

/// Inbound token as listed to operators (masked)
#[derive(Debug, Serialize, ToSchema)]
pub struct LocalTokenDto {
    pub token: String,
    pub status: AccessStatus,
}

/// Outbound token and link as listed to operators (token masked)
#[derive(Debug, Serialize, ToSchema)]
pub struct RemoteTokenDto {
    pub token: String,
    pub status: RemoteStatus,
    pub versions_url: Option<String>,
    pub version: Option<VersionNumber>,
    pub credentials_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PartyDto {
    pub country_code: String,
    pub party_id: String,
    pub role: Role,
    pub business_details: BusinessDetails,
    pub status: PartyStatus,
    pub registration_state: RegistrationState,
    pub tokens: Vec<LocalTokenDto>,
    pub remote: Vec<RemoteTokenDto>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&RemoteParty> for PartyDto {
    fn from(party: &RemoteParty) -> Self {
        Self {
            country_code: party.identity.country_code.clone(),
            party_id: party.identity.party_id.clone(),
            role: party.identity.role,
            business_details: party.business_details.clone(),
            status: party.status,
            registration_state: party.registration_state(),
            tokens: party
                .local_access_infos
                .iter()
                .map(|l| LocalTokenDto {
                    token: mask_token(&l.token),
                    status: l.status,
                })
                .collect(),
            remote: party
                .remote_access_infos
                .iter()
                .map(|r| {
                    let (version, credentials_url) = match &r.link {
                        RemoteLink::Resolved {
                            version,
                            credentials_url,
                            ..
                        } => (Some(*version), Some(credentials_url.clone())),
                        RemoteLink::Unresolved { .. } => (None, None),
                    };
                    RemoteTokenDto {
                        token: mask_token(&r.token),
                        status: r.status,
                        versions_url: r.link.versions_url().map(String::from),
                        version,
                        credentials_url,
                    }
                })
                .collect(),
            updated_at: party.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddPartyRequest {
    #[validate(length(equal = 2))]
    pub country_code: String,
    #[validate(length(equal = 3))]
    pub party_id: String,
    pub role: Role,
    #[serde(default)]
    #[validate(nested)]
    pub business_details: Option<BusinessDetails>,
    /// Inbound token the counter-party will present; generated when absent
    #[validate(length(min = 1, max = 64))]
    pub token: Option<String>,
    /// Pre-shared token for registering with the counter-party
    #[validate(length(min = 1, max = 64))]
    pub remote_token: Option<String>,
    #[validate(url)]
    pub remote_versions_url: Option<String>,
}

/// Created party plus its unmasked inbound token, shown once
#[derive(Debug, Serialize, ToSchema)]
pub struct AddPartyResponse {
    pub party: PartyDto,
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PartyStatusRequest {
    pub status: PartyStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenStatusRequest {
    pub status: AccessStatus,
}
