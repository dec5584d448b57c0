//! Credentials handshake
//!
//! - `server`: inbound POST / PUT / DELETE on our credentials module
//! - `client`: outbound registration, rotation and de-registration towards a
//!   counter-party, plus [`RemotePartyClient`] handles

pub mod client;
pub mod server;

pub use client::{RegistrationClient, RemotePartyClient};
pub use server::CredentialsService;

use crate::domain::{BusinessDetails, Credentials, PartyIdentity};

/// Our own identity as presented to counter-parties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalParty {
    pub identity: PartyIdentity,
    pub business_details: BusinessDetails,
    /// Absolute URL of our versions document
    pub versions_url: String,
}

impl LocalParty {
    /// Our credentials object carrying `token` for the receiver to use.
    pub fn credentials(&self, token: &str) -> Credentials {
        Credentials {
            token: token.to_string(),
            url: self.versions_url.clone(),
            business_details: self.business_details.clone(),
            country_code: self.identity.country_code.clone(),
            party_id: self.identity.party_id.clone(),
        }
    }
}

/// Reject any attempt to change the counter-party's country code or party id.
pub(crate) fn ensure_same_identity(
    known: &PartyIdentity,
    submitted: &Credentials,
) -> crate::domain::DomainResult<()> {
    use crate::domain::DomainError;

    if known.country_code != submitted.country_code {
        return Err(DomainError::IdentityImmutable {
            field: "country code",
            old: known.country_code.clone(),
            new: submitted.country_code.clone(),
        });
    }
    if known.party_id != submitted.party_id {
        return Err(DomainError::IdentityImmutable {
            field: "party identification",
            old: known.party_id.clone(),
            new: submitted.party_id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing;
