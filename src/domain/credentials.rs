//! Credentials payload exchanged during the registration handshake

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::party::{BusinessDetails, PartyIdentity, Role};

/// Token rendered in the anonymous discovery response.
pub const DISCOVERY_TOKEN: &str = "*";

/// Credentials object: the token the receiver must use to call the sender,
/// plus the sender's versions URL and identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Credentials {
    #[validate(length(min = 1, max = 64))]
    pub token: String,
    /// Versions endpoint of the sender
    #[validate(url)]
    pub url: String,
    #[validate(nested)]
    pub business_details: BusinessDetails,
    /// ISO-3166 alpha-2 country code
    #[validate(length(equal = 2))]
    pub country_code: String,
    #[validate(length(equal = 3))]
    pub party_id: String,
}

impl Credentials {
    /// Identity of the sender, given the role it plays.
    pub fn identity(&self, role: Role) -> PartyIdentity {
        PartyIdentity::new(self.country_code.clone(), self.party_id.clone(), role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            token: "emsp-tok".into(),
            url: "https://emsp.example.com/ocpi/versions".into(),
            business_details: BusinessDetails {
                name: "Gefion".into(),
                website: Some("https://gefion.example.com".into()),
            },
            country_code: "DE".into(),
            party_id: "GEF".into(),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(credentials().validate().is_ok());
    }

    #[test]
    fn rejects_bad_identity_fields() {
        let mut c = credentials();
        c.country_code = "DEU".into();
        c.party_id = "G".into();
        let errors = c.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("country_code"));
        assert!(fields.contains_key("party_id"));
    }

    #[test]
    fn rejects_empty_token_and_bad_url() {
        let mut c = credentials();
        c.token = String::new();
        c.url = "not a url".into();
        assert!(c.validate().is_err());
    }

    #[test]
    fn parses_wire_shape() {
        let json = serde_json::json!({
            "token": "emsp-tok",
            "url": "https://emsp.example.com/ocpi/versions",
            "business_details": { "name": "Gefion" },
            "country_code": "DE",
            "party_id": "GEF"
        });
        let c: Credentials = serde_json::from_value(json).unwrap();
        assert_eq!(c.identity(Role::Emsp), PartyIdentity::new("DE", "GEF", Role::Emsp));
        assert_eq!(c.business_details.website, None);
    }
}
