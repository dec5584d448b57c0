//! Domain errors

use thiserror::Error;

/// Errors raised by the token registry, the authorization gate and the
/// credentials handshake. Every variant is turned into a response envelope at
/// the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid or blocked access token!")]
    UnknownToken,

    #[error("The given access token '{0}' is blocked!")]
    BlockedToken(String),

    #[error("You need to be registered before trying to invoke this protected method!")]
    RegistrationRequired,

    #[error("The given access token '{0}' is not yet registered!")]
    NotYetRegistered(String),

    #[error("Updating the {field} from '{old}' to '{new}' is not allowed!")]
    IdentityImmutable {
        field: &'static str,
        old: String,
        new: String,
    },

    #[error("Unable to reach the remote party: {0}")]
    RemoteUnreachable(String),

    #[error("No compatible OCPI version: {0}")]
    NoCompatibleVersion(String),

    #[error("Malformed credentials: {0}")]
    MalformedCredentials(String),

    #[error("Remote party not found: {0}")]
    PartyNotFound(String),

    #[error("Unsupported OCPI version: {0}")]
    UnsupportedVersion(String),

    #[error("Method {0} is not allowed on this resource")]
    MethodNotAllowed(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// OCPI status code carried in the response envelope.
    pub fn status_code(&self) -> u16 {
        use crate::domain::response::status;
        match self {
            DomainError::MalformedCredentials(_) => status::INVALID_PARAMETERS,
            DomainError::RemoteUnreachable(_) => status::UNABLE_TO_USE_CLIENT_API,
            DomainError::NoCompatibleVersion(_) => status::UNSUPPORTED_VERSION,
            DomainError::Storage(_) => status::SERVER_ERROR,
            _ => status::CLIENT_ERROR,
        }
    }

    /// Whether the failure happened while talking to the counter-party.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            DomainError::RemoteUnreachable(_) | DomainError::NoCompatibleVersion(_)
        )
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_message_names_old_and_new_values() {
        let err = DomainError::IdentityImmutable {
            field: "country code",
            old: "DE".into(),
            new: "NL".into(),
        };
        assert_eq!(
            err.to_string(),
            "Updating the country code from 'DE' to 'NL' is not allowed!"
        );
    }

    #[test]
    fn token_messages_quote_the_token() {
        assert_eq!(
            DomainError::BlockedToken("abc".into()).to_string(),
            "The given access token 'abc' is blocked!"
        );
        assert_eq!(
            DomainError::NotYetRegistered("abc".into()).to_string(),
            "The given access token 'abc' is not yet registered!"
        );
    }
}
