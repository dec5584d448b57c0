pub mod credentials;
pub mod error;
pub mod party;
pub mod response;
pub mod version;

// Re-export commonly used types
pub use credentials::{Credentials, DISCOVERY_TOKEN};
pub use error::{DomainError, DomainResult};
pub use party::{
    AccessStatus, BusinessDetails, LocalAccessInfo, PartyIdentity, PartyRepository, PartyStatus,
    RegistrationState, RemoteAccessInfo, RemoteLink, RemoteParty, RemoteStatus, Role,
};
pub use response::OcpiResponse;
pub use version::{
    select_mutual_version, Endpoint, Version, VersionDetails, VersionNumber, CREDENTIALS_MODULE,
};
