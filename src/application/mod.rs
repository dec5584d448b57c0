pub mod admin;
pub mod gate;
pub mod ports;
pub mod registration;
pub mod store;
pub mod tokens;

// Re-export key types for convenience
pub use admin::{NewRemoteParty, PartyAdministration};
pub use gate::{AuthorizationGate, Grant, Resource, Verb};
pub use ports::{CredentialsApi, ResolvedVersion, VersionResolver};
pub use registration::{CredentialsService, LocalParty, RegistrationClient, RemotePartyClient};
pub use store::{PartyStore, SharedPartyStore};
pub use tokens::{mask_token, TokenGenerator};
