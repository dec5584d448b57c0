//! RemoteParty aggregate
//!
//! Identity, access infos in both directions and the repository interface.

pub mod model;
pub mod repository;

pub use model::{
    AccessStatus, BusinessDetails, LocalAccessInfo, PartyIdentity, PartyStatus, RegistrationState,
    RemoteAccessInfo, RemoteLink, RemoteParty, RemoteStatus, Role,
};
pub use repository::PartyRepository;
