//! Database entities module

pub mod local_access_info;
pub mod remote_access_info;
pub mod remote_party;

pub use local_access_info::Entity as LocalAccessInfo;
pub use remote_access_info::Entity as RemoteAccessInfo;
pub use remote_party::Entity as RemoteParty;
