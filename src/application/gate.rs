//! Authorization gate
//!
//! Decides, ahead of every OCPI handler, what the bearer of a token may do.
//! OPTIONS is always answered, with the method set the caller would be
//! granted, so a counter-party can discover its rights before
//! authenticating.
//!
//! [`Resource::Module`] carries the rule for every other OCPI module
//! (registered parties only, all verbs including PATCH). No such module is
//! mounted yet; a new one gets it by layering `gate_middleware` with
//! `Resource::Module` on its routes.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::application::store::PartyStore;
use crate::domain::{AccessStatus, DomainError, DomainResult, RemoteParty};

/// What a request is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The credentials module (handshake)
    Credentials,
    /// Versions list and version details
    Versions,
    /// Any other protocol module
    Module,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Options,
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::Options,
        Verb::Get,
        Verb::Post,
        Verb::Put,
        Verb::Patch,
        Verb::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Options => "OPTIONS",
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller classification after token resolution.
#[derive(Debug, Clone)]
enum Caller {
    Anonymous,
    Blocked(String),
    PreRegistered { party: RemoteParty, token: String },
    Registered { party: RemoteParty, token: String },
}

/// Outcome of a successful gate decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Answer the OPTIONS request with this method set
    Options(Vec<Verb>),
    /// Serve the public discovery payload
    Discovery,
    /// Proceed on behalf of `party`
    Party { party: RemoteParty, token: String },
}

pub struct AuthorizationGate {
    store: Arc<PartyStore>,
    anonymous_discovery: bool,
}

impl AuthorizationGate {
    pub fn new(store: Arc<PartyStore>, anonymous_discovery: bool) -> Self {
        Self {
            store,
            anonymous_discovery,
        }
    }

    pub fn authorize(
        &self,
        resource: Resource,
        verb: Verb,
        token: Option<&str>,
    ) -> DomainResult<Grant> {
        let caller = self.classify(token);
        let allowed = self.allowed(resource, &caller);

        if verb == Verb::Options {
            return Ok(Grant::Options(allowed));
        }
        if !allowed.contains(&verb) {
            debug!(?resource, %verb, "Gate rejected request");
            return Err(reject(resource, verb, &caller));
        }

        Ok(match caller {
            Caller::Anonymous | Caller::Blocked(_) => Grant::Discovery,
            Caller::PreRegistered { party, token } | Caller::Registered { party, token } => {
                Grant::Party { party, token }
            }
        })
    }

    /// Methods the holder of `token` may use on `resource`.
    pub fn allowed_methods(&self, resource: Resource, token: Option<&str>) -> Vec<Verb> {
        self.allowed(resource, &self.classify(token))
    }

    fn classify(&self, token: Option<&str>) -> Caller {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Caller::Anonymous;
        };
        let Some(party) = self.store.resolve(token) else {
            return Caller::Anonymous;
        };
        if !party.is_enabled() {
            // a disabled relationship is indistinguishable from an unknown one
            return Caller::Anonymous;
        }
        match party.local_access(token).map(|l| l.status) {
            Some(AccessStatus::Allowed) if party.is_registered() => Caller::Registered {
                party,
                token: token.to_string(),
            },
            Some(AccessStatus::Allowed) => Caller::PreRegistered {
                party,
                token: token.to_string(),
            },
            _ => Caller::Blocked(token.to_string()),
        }
    }

    fn allowed(&self, resource: Resource, caller: &Caller) -> Vec<Verb> {
        use Verb::*;
        match (resource, caller) {
            (Resource::Credentials, Caller::Anonymous | Caller::Blocked(_)) => {
                if self.anonymous_discovery {
                    vec![Options, Get]
                } else {
                    vec![Options]
                }
            }
            (Resource::Credentials, Caller::PreRegistered { .. }) => vec![Options, Get, Post],
            (Resource::Credentials, Caller::Registered { .. }) => {
                vec![Options, Get, Post, Put, Delete]
            }
            (Resource::Versions, Caller::PreRegistered { .. } | Caller::Registered { .. }) => {
                vec![Options, Get]
            }
            (Resource::Module, Caller::Registered { .. }) => Verb::ALL.to_vec(),
            _ => vec![Options],
        }
    }
}

fn reject(resource: Resource, verb: Verb, caller: &Caller) -> DomainError {
    match (resource, caller) {
        (_, Caller::Anonymous) => DomainError::UnknownToken,
        (_, Caller::Blocked(token)) => DomainError::BlockedToken(token.clone()),
        (Resource::Credentials, Caller::PreRegistered { token, .. })
            if matches!(verb, Verb::Put | Verb::Delete) =>
        {
            DomainError::NotYetRegistered(token.clone())
        }
        (Resource::Module, Caller::PreRegistered { .. }) => DomainError::RegistrationRequired,
        _ => DomainError::MethodNotAllowed(verb.to_string()),
    }
}
