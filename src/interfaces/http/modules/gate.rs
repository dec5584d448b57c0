//! Authorization gate middleware for OCPI routes
//!
//! Resolves the `Authorization: Token <token>` header through the
//! [`AuthorizationGate`], answers OPTIONS itself and hands the resulting
//! [`Grant`] to the handler through request extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::{AuthorizationGate, Grant, Resource, Verb};
use crate::domain::{DomainError, OcpiResponse};
use crate::interfaces::http::envelope::http_status;

#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<AuthorizationGate>,
    pub resource: Resource,
}

impl GateState {
    pub fn new(gate: Arc<AuthorizationGate>, resource: Resource) -> Self {
        Self { gate, resource }
    }
}

/// Token from `Authorization: Token <t>` (`Bearer` is accepted as well).
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") {
        let token = token.trim();
        (!token.is_empty()).then(|| token.to_string())
    } else {
        None
    }
}

fn verb_of(method: &Method) -> Option<Verb> {
    Some(match *method {
        Method::OPTIONS => Verb::Options,
        Method::GET => Verb::Get,
        Method::POST => Verb::Post,
        Method::PUT => Verb::Put,
        Method::PATCH => Verb::Patch,
        Method::DELETE => Verb::Delete,
        _ => return None,
    })
}

fn allow_header(allowed: &[Verb]) -> Option<HeaderValue> {
    let list = allowed
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    HeaderValue::from_str(&list).ok()
}

fn with_allow(mut response: Response, allowed: &[Verb]) -> Response {
    if let Some(value) = allow_header(allowed) {
        let headers = response.headers_mut();
        headers.insert(header::ALLOW, value.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
    }
    response
}

/// Success envelope listing the permitted methods.
fn options_response(allowed: &[Verb]) -> Response {
    let methods: Vec<String> = allowed.iter().map(|v| v.as_str().to_string()).collect();
    (StatusCode::OK, Json(OcpiResponse::success(methods))).into_response()
}

pub async fn gate_middleware(
    State(state): State<GateState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers());
    let Some(verb) = verb_of(request.method()) else {
        let allowed = state.gate.allowed_methods(state.resource, token.as_deref());
        let error = DomainError::MethodNotAllowed(request.method().to_string());
        return with_allow(error.into_response(), &allowed);
    };

    match state.gate.authorize(state.resource, verb, token.as_deref()) {
        Ok(Grant::Options(allowed)) => with_allow(options_response(&allowed), &allowed),
        Ok(grant) => {
            request.extensions_mut().insert(grant);
            next.run(request).await
        }
        Err(error) => {
            let not_allowed = http_status(&error) == StatusCode::METHOD_NOT_ALLOWED;
            let response = error.into_response();
            if not_allowed {
                let allowed = state.gate.allowed_methods(state.resource, token.as_deref());
                with_allow(response, &allowed)
            } else {
                response
            }
        }
    }
}
