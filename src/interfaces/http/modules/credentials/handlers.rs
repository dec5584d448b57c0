//! Credentials handlers
//!
//! The gate middleware has already decided who the caller is; handlers
//! receive that decision as a [`Grant`] extension.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::application::{CredentialsService, Grant};
use crate::domain::{Credentials, DomainError, OcpiResponse, VersionNumber};
use crate::interfaces::http::common::ValidatedJson;
use crate::interfaces::http::envelope::{ok, ApiResult};

#[derive(Clone)]
pub struct CredentialsState {
    pub service: Arc<CredentialsService>,
}

pub(crate) fn parse_version(version: &str) -> Result<VersionNumber, DomainError> {
    version
        .parse()
        .map_err(|_| DomainError::UnsupportedVersion(version.to_string()))
}

fn caller_token(grant: &Grant) -> Result<&str, DomainError> {
    match grant {
        Grant::Party { token, .. } => Ok(token),
        _ => Err(DomainError::UnknownToken),
    }
}

#[utoipa::path(
    get,
    path = "/ocpi/{version}/credentials",
    tag = "Credentials",
    params(("version" = String, Path, description = "OCPI version, e.g. 2.2")),
    responses(
        (status = 200, description = "Our credentials for the caller, or the public discovery view", body = OcpiResponse<Credentials>),
        (status = 403, description = "Invalid or blocked token"),
        (status = 404, description = "Unsupported version")
    ),
    security(("token" = []), ())
)]
pub async fn get_credentials(
    State(state): State<CredentialsState>,
    Path(version): Path<String>,
    Extension(grant): Extension<Grant>,
) -> ApiResult<Credentials> {
    parse_version(&version)?;
    match &grant {
        Grant::Party { token, .. } => ok(state.service.current(token)),
        _ => ok(state.service.discovery()),
    }
}

#[utoipa::path(
    post,
    path = "/ocpi/{version}/credentials",
    tag = "Credentials",
    params(("version" = String, Path, description = "OCPI version, e.g. 2.2")),
    request_body = Credentials,
    responses(
        (status = 200, description = "Registered; data holds the token to use from now on", body = OcpiResponse<Credentials>),
        (status = 400, description = "Identity mismatch, malformed payload or no compatible version"),
        (status = 403, description = "Invalid or blocked token"),
        (status = 502, description = "Caller's versions endpoint unreachable")
    ),
    security(("token" = []))
)]
pub async fn post_credentials(
    State(state): State<CredentialsState>,
    Path(version): Path<String>,
    Extension(grant): Extension<Grant>,
    ValidatedJson(submitted): ValidatedJson<Credentials>,
) -> ApiResult<Credentials> {
    parse_version(&version)?;
    let token = caller_token(&grant)?;
    ok(state.service.register(token, submitted).await?)
}

#[utoipa::path(
    put,
    path = "/ocpi/{version}/credentials",
    tag = "Credentials",
    params(("version" = String, Path, description = "OCPI version, e.g. 2.2")),
    request_body = Credentials,
    responses(
        (status = 200, description = "Rotated; data holds the token to use from now on", body = OcpiResponse<Credentials>),
        (status = 400, description = "Country code or party id changed"),
        (status = 405, description = "Not yet registered")
    ),
    security(("token" = []))
)]
pub async fn put_credentials(
    State(state): State<CredentialsState>,
    Path(version): Path<String>,
    Extension(grant): Extension<Grant>,
    ValidatedJson(submitted): ValidatedJson<Credentials>,
) -> ApiResult<Credentials> {
    parse_version(&version)?;
    let token = caller_token(&grant)?;
    ok(state.service.update(token, submitted).await?)
}

#[utoipa::path(
    delete,
    path = "/ocpi/{version}/credentials",
    tag = "Credentials",
    params(("version" = String, Path, description = "OCPI version, e.g. 2.2")),
    responses(
        (status = 200, description = "Relationship removed", body = OcpiResponse<String>),
        (status = 403, description = "Invalid or blocked token"),
        (status = 405, description = "Not yet registered")
    ),
    security(("token" = []))
)]
pub async fn delete_credentials(
    State(state): State<CredentialsState>,
    Path(version): Path<String>,
    Extension(grant): Extension<Grant>,
) -> Result<Json<OcpiResponse<()>>, DomainError> {
    parse_version(&version)?;
    let token = state.service.unregister(caller_token(&grant)?).await?;
    Ok(Json(OcpiResponse::message(format!(
        "The given access token '{}' was deleted!",
        token
    ))))
}
