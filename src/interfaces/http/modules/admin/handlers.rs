//! Admin handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;

use super::dto::{
    AddPartyRequest, AddPartyResponse, PartyDto, PartyStatusRequest, TokenStatusRequest,
};
use crate::application::{NewRemoteParty, PartyAdministration, RegistrationClient};
use crate::domain::{DomainError, OcpiResponse, PartyIdentity, Role};
use crate::interfaces::http::common::ValidatedJson;
use crate::interfaces::http::envelope::{ok, ApiResult};

#[derive(Clone)]
pub struct AdminState {
    pub admin: Arc<PartyAdministration>,
    pub registration: Arc<RegistrationClient>,
}

fn identity(country_code: String, party_id: String, role: String) -> Result<PartyIdentity, DomainError> {
    let role: Role = role
        .parse()
        .map_err(|_| DomainError::PartyNotFound(format!("unknown role '{}'", role)))?;
    Ok(PartyIdentity::new(country_code, party_id, role))
}

#[utoipa::path(
    get,
    path = "/admin/parties",
    tag = "Admin",
    responses((status = 200, description = "All remote parties", body = OcpiResponse<Vec<PartyDto>>)),
    security(("api_key" = []))
)]
pub async fn list_parties(State(state): State<AdminState>) -> ApiResult<Vec<PartyDto>> {
    ok(state.admin.list().iter().map(PartyDto::from).collect())
}

#[utoipa::path(
    post,
    path = "/admin/parties",
    tag = "Admin",
    request_body = AddPartyRequest,
    responses(
        (status = 200, description = "Party created in pre-registered state", body = OcpiResponse<AddPartyResponse>),
        (status = 400, description = "Invalid request")
    ),
    security(("api_key" = []))
)]
pub async fn add_party(
    State(state): State<AdminState>,
    ValidatedJson(req): ValidatedJson<AddPartyRequest>,
) -> ApiResult<AddPartyResponse> {
    let party = state
        .admin
        .add_remote_party(
            PartyIdentity::new(req.country_code, req.party_id, req.role),
            NewRemoteParty {
                business_details: req.business_details.unwrap_or_default(),
                token: req.token,
                remote_token: req.remote_token,
                remote_versions_url: req.remote_versions_url,
            },
        )
        .await?;
    let token = party
        .local_access_infos
        .first()
        .map(|l| l.token.clone())
        .unwrap_or_default();
    ok(AddPartyResponse {
        party: PartyDto::from(&party),
        token,
    })
}

#[utoipa::path(
    delete,
    path = "/admin/parties/{country_code}/{party_id}/{role}",
    tag = "Admin",
    params(
        ("country_code" = String, Path),
        ("party_id" = String, Path),
        ("role" = String, Path, description = "CPO or EMSP")
    ),
    responses(
        (status = 200, description = "Party and all its tokens removed", body = OcpiResponse<PartyDto>),
        (status = 404, description = "Unknown party")
    ),
    security(("api_key" = []))
)]
pub async fn remove_party(
    State(state): State<AdminState>,
    Path((country_code, party_id, role)): Path<(String, String, String)>,
) -> ApiResult<PartyDto> {
    let identity = identity(country_code, party_id, role)?;
    let removed = state.admin.remove(&identity).await?;
    ok(PartyDto::from(&removed))
}

#[utoipa::path(
    put,
    path = "/admin/parties/{country_code}/{party_id}/{role}/status",
    tag = "Admin",
    params(
        ("country_code" = String, Path),
        ("party_id" = String, Path),
        ("role" = String, Path, description = "CPO or EMSP")
    ),
    request_body = PartyStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OcpiResponse<PartyDto>),
        (status = 404, description = "Unknown party")
    ),
    security(("api_key" = []))
)]
pub async fn set_party_status(
    State(state): State<AdminState>,
    Path((country_code, party_id, role)): Path<(String, String, String)>,
    Json(req): Json<PartyStatusRequest>,
) -> ApiResult<PartyDto> {
    let identity = identity(country_code, party_id, role)?;
    let party = state.admin.set_status(&identity, req.status).await?;
    ok(PartyDto::from(&party))
}

#[utoipa::path(
    put,
    path = "/admin/tokens/{token}/status",
    tag = "Admin",
    params(("token" = String, Path, description = "Inbound token")),
    request_body = TokenStatusRequest,
    responses(
        (status = 200, description = "Token status changed", body = OcpiResponse<PartyDto>),
        (status = 403, description = "Unknown token")
    ),
    security(("api_key" = []))
)]
pub async fn set_token_status(
    State(state): State<AdminState>,
    Path(token): Path<String>,
    Json(req): Json<TokenStatusRequest>,
) -> ApiResult<PartyDto> {
    let party = state.admin.set_token_status(&token, req.status).await?;
    ok(PartyDto::from(&party))
}

#[utoipa::path(
    post,
    path = "/admin/parties/{country_code}/{party_id}/{role}/register",
    tag = "Admin",
    params(
        ("country_code" = String, Path),
        ("party_id" = String, Path),
        ("role" = String, Path, description = "CPO or EMSP")
    ),
    responses(
        (status = 200, description = "Registered with the counter-party", body = OcpiResponse<PartyDto>),
        (status = 502, description = "Counter-party unreachable or refused")
    ),
    security(("api_key" = []))
)]
pub async fn register_party(
    State(state): State<AdminState>,
    Path((country_code, party_id, role)): Path<(String, String, String)>,
) -> ApiResult<PartyDto> {
    let identity = identity(country_code, party_id, role)?;
    let party = state.registration.register(&identity).await?;
    ok(PartyDto::from(&party))
}

#[utoipa::path(
    post,
    path = "/admin/parties/{country_code}/{party_id}/{role}/update",
    tag = "Admin",
    params(
        ("country_code" = String, Path),
        ("party_id" = String, Path),
        ("role" = String, Path, description = "CPO or EMSP")
    ),
    responses(
        (status = 200, description = "Credentials rotated on both sides", body = OcpiResponse<PartyDto>),
        (status = 405, description = "Not registered yet")
    ),
    security(("api_key" = []))
)]
pub async fn update_party(
    State(state): State<AdminState>,
    Path((country_code, party_id, role)): Path<(String, String, String)>,
) -> ApiResult<PartyDto> {
    let identity = identity(country_code, party_id, role)?;
    let party = state.registration.update(&identity).await?;
    ok(PartyDto::from(&party))
}

#[utoipa::path(
    post,
    path = "/admin/parties/{country_code}/{party_id}/{role}/unregister",
    tag = "Admin",
    params(
        ("country_code" = String, Path),
        ("party_id" = String, Path),
        ("role" = String, Path, description = "CPO or EMSP")
    ),
    responses(
        (status = 200, description = "Unregistered and removed locally", body = OcpiResponse<String>),
        (status = 405, description = "Not registered yet")
    ),
    security(("api_key" = []))
)]
pub async fn unregister_party(
    State(state): State<AdminState>,
    Path((country_code, party_id, role)): Path<(String, String, String)>,
) -> Result<Json<OcpiResponse<()>>, DomainError> {
    let identity = identity(country_code, party_id, role)?;
    state.registration.unregister(&identity).await?;
    Ok(Json(OcpiResponse::message(format!("{} unregistered", identity))))
}
