//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::modules::admin::{self, AdminKey, AdminState};
use super::modules::credentials::{self, CredentialsState};
use super::modules::gate::{gate_middleware, GateState};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use super::modules::request_id::request_id_middleware;
use super::modules::versions::{self, VersionsState};
use crate::application::{
    AuthorizationGate, CredentialsService, PartyAdministration, PartyStore, RegistrationClient,
    Resource,
};
use crate::domain::{
    AccessStatus, BusinessDetails, Credentials, Endpoint, OcpiResponse, PartyStatus,
    RegistrationState, RemoteStatus, Role, Version, VersionDetails, VersionNumber,
};

/// Everything the routes need, assembled by the server runtime.
pub struct ApiContext {
    pub store: Arc<PartyStore>,
    pub gate: Arc<AuthorizationGate>,
    pub credentials: Arc<CredentialsService>,
    pub registration: Arc<RegistrationClient>,
    pub admin: Arc<PartyAdministration>,
    pub admin_key: AdminKey,
    /// Public base URL our documents link to
    pub base_url: String,
    pub prometheus: Option<PrometheusHandle>,
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("OCPI credentials token, sent as `Authorization: Token <token>`"))
                        .build(),
                ),
            );
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        versions::list_versions,
        versions::version_details,
        credentials::get_credentials,
        credentials::post_credentials,
        credentials::put_credentials,
        credentials::delete_credentials,
        admin::list_parties,
        admin::add_party,
        admin::remove_party,
        admin::set_party_status,
        admin::set_token_status,
        admin::register_party,
        admin::update_party,
        admin::unregister_party,
    ),
    components(
        schemas(
            OcpiResponse<Credentials>,
            OcpiResponse<VersionDetails>,
            Credentials,
            BusinessDetails,
            Version,
            VersionDetails,
            VersionNumber,
            Endpoint,
            Role,
            PartyStatus,
            AccessStatus,
            RemoteStatus,
            RegistrationState,
            health::HealthResponse,
            admin::PartyDto,
            admin::LocalTokenDto,
            admin::RemoteTokenDto,
            admin::AddPartyRequest,
            admin::AddPartyResponse,
            admin::PartyStatusRequest,
            admin::TokenStatusRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Versions", description = "OCPI versions and version details"),
        (name = "Credentials", description = "OCPI credentials handshake: registration, rotation, removal"),
        (name = "Admin", description = "Remote party and token management")
    ),
    info(
        title = "Texnouz OCPI Node API",
        version = "1.0.0",
        description = "OCPI credentials module with remote party registry",
        license(name = "MIT"),
        contact(name = "Texnouz", email = "support@texnouz.com")
    )
)]
pub struct ApiDoc;

pub fn create_api_router(ctx: ApiContext) -> Router {
    let versions_state = VersionsState::new(&ctx.base_url);

    // ── OCPI: every route behind the authorization gate ─────────
    let credentials_routes = Router::new()
        .route(
            "/ocpi/{version}/credentials",
            get(credentials::get_credentials)
                .post(credentials::post_credentials)
                .put(credentials::put_credentials)
                .delete(credentials::delete_credentials),
        )
        .layer(middleware::from_fn_with_state(
            GateState::new(ctx.gate.clone(), Resource::Credentials),
            gate_middleware,
        ))
        .with_state(CredentialsState {
            service: ctx.credentials.clone(),
        });

    let versions_routes = Router::new()
        .route("/ocpi/versions", get(versions::list_versions))
        .route("/ocpi/{version}", get(versions::version_details))
        .layer(middleware::from_fn_with_state(
            GateState::new(ctx.gate.clone(), Resource::Versions),
            gate_middleware,
        ))
        .with_state(versions_state);

    // ── Admin (X-API-Key) ───────────────────────────────────────
    let admin_routes = Router::new()
        .route("/parties", get(admin::list_parties).post(admin::add_party))
        .route(
            "/parties/{country_code}/{party_id}/{role}",
            delete(admin::remove_party),
        )
        .route(
            "/parties/{country_code}/{party_id}/{role}/status",
            put(admin::set_party_status),
        )
        .route(
            "/parties/{country_code}/{party_id}/{role}/register",
            post(admin::register_party),
        )
        .route(
            "/parties/{country_code}/{party_id}/{role}/update",
            post(admin::update_party),
        )
        .route(
            "/parties/{country_code}/{party_id}/{role}/unregister",
            post(admin::unregister_party),
        )
        .route("/tokens/{token}/status", put(admin::set_token_status))
        .layer(middleware::from_fn_with_state(
            ctx.admin_key.clone(),
            admin::admin_key_middleware,
        ))
        .with_state(AdminState {
            admin: ctx.admin.clone(),
            registration: ctx.registration.clone(),
        });

    let mut ops_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState {
            store: ctx.store.clone(),
            started_at: Instant::now(),
        });
    if let Some(handle) = ctx.prometheus {
        ops_routes = ops_routes.merge(
            Router::new()
                .route("/metrics", get(prometheus_metrics))
                .with_state(MetricsState { handle }),
        );
    }

    // OCPI routes answer OPTIONS through the gate; CORS is only layered on
    // the operator-facing routes.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    let operator_routes = Router::new()
        .merge(swagger_routes)
        .merge(ops_routes)
        .nest("/admin", admin_routes)
        .layer(cors);

    Router::new()
        .merge(versions_routes)
        .merge(credentials_routes)
        .merge(operator_routes)
        // Route layer so the matched path is known when labelling
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
