//! Versions handlers

use std::sync::Arc;

use axum::extract::{Path, State};

use crate::domain::{
    Endpoint, OcpiResponse, Version, VersionDetails, VersionNumber, CREDENTIALS_MODULE,
};
use crate::interfaces::http::envelope::{ok, ApiResult};
use crate::interfaces::http::modules::credentials::parse_version;

#[derive(Clone)]
pub struct VersionsState {
    /// Public base URL, without trailing slash
    pub base_url: Arc<str>,
}

impl VersionsState {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    pub fn versions_url(&self) -> String {
        format!("{}/ocpi/versions", self.base_url)
    }

    fn version_url(&self, version: VersionNumber) -> String {
        format!("{}/ocpi/{}", self.base_url, version)
    }

    pub fn versions(&self) -> Vec<Version> {
        VersionNumber::SUPPORTED
            .iter()
            .map(|v| Version {
                version: v.to_string(),
                url: self.version_url(*v),
            })
            .collect()
    }

    pub fn details(&self, version: VersionNumber) -> VersionDetails {
        VersionDetails {
            version: version.to_string(),
            endpoints: vec![Endpoint {
                identifier: CREDENTIALS_MODULE.to_string(),
                url: format!("{}/{}", self.version_url(version), CREDENTIALS_MODULE),
            }],
        }
    }
}

#[utoipa::path(
    get,
    path = "/ocpi/versions",
    tag = "Versions",
    responses(
        (status = 200, description = "Supported OCPI versions", body = OcpiResponse<Vec<Version>>),
        (status = 403, description = "Invalid or blocked token")
    ),
    security(("token" = []))
)]
pub async fn list_versions(State(state): State<VersionsState>) -> ApiResult<Vec<Version>> {
    ok(state.versions())
}

#[utoipa::path(
    get,
    path = "/ocpi/{version}",
    tag = "Versions",
    params(("version" = String, Path, description = "OCPI version, e.g. 2.2")),
    responses(
        (status = 200, description = "Endpoints of this version", body = OcpiResponse<VersionDetails>),
        (status = 403, description = "Invalid or blocked token"),
        (status = 404, description = "Unsupported version")
    ),
    security(("token" = []))
)]
pub async fn version_details(
    State(state): State<VersionsState>,
    Path(version): Path<String>,
) -> ApiResult<VersionDetails> {
    ok(state.details(parse_version(&version)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_point_at_our_base_url() {
        let state = VersionsState::new("https://ocpi.example.com/");
        assert_eq!(state.versions_url(), "https://ocpi.example.com/ocpi/versions");

        let versions = state.versions();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[1].url, "https://ocpi.example.com/ocpi/2.2");

        let details = state.details(VersionNumber::V211);
        assert_eq!(details.version, "2.1.1");
        assert_eq!(
            details.endpoint(CREDENTIALS_MODULE),
            Some("https://ocpi.example.com/ocpi/2.1.1/credentials")
        );
    }
}
