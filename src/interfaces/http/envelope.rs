//! Mapping of domain errors onto HTTP responses
//!
//! Every failure leaves the service as an OCPI envelope carrying both the
//! transport status and the protocol `status_code`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::{DomainError, OcpiResponse};

/// Handler result: envelope on success, envelope on error.
pub type ApiResult<T> = Result<Json<OcpiResponse<T>>, DomainError>;

/// Successful envelope wrapping `data`.
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(OcpiResponse::success(data)))
}

pub fn http_status(error: &DomainError) -> StatusCode {
    match error {
        DomainError::UnknownToken
        | DomainError::BlockedToken(_)
        | DomainError::RegistrationRequired
        | DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::NotYetRegistered(_) | DomainError::MethodNotAllowed(_) => {
            StatusCode::METHOD_NOT_ALLOWED
        }
        DomainError::IdentityImmutable { .. }
        | DomainError::MalformedCredentials(_)
        | DomainError::NoCompatibleVersion(_) => StatusCode::BAD_REQUEST,
        DomainError::RemoteUnreachable(_) => StatusCode::BAD_GATEWAY,
        DomainError::UnsupportedVersion(_) | DomainError::PartyNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        DomainError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = http_status(&self);
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        let body = OcpiResponse::<()>::error(self.status_code(), self.to_string());
        (status, Json(body)).into_response()
    }
}
