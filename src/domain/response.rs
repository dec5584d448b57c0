//! OCPI response envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status codes carried in the envelope, independent of the HTTP status.
pub mod status {
    pub const SUCCESS: u16 = 1000;
    pub const CLIENT_ERROR: u16 = 2000;
    pub const INVALID_PARAMETERS: u16 = 2001;
    pub const SERVER_ERROR: u16 = 3000;
    pub const UNABLE_TO_USE_CLIENT_API: u16 = 3001;
    pub const UNSUPPORTED_VERSION: u16 = 3002;

    pub fn is_success(code: u16) -> bool {
        (1000..2000).contains(&code)
    }
}

/// Every OCPI response, success or failure, is wrapped in this envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OcpiResponse<T> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> OcpiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status_code: status::SUCCESS,
            status_message: Some("Success".to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Success without payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            status_code: status::SUCCESS,
            status_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            data: None,
            status_code,
            status_message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        status::is_success(self.status_code)
    }
}
