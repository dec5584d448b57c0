//! Application configuration loaded from a TOML file
//!
//! Every section and field has a default, so a missing file or a partial
//! file both yield a usable configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{BusinessDetails, PartyIdentity, Role};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub party: PartyConfig,
    pub registration: RegistrationConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL counter-parties use to reach us; derived from the bound
    /// address when absent
    pub public_url: Option<String>,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: None,
            shutdown_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite://./ocpi.db?mode=rwc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "texnouz_ocpi=debug"
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Our own identity towards counter-parties
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    pub country_code: String,
    pub party_id: String,
    pub role: Role,
    pub name: String,
    pub website: Option<String>,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            country_code: "UZ".to_string(),
            party_id: "TNZ".to_string(),
            role: Role::Cpo,
            name: "Texnouz".to_string(),
            website: None,
        }
    }
}

impl PartyConfig {
    pub fn identity(&self) -> PartyIdentity {
        PartyIdentity::new(&self.country_code, &self.party_id, self.role)
    }

    pub fn business_details(&self) -> BusinessDetails {
        BusinessDetails {
            name: self.name.clone(),
            website: self.website.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Timeout for each outbound call during a handshake, in seconds
    pub timeout_secs: u64,
    /// Serve our public credentials to callers without a known token
    pub anonymous_discovery: bool,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            anonymous_discovery: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Key expected in the X-API-Key header; the admin API is closed when unset
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let party = &self.party;
        if party.country_code.len() != 2 {
            return Err(ConfigError::Invalid(format!(
                "party.country_code must have 2 characters, got '{}'",
                party.country_code
            )));
        }
        if party.party_id.len() != 3 {
            return Err(ConfigError::Invalid(format!(
                "party.party_id must have 3 characters, got '{}'",
                party.party_id
            )));
        }
        if party.name.is_empty() {
            return Err(ConfigError::Invalid("party.name must not be empty".into()));
        }
        if self.registration.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "registration.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Base URL for links we hand out, without trailing slash.
    pub fn public_url(&self) -> String {
        match &self.server.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.server.host, self.server.port),
        }
    }
}

/// `<config dir>/texnouz-ocpi/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("texnouz-ocpi")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9090

            [party]
            country_code = "DE"
            party_id = "GEF"
            role = "EMSP"
            name = "Gefion"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.party.role, Role::Emsp);
        assert_eq!(config.registration.timeout_secs, 10);
        assert!(config.registration.anonymous_discovery);
        assert!(config.admin.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_identity_is_rejected() {
        let mut config = AppConfig::default();
        config.party.party_id = "TOOLONG".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn public_url_falls_back_to_bind_address() {
        let mut config = AppConfig::default();
        assert_eq!(config.public_url(), "http://0.0.0.0:8080");
        config.server.public_url = Some("https://ocpi.example.com/".into());
        assert_eq!(config.public_url(), "https://ocpi.example.com");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/texnouz-ocpi.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
