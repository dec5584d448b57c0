//! OCPI protocol versions and the versions / version-details documents

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Endpoint identifier of the credentials module.
pub const CREDENTIALS_MODULE: &str = "credentials";

/// OCPI protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum VersionNumber {
    #[serde(rename = "2.1.1")]
    V211,
    #[serde(rename = "2.2")]
    V22,
}

impl VersionNumber {
    /// All versions this node speaks, oldest first.
    pub const SUPPORTED: [VersionNumber; 2] = [VersionNumber::V211, VersionNumber::V22];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V211 => "2.1.1",
            Self::V22 => "2.2",
        }
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VersionNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2.1.1" => Ok(Self::V211),
            "2.2" => Ok(Self::V22),
            other => Err(other.to_string()),
        }
    }
}

/// Entry of a versions document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Version {
    /// Version identifier as advertised (kept as text so unknown versions
    /// from newer peers do not break parsing)
    pub version: String,
    /// URL of the version details document
    pub url: String,
}

/// Named endpoint of a version details document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Endpoint {
    pub identifier: String,
    pub url: String,
}

/// Version details document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VersionDetails {
    pub version: String,
    pub endpoints: Vec<Endpoint>,
}

impl VersionDetails {
    /// URL of the named endpoint, if advertised.
    pub fn endpoint(&self, identifier: &str) -> Option<&str> {
        self.endpoints
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| e.url.as_str())
    }
}

/// Highest version advertised by the remote side that is also supported
/// locally.
pub fn select_mutual_version(remote: &[Version]) -> Option<(VersionNumber, &Version)> {
    remote
        .iter()
        .filter_map(|v| v.version.parse::<VersionNumber>().ok().map(|n| (n, v)))
        .filter(|(n, _)| VersionNumber::SUPPORTED.contains(n))
        .max_by_key(|(n, _)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(v: &str) -> Version {
        Version {
            version: v.to_string(),
            url: format!("https://remote/ocpi/{}", v),
        }
    }

    #[test]
    fn picks_highest_common_version() {
        let remote = vec![version("2.1.1"), version("2.2"), version("3.0")];
        let (number, entry) = select_mutual_version(&remote).unwrap();
        assert_eq!(number, VersionNumber::V22);
        assert_eq!(entry.url, "https://remote/ocpi/2.2");
    }

    #[test]
    fn no_common_version() {
        let remote = vec![version("2.0"), version("3.0")];
        assert!(select_mutual_version(&remote).is_none());
        assert!(select_mutual_version(&[]).is_none());
    }

    #[test]
    fn version_number_serializes_as_dotted_string() {
        assert_eq!(serde_json::to_string(&VersionNumber::V211).unwrap(), "\"2.1.1\"");
        assert_eq!("2.2".parse::<VersionNumber>(), Ok(VersionNumber::V22));
        assert!("2.0".parse::<VersionNumber>().is_err());
    }

    #[test]
    fn finds_credentials_endpoint() {
        let details = VersionDetails {
            version: "2.2".into(),
            endpoints: vec![
                Endpoint {
                    identifier: "locations".into(),
                    url: "https://remote/ocpi/2.2/locations".into(),
                },
                Endpoint {
                    identifier: CREDENTIALS_MODULE.into(),
                    url: "https://remote/ocpi/2.2/credentials".into(),
                },
            ],
        };
        assert_eq!(
            details.endpoint(CREDENTIALS_MODULE),
            Some("https://remote/ocpi/2.2/credentials")
        );
        assert_eq!(details.endpoint("tariffs"), None);
    }
}
