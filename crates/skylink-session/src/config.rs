use crate::SessionError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Provider configuration file (`skylink.toml`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub config_version: u32,
    #[serde(default)]
    pub aws: AwsSection,
    #[serde(default)]
    pub calls: CallsSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AwsSection {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CallsSection {
    /// Deadline for a single upstream call; 0 disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CallsSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            config_version: 1,
            aws: AwsSection::default(),
            calls: CallsSection::default(),
        }
    }
}

impl ProviderConfig {
    /// Validate the version and canonicalize values: trims strings, lowercases
    /// the region, drops blank optionals and trailing slashes on the endpoint.
    pub fn normalize(mut self) -> Result<Self, SessionError> {
        if self.config_version != 1 {
            return Err(SessionError::UnsupportedVersion(self.config_version));
        }

        if let Some(region) = self.aws.region.as_deref() {
            let region = region.trim().to_lowercase();
            if region.is_empty() {
                return Err(SessionError::Invalid(
                    "aws.region must not be empty when set".to_owned(),
                ));
            }
            self.aws.region = Some(region);
        }
        self.aws.profile = non_blank(self.aws.profile.take());
        self.aws.endpoint_url =
            non_blank(self.aws.endpoint_url.take()).map(|u| u.trim_end_matches('/').to_owned());

        Ok(self)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        (self.calls.timeout_secs > 0).then(|| Duration::from_secs(self.calls.timeout_secs))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub fn parse_config_str(input: &str) -> Result<ProviderConfig, SessionError> {
    let config: ProviderConfig = toml::from_str(input)?;
    config.normalize()
}

pub fn parse_config_file(path: impl AsRef<Path>) -> Result<ProviderConfig, SessionError> {
    let content = fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Ready-to-use settings for constructing cloud service clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub region: String,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ClientConfig {
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_owned(),
            profile: None,
            endpoint_url: None,
            session_id: None,
        }
    }
}
