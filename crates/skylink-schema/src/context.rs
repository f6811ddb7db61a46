use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Well-known provider context variable names.
pub const VAR_REGION: &str = "region";
pub const VAR_PROFILE: &str = "profile";
pub const VAR_ENDPOINT_URL: &str = "endpointUrl";

/// Per-call provider context supplied by the host.
///
/// `session_id` groups calls belonging to one deployment session; the
/// session config cache keys on it. Variables carry session-scoped settings
/// such as the target region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl ProviderContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_owned());
        self
    }

    #[must_use]
    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_owned(), value.to_owned());
        self
    }

    /// A variable value, ignoring blank entries.
    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The session identifier, treating a blank one as absent.
    pub fn session(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
