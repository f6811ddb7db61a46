pub mod links;
pub mod stage;
pub mod update;

use serde::de::DeserializeOwned;
use skylink_core::{LinkRegistry, LinkServices};
use skylink_runtime::MockClientFactory;
use skylink_session::{parse_config_file, FileConfigLoader, ProviderConfig, SessionConfigCache};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INPUT_ERROR: u8 = 2;

/// Prefixes of error messages that map to [`EXIT_INPUT_ERROR`].
pub const INPUT_ERROR_PREFIXES: &[&str] = &["input error:", "config error:"];

const DEFAULT_CONFIG_FILE: &str = "skylink.toml";

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Read and deserialize a JSON input file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let value = read_json_value(path)?;
    serde_json::from_value(value)
        .map_err(|e| format!("input error: {} is not a valid input: {e}", path.display()))
}

pub fn read_json_value(path: &Path) -> Result<serde_json::Value, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("input error: failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("input error: {} is not valid JSON: {e}", path.display()))
}

/// Load the provider config from `path`, or from `./skylink.toml` when it
/// exists, or fall back to defaults.
pub fn load_provider_config(path: Option<&Path>) -> Result<ProviderConfig, String> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => {
            debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
            return Ok(ProviderConfig::default());
        }
    };
    debug!("loading provider config from {}", path.display());
    parse_config_file(path).map_err(|e| format!("config error: {}: {e}", path.display()))
}

/// Registry of built-in links wired to the mock cloud backend.
pub fn mock_registry(config: ProviderConfig) -> Result<(LinkRegistry, MockClientFactory), String> {
    let factory = MockClientFactory::new();
    let services = LinkServices::new(
        Arc::new(SessionConfigCache::new(FileConfigLoader::new(config))),
        Arc::new(factory.clone()),
    );
    let registry = LinkRegistry::with_defaults(&services).map_err(|e| e.to_string())?;
    Ok((registry, factory))
}

pub fn exit_code_for(message: &str) -> u8 {
    if INPUT_ERROR_PREFIXES.iter().any(|p| message.starts_with(p)) {
        EXIT_INPUT_ERROR
    } else {
        EXIT_FAILURE
    }
}

pub fn colorize_classification(label: &str) -> String {
    use console::Style;
    match label {
        "new" => Style::new().green().apply_to(label).to_string(),
        "modified" => Style::new().yellow().apply_to(label).to_string(),
        "removed" => Style::new().red().apply_to(label).to_string(),
        "deploy" => Style::new().cyan().apply_to(label).to_string(),
        "unchanged" => Style::new().dim().apply_to(label).to_string(),
        other => other.to_owned(),
    }
}
