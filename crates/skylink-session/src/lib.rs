//! Provider configuration and session-scoped client configuration for Skylink.
//!
//! This crate loads the provider configuration file (`skylink.toml`), derives
//! the `ClientConfig` used to build cloud service clients, and caches derived
//! configs per deployment session so concurrent link updates in one session
//! derive each config at most once.

pub mod cache;
pub mod config;

pub use cache::{ConfigLoader, ConfigSource, FileConfigLoader, SessionConfigCache};
pub use config::{
    parse_config_file, parse_config_str, AwsSection, CallsSection, ClientConfig, ProviderConfig,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse provider config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unsupported config_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("no region configured (set aws.region, the '{variable}' context variable, or call metadata)")]
    MissingRegion { variable: &'static str },
    #[error("invalid provider config: {0}")]
    Invalid(String),
    #[error("session config cache lock poisoned")]
    LockPoisoned,
    #[error("client config derivation failed: {0}")]
    Derivation(String),
}
