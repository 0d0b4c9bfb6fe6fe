//! Integration configuration and shared constants.
//!
//! The host passes its whole configuration mapping to the bootstrap hook.
//! This integration only reads the section under its domain key; every
//! field has a default so the section may be omitted entirely.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Fixed names used across the integration.
pub mod constants {
    /// Domain identifier: state key and URL namespace.
    pub const DOMAIN: &str = "mbtalive";
    /// File name of the bundled frontend card.
    pub const CARD_BUNDLE_FILE: &str = "mbtalive-card-bundle.js";
    /// Directory inside the integration that holds frontend assets.
    pub const FRONTEND_DIR: &str = "frontend";
    /// Directory under the host config dir where custom integrations live.
    pub const CUSTOM_COMPONENTS_DIR: &str = "custom_components";
    /// Directory under the host config dir that the host serves as-is.
    pub const SERVED_DIR: &str = "www";
    /// URL prefix the host serves `SERVED_DIR` under.
    pub const LOCAL_URL_PREFIX: &str = "/local";
    /// Host data key holding the frontend resource list.
    pub const RESOURCE_STORE_KEY: &str = "lovelace";
}

/// Environment variable names.
pub mod env_vars {
    use super::AssetStrategy;

    /// Overrides `frontend.strategy`.
    pub const ASSET_STRATEGY: &str = "MBTALIVE_ASSET_STRATEGY";
    /// Switches the CLI to JSON logs.
    pub const LOG_JSON: &str = "MBTALIVE_LOG_JSON";

    /// Parse a strategy override, ignoring unparsable values.
    pub fn parse_asset_strategy(value: &str) -> Option<AssetStrategy> {
        match value.parse() {
            Ok(strategy) => Some(strategy),
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", ASSET_STRATEGY, e);
                None
            }
        }
    }

    /// Whether JSON logging is requested.
    pub fn log_json() -> bool {
        std::env::var(LOG_JSON)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false)
    }
}

/// How the card bundle is made reachable by the frontend.
///
/// Deserialized through `FromStr`, so config files accept the same names as
/// the CLI and the environment override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum AssetStrategy {
    /// Serve the bundle in place through the host's static path facility
    /// and declare it as a UI resource.
    #[default]
    StaticPath,
    /// Copy the bundle into the served `www` directory and declare it as an
    /// extra JS URL.
    ServedDirectory,
}

impl AssetStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StaticPath => "static_path",
            Self::ServedDirectory => "served_directory",
        }
    }
}

impl FromStr for AssetStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static_path" | "static" => Ok(Self::StaticPath),
            "served_directory" | "www" | "copy" => Ok(Self::ServedDirectory),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for AssetStrategy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl std::fmt::Display for AssetStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Frontend card registration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Whether to register the card at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Publication strategy.
    #[serde(default)]
    pub strategy: AssetStrategy,

    /// Bundle location; defaults to the copy shipped with the integration.
    #[serde(default)]
    pub bundle_path: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: AssetStrategy::default(),
            bundle_path: None,
        }
    }
}

/// Configuration section of the integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IntegrationConfig {
    #[serde(default)]
    pub frontend: FrontendConfig,
}

impl IntegrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the integration section from the host configuration mapping.
    ///
    /// A missing or null section yields defaults; a malformed one is an error.
    /// The `MBTALIVE_ASSET_STRATEGY` environment variable overrides the
    /// configured strategy.
    pub fn from_host_config(config: &serde_json::Value) -> Result<Self, ConfigError> {
        let strategy_override = std::env::var(env_vars::ASSET_STRATEGY).ok();
        Self::from_host_config_with_override(config, strategy_override.as_deref())
    }

    /// Like `from_host_config`, with the override value passed in instead of
    /// read from the environment.
    pub fn from_host_config_with_override(
        config: &serde_json::Value,
        strategy_override: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let mut parsed = match config.get(constants::DOMAIN) {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(section) => serde_json::from_value(section.clone())?,
        };

        if let Some(strategy) = strategy_override.and_then(env_vars::parse_asset_strategy) {
            parsed.frontend.strategy = strategy;
        }
        Ok(parsed)
    }

    /// Set the asset strategy.
    pub fn with_strategy(mut self, strategy: AssetStrategy) -> Self {
        self.frontend.strategy = strategy;
        self
    }

    /// Set the bundle location.
    pub fn with_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.frontend.bundle_path = Some(path.into());
        self
    }

    /// Enable or disable card registration.
    pub fn with_frontend_enabled(mut self, enabled: bool) -> Self {
        self.frontend.enabled = enabled;
        self
    }

    /// Bundle location, resolved against the host configuration directory.
    pub fn bundle_path(&self, config_dir: &Path) -> PathBuf {
        match &self.frontend.bundle_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => config_dir.join(path),
            None => default_bundle_path(config_dir),
        }
    }
}

/// `<config_dir>/custom_components/mbtalive/frontend/mbtalive-card-bundle.js`
pub fn default_bundle_path(config_dir: &Path) -> PathBuf {
    config_dir
        .join(constants::CUSTOM_COMPONENTS_DIR)
        .join(constants::DOMAIN)
        .join(constants::FRONTEND_DIR)
        .join(constants::CARD_BUNDLE_FILE)
}
