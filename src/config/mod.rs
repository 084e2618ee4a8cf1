//! Configuration schema definitions and validation.
//!
//! Every field has a default, so a missing or empty file yields a working
//! bridge. Loaded once at startup from TOML.

mod bridge;
mod desktop;
mod error;
mod general;
mod loading;
mod paths;

pub use bridge::BridgeConfig;
pub use desktop::DesktopConfig;
pub use error::{ConfigError, Result};
pub use general::{GeneralConfig, LogFormat, LogLevel};
pub use paths::ConfigPaths;

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

/// Main configuration structure for bluempris.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct Config {
    /// Logging settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Session and reconciliation settings.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Desktop integration side effects.
    #[serde(default)]
    pub desktop: DesktopConfig,
}

impl Config {
    /// JSON schema of the configuration file.
    ///
    /// # Errors
    /// Returns error if the schema cannot be serialized
    pub fn json_schema() -> serde_json::Result<String> {
        serde_json::to_string_pretty(&schema_for!(Config))
    }
}

#[cfg(test)]
mod tests;
