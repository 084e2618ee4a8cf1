use std::{fs, io::ErrorKind, path::Path};

use tracing::debug;

use super::{Config, ConfigError, ConfigPaths, Result};

impl Config {
    /// Load the configuration from its default location.
    ///
    /// # Errors
    /// Returns error if the location is unknown, or the file exists and is
    /// unreadable or invalid
    pub fn load_default() -> Result<Config> {
        Self::load(&ConfigPaths::main_config()?)
    }

    /// Load the configuration file at `path`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid TOML, or
    /// fails validation
    pub fn load(path: &Path) -> Result<Config> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(ConfigError::io(&e, path)),
        };

        Self::parse(&content, Some(path))
    }

    /// Parse and validate TOML content.
    ///
    /// # Errors
    /// Returns error if the content is not valid TOML or fails validation
    pub fn parse(content: &str, path: Option<&Path>) -> Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::toml_parse(e, path))?;
        config.validate()?;
        Ok(config)
    }

    /// Check constraints serde cannot express.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidField` for the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.bridge.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidField {
                field: "poll_interval_ms".to_string(),
                component: "bridge".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.bridge.art_url.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "art_url".to_string(),
                component: "bridge".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
