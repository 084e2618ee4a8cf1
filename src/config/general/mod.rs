mod log_format;
mod log_level;

pub use log_format::LogFormat;
pub use log_level::LogLevel;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct GeneralConfig {
    /// Logging level, used when `RUST_LOG` is unset.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Console output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Also write logs to a daily rolling file in the state directory.
    #[serde(default)]
    pub log_to_file: bool,
}
