use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Console log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output.
    #[default]
    Pretty,

    /// One JSON object per event.
    Json,
}
