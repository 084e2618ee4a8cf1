use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::services::mpris::{DEFAULT_ART_URL, SessionSettings};

/// Session and reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Milliseconds between two enumerations of the backend players.
    pub poll_interval_ms: u64,

    /// Artwork URI reported for every non-empty track.
    pub art_url: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            art_url: DEFAULT_ART_URL.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Reconciliation period.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Settings handed to every new session.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            art_url: self.art_url.clone(),
        }
    }
}
