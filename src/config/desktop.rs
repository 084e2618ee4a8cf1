use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desktop integration performed alongside session lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct DesktopConfig {
    /// Write a `.desktop` entry per session.
    pub entries: bool,

    /// Where entries are written. Defaults to `$XDG_DATA_HOME/applications`.
    pub applications_dir: Option<PathBuf>,

    /// Run `xdg-desktop-menu forceupdate` after writing an entry.
    pub refresh_menu: bool,

    /// Remove destroyed sessions from the sound indicator's player list.
    pub purge_indicator: bool,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            entries: true,
            applications_dir: None,
            refresh_menu: true,
            purge_indicator: true,
        }
    }
}
