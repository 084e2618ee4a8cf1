use std::{
    env,
    io::{Error, ErrorKind},
    path::PathBuf,
};

const APP_DIR: &str = "bluempris";

/// Locates configuration, data and state directories.
///
/// Follows the XDG Base Directory specification, falling back to the
/// standard locations under `$HOME`.
pub struct ConfigPaths;

impl ConfigPaths {
    /// `$XDG_CONFIG_HOME/bluempris`
    ///
    /// # Errors
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set
    pub fn config_dir() -> Result<PathBuf, Error> {
        Ok(xdg_base("XDG_CONFIG_HOME", ".config")?.join(APP_DIR))
    }

    /// Default path of the configuration file.
    ///
    /// # Errors
    /// Returns an error if neither `XDG_CONFIG_HOME` nor `HOME` is set
    pub fn main_config() -> Result<PathBuf, Error> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// `$XDG_DATA_HOME/applications`, where desktop entries go.
    ///
    /// # Errors
    /// Returns an error if neither `XDG_DATA_HOME` nor `HOME` is set
    pub fn applications_dir() -> Result<PathBuf, Error> {
        Ok(xdg_base("XDG_DATA_HOME", ".local/share")?.join("applications"))
    }

    /// Log directory, created if missing.
    ///
    /// # Errors
    /// Returns error if no base directory is known or it cannot be created
    pub fn log_dir() -> Result<PathBuf, Error> {
        let log_dir = xdg_base("XDG_STATE_HOME", ".local/state")?
            .join(APP_DIR)
            .join("logs");

        if !log_dir.exists() {
            std::fs::create_dir_all(&log_dir)?;
        }

        Ok(log_dir)
    }
}

fn xdg_base(variable: &str, home_fallback: &str) -> Result<PathBuf, Error> {
    env::var(variable)
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(home_fallback))
        })
        .ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("Neither {variable} nor HOME environment variable found"),
            )
        })
}
