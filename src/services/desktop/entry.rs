use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::services::{bluez::DeviceIdentity, bridge::HookError};

/// Icon used when the device reports none.
pub const FALLBACK_ICON: &str = "bluetooth";

/// Launcher entry advertising one exposed player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    name: String,
    icon: String,
}

impl DesktopEntry {
    /// Entry named after the device.
    pub fn new(identity: &DeviceIdentity) -> Self {
        Self {
            name: single_line(&identity.name),
            icon: identity
                .icon
                .as_deref()
                .map(single_line)
                .unwrap_or_else(|| FALLBACK_ICON.to_string()),
        }
    }

    /// Contents of the `.desktop` file.
    pub fn render(&self) -> String {
        format!(
            "[Desktop Entry]\n\
             Version=1.0\n\
             Name={name}\n\
             GenericName=Bluetooth media player\n\
             Comment=Exposes a connected Bluetooth device's media controls through MPRIS\n\
             Exec=bluempris --do-nothing\n\
             Icon={icon}\n\
             Terminal=false\n\
             Type=Application\n\
             Categories=AudioVideo;Player;Recorder;\n\
             Keywords=Player;Audio;\n\
             NotShowIn=KDE;GNOME;Unity;XFCE;LXDE;\n",
            name = self.name,
            icon = self.icon,
        )
    }
}

fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// `<dir>/<exposed name>.desktop`
pub fn entry_path(dir: &Path, exposed_name: &str) -> PathBuf {
    dir.join(format!("{exposed_name}.desktop"))
}

/// Write the entry for `exposed_name`, replacing any previous one.
///
/// # Errors
/// Returns error if the directory or file cannot be written
pub async fn write_entry(
    dir: &Path,
    exposed_name: &str,
    entry: &DesktopEntry,
) -> Result<PathBuf, HookError> {
    fs::create_dir_all(dir).await?;

    let path = entry_path(dir, exposed_name);
    fs::write(&path, entry.render()).await?;
    Ok(path)
}

/// Remove the entry for `exposed_name`.
///
/// Returns whether a file was removed; a missing file is not an error.
///
/// # Errors
/// Returns error if the file exists but cannot be removed
pub async fn remove_entry(dir: &Path, exposed_name: &str) -> Result<bool, HookError> {
    match fs::remove_file(entry_path(dir, exposed_name)).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
