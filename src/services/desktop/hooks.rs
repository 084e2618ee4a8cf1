use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::{DesktopEntry, indicator, remove_entry, write_entry};
use crate::{
    config::{ConfigPaths, DesktopConfig},
    services::{
        bluez::DeviceIdentity,
        bridge::{HookError, SessionHooks},
    },
};

/// Desktop entries and indicator cleanup for every session.
#[derive(Debug, Clone)]
pub struct DesktopIntegration {
    config: DesktopConfig,
    applications_dir: PathBuf,
}

impl DesktopIntegration {
    /// Integration writing entries where `config` says.
    ///
    /// # Errors
    /// Returns error if no applications directory is configured and none
    /// can be derived from the environment
    pub fn new(config: DesktopConfig) -> io::Result<Self> {
        let applications_dir = match &config.applications_dir {
            Some(dir) => dir.clone(),
            None => ConfigPaths::applications_dir()?,
        };

        Ok(Self {
            config,
            applications_dir,
        })
    }

    /// Directory entries are written to.
    pub fn applications_dir(&self) -> &Path {
        &self.applications_dir
    }

    fn refresh_menu(&self) {
        let spawned = Command::new("xdg-desktop-menu")
            .args(["forceupdate", "--mode", "user"])
            .spawn();

        match spawned {
            Ok(mut child) => {
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if status.success() => debug!("Desktop menu refreshed"),
                        Ok(status) => debug!(%status, "xdg-desktop-menu failed"),
                        Err(e) => debug!("xdg-desktop-menu did not finish: {e}"),
                    }
                });
            }
            Err(e) => warn!("Cannot run xdg-desktop-menu: {e}"),
        }
    }
}

#[async_trait]
impl SessionHooks for DesktopIntegration {
    #[instrument(skip(self, identity))]
    async fn session_created(
        &self,
        exposed_name: &str,
        identity: &DeviceIdentity,
    ) -> Result<(), HookError> {
        if !self.config.entries {
            return Ok(());
        }

        let path = write_entry(
            &self.applications_dir,
            exposed_name,
            &DesktopEntry::new(identity),
        )
        .await?;
        info!(path = %path.display(), "Desktop entry written");

        if self.config.refresh_menu {
            self.refresh_menu();
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn session_destroyed(&self, exposed_name: &str) -> Result<(), HookError> {
        let removed = if self.config.entries {
            remove_entry(&self.applications_dir, exposed_name)
                .await
                .map(|removed| {
                    if removed {
                        debug!("Desktop entry removed");
                    }
                })
        } else {
            Ok(())
        };

        let purged = if self.config.purge_indicator {
            indicator::purge_interested_players(exposed_name)
                .await
                .map(|_| ())
        } else {
            Ok(())
        };

        removed.and(purged)
    }
}
