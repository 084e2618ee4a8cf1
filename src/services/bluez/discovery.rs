use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use zbus::{Connection, fdo::ObjectManagerProxy};

use super::{BLUEZ_SERVICE, MEDIA_PLAYER_INTERFACE, PlayerPath};
use crate::core::Result;

/// Source of the backend players that should currently have a session.
#[async_trait]
pub trait PlayerEnumerator: Send + Sync {
    /// Object paths of every backend object exposing the player interface.
    ///
    /// # Errors
    /// Returns error if the backend registry cannot be queried
    async fn enumerate(&self) -> Result<BTreeSet<PlayerPath>>;
}

/// Enumerates players through `org.freedesktop.DBus.ObjectManager` on `org.bluez`.
///
/// Stateless: each call issues one `GetManagedObjects` and filters the
/// result by interface.
#[derive(Debug, Clone)]
pub struct BluezEnumerator {
    connection: Connection,
    interface: String,
}

impl BluezEnumerator {
    /// Create an enumerator for `org.bluez.MediaPlayer1` objects.
    pub fn new(connection: Connection) -> Self {
        Self::for_interface(connection, MEDIA_PLAYER_INTERFACE)
    }

    /// Create an enumerator for objects implementing `interface`.
    pub fn for_interface(connection: Connection, interface: &str) -> Self {
        Self {
            connection,
            interface: interface.to_string(),
        }
    }

    async fn object_manager(&self) -> Result<ObjectManagerProxy<'static>> {
        Ok(ObjectManagerProxy::builder(&self.connection)
            .destination(BLUEZ_SERVICE)?
            .path("/")?
            .build()
            .await?)
    }
}

#[async_trait]
impl PlayerEnumerator for BluezEnumerator {
    #[instrument(skip(self), fields(interface = %self.interface))]
    async fn enumerate(&self) -> Result<BTreeSet<PlayerPath>> {
        let objects = self.object_manager().await?.get_managed_objects().await?;

        let players = objects
            .into_iter()
            .filter(|(_, interfaces)| {
                interfaces
                    .keys()
                    .any(|name| name.as_str() == self.interface)
            })
            .filter_map(|(path, _)| match PlayerPath::parse(path.as_str()) {
                Ok(player) => Some(player),
                Err(e) => {
                    warn!("Skipping player object: {e}");
                    None
                }
            })
            .collect::<BTreeSet<_>>();

        debug!(count = players.len(), "Enumerated backend players");
        Ok(players)
    }
}
