use std::sync::Arc;

use futures::{StreamExt, future};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use zbus::{Connection, connection, fdo::PropertiesProxy};

use super::{
    DEFAULT_ART_URL, MPRIS_BUS_NAME_PREFIX, MPRIS_OBJECT_PATH, PlayerInterface, PropertyTable,
    RootInterface, relay,
};
use crate::{
    core::{BridgeError, Result},
    services::bluez::{
        BLUEZ_SERVICE, BluezDevice, BluezPlayer, DeviceBackend, DeviceIdentity, PlayerPath,
    },
};

/// Settings shared by every session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Artwork URI attached to non-empty tracks
    pub art_url: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            art_url: DEFAULT_ART_URL.to_string(),
        }
    }
}

/// One live translation of a backend player onto MPRIS.
///
/// Owns a dedicated session-bus connection holding the
/// `org.mpris.MediaPlayer2.<exposed name>` name and serving both MPRIS
/// interfaces, plus the relay task draining the backend change stream.
pub struct Session {
    identifier: PlayerPath,
    exposed_name: String,
    identity: DeviceIdentity,
    connection: Connection,
    relay: JoinHandle<()>,
}

impl Session {
    /// Bring up the session for `path`.
    ///
    /// Nothing is emitted on creation; clients read the initial state
    /// through the properties interface.
    ///
    /// # Errors
    /// Returns `BridgeError::SessionCreationFailed` if the backend objects
    /// vanish, the bus name cannot be acquired or the subscription fails
    #[instrument(skip(system, settings), fields(path = %path))]
    pub async fn create(
        system: &Connection,
        path: &PlayerPath,
        settings: &SessionSettings,
    ) -> Result<Self> {
        Self::bring_up(system, path, settings)
            .await
            .map_err(|e| BridgeError::SessionCreationFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })
    }

    async fn bring_up(
        system: &Connection,
        path: &PlayerPath,
        settings: &SessionSettings,
    ) -> Result<Self> {
        let device = BluezDevice::connect(system, path.device_path()).await?;
        let player = BluezPlayer::connect(system, path).await?;
        let identity = device.identity().await?;

        let exposed_name = path.exposed_name();
        let table = Arc::new(PropertyTable::new(
            Arc::new(device),
            Arc::new(player),
            &exposed_name,
            &settings.art_url,
        ));

        let bus_name = format!("{MPRIS_BUS_NAME_PREFIX}{exposed_name}");
        let connection = connection::Builder::session()?
            .name(bus_name)?
            .serve_at(MPRIS_OBJECT_PATH, RootInterface::new(Arc::clone(&table)))?
            .serve_at(MPRIS_OBJECT_PATH, PlayerInterface::new(Arc::clone(&table)))?
            .build()
            .await?;

        let changes = PropertiesProxy::builder(system)
            .destination(BLUEZ_SERVICE)?
            .path(path.as_str().to_string())?
            .build()
            .await?
            .receive_properties_changed()
            .await?
            .filter_map(|signal| future::ready(relay::BackendChange::from_signal(&signal)));

        let relay = tokio::spawn(relay::run(
            changes,
            table,
            connection.clone(),
            exposed_name.clone(),
        ));

        info!(name = %exposed_name, device = %identity.name, "MPRIS session created");

        Ok(Self {
            identifier: path.clone(),
            exposed_name,
            identity,
            connection,
            relay,
        })
    }

    /// Backend player this session translates.
    pub fn identifier(&self) -> &PlayerPath {
        &self.identifier
    }

    /// Exposed name suffix, also used as the desktop entry name.
    pub fn exposed_name(&self) -> &str {
        &self.exposed_name
    }

    /// Device identity read at creation.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Tear the session down.
    ///
    /// Best-effort: interfaces and the bus name that are already gone are
    /// skipped without error.
    #[instrument(skip(self), fields(name = %self.exposed_name))]
    pub async fn destroy(self) {
        self.relay.abort();

        let server = self.connection.object_server();
        if let Err(e) = server.remove::<PlayerInterface, _>(MPRIS_OBJECT_PATH).await {
            debug!("Player interface already unregistered: {e}");
        }
        if let Err(e) = server.remove::<RootInterface, _>(MPRIS_OBJECT_PATH).await {
            debug!("Root interface already unregistered: {e}");
        }

        let bus_name = format!("{MPRIS_BUS_NAME_PREFIX}{}", self.exposed_name);
        if let Err(e) = self.connection.release_name(bus_name).await {
            debug!("Bus name already released: {e}");
        }

        info!("MPRIS session destroyed");
    }
}
