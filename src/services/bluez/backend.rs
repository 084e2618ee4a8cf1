use async_trait::async_trait;
use tracing::instrument;
use zbus::{Connection, proxy::CacheProperties};

use super::{
    DeviceIdentity, PlayerPath, TrackRecord,
    proxy::{Device1Proxy, MediaPlayer1Proxy},
};
use crate::core::Result;

/// Read access to the identity of a backend device.
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Current display name of the device.
    async fn name(&self) -> Result<String>;

    /// Icon name of the device, `None` when the device reports none.
    async fn icon(&self) -> Result<Option<String>>;

    /// Name and icon in one value.
    async fn identity(&self) -> Result<DeviceIdentity> {
        Ok(DeviceIdentity {
            name: self.name().await?,
            icon: self.icon().await?,
        })
    }
}

/// Control surface of a backend media player.
///
/// Values are the raw backend vocabulary (e.g. `"singletrack"`); mapping to
/// the exposed vocabulary is done by the callers. Every read is a fresh
/// round-trip to the backend.
#[async_trait]
pub trait PlayerBackend: Send + Sync {
    /// Playback status.
    async fn status(&self) -> Result<String>;

    /// Repeat mode.
    async fn repeat(&self) -> Result<String>;

    /// Change the repeat mode.
    async fn set_repeat(&self, value: &str) -> Result<()>;

    /// Shuffle mode.
    async fn shuffle(&self) -> Result<String>;

    /// Change the shuffle mode.
    async fn set_shuffle(&self, value: &str) -> Result<()>;

    /// Playback position in milliseconds.
    async fn position(&self) -> Result<u32>;

    /// Current track, `None` when the device reports an empty record.
    async fn track(&self) -> Result<Option<TrackRecord>>;

    /// Resume playback.
    async fn play(&self) -> Result<()>;

    /// Pause playback.
    async fn pause(&self) -> Result<()>;

    /// Stop playback.
    async fn stop(&self) -> Result<()>;

    /// Skip to the next track.
    async fn next(&self) -> Result<()>;

    /// Skip to the previous track.
    async fn previous(&self) -> Result<()>;
}

/// `DeviceBackend` over a live `org.bluez.Device1` object.
#[derive(Debug, Clone)]
pub struct BluezDevice {
    proxy: Device1Proxy<'static>,
}

impl BluezDevice {
    /// Connect to the device object at `path` on the system bus.
    ///
    /// Property caching is disabled so reads always reach the daemon.
    ///
    /// # Errors
    /// Returns error if the proxy cannot be built
    pub async fn connect(connection: &Connection, path: &str) -> Result<Self> {
        let proxy = Device1Proxy::builder(connection)
            .path(path.to_string())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        Ok(Self { proxy })
    }
}

#[async_trait]
impl DeviceBackend for BluezDevice {
    async fn name(&self) -> Result<String> {
        Ok(self.proxy.name().await?)
    }

    async fn icon(&self) -> Result<Option<String>> {
        match self.proxy.icon().await {
            Ok(icon) if !icon.is_empty() => Ok(Some(icon)),
            Ok(_) => Ok(None),
            Err(zbus::Error::FDO(err)) if matches!(*err, zbus::fdo::Error::InvalidArgs(_)) => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// `PlayerBackend` over a live `org.bluez.MediaPlayer1` object.
#[derive(Debug, Clone)]
pub struct BluezPlayer {
    proxy: MediaPlayer1Proxy<'static>,
}

impl BluezPlayer {
    /// Connect to the player object at `path` on the system bus.
    ///
    /// # Errors
    /// Returns error if the proxy cannot be built
    #[instrument(skip(connection), fields(path = %path))]
    pub async fn connect(connection: &Connection, path: &PlayerPath) -> Result<Self> {
        let proxy = MediaPlayer1Proxy::builder(connection)
            .path(path.as_str().to_string())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;

        Ok(Self { proxy })
    }
}

#[async_trait]
impl PlayerBackend for BluezPlayer {
    async fn status(&self) -> Result<String> {
        Ok(self.proxy.status().await?)
    }

    async fn repeat(&self) -> Result<String> {
        Ok(self.proxy.repeat().await?)
    }

    async fn set_repeat(&self, value: &str) -> Result<()> {
        Ok(self.proxy.set_repeat(value).await?)
    }

    async fn shuffle(&self) -> Result<String> {
        Ok(self.proxy.shuffle().await?)
    }

    async fn set_shuffle(&self, value: &str) -> Result<()> {
        Ok(self.proxy.set_shuffle(value).await?)
    }

    async fn position(&self) -> Result<u32> {
        Ok(self.proxy.position().await?)
    }

    async fn track(&self) -> Result<Option<TrackRecord>> {
        let track = self.proxy.track().await?;
        Ok(TrackRecord::from_properties(&track))
    }

    async fn play(&self) -> Result<()> {
        Ok(self.proxy.play().await?)
    }

    async fn pause(&self) -> Result<()> {
        Ok(self.proxy.pause().await?)
    }

    async fn stop(&self) -> Result<()> {
        Ok(self.proxy.stop().await?)
    }

    async fn next(&self) -> Result<()> {
        Ok(self.proxy.next().await?)
    }

    async fn previous(&self) -> Result<()> {
        Ok(self.proxy.previous().await?)
    }
}
