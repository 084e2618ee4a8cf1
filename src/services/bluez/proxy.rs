#![allow(missing_docs)]

use std::collections::HashMap;

use zbus::{Result, proxy, zvariant::OwnedValue};

/// BlueZ Device1 interface proxy.
///
/// Only the identity properties the bridge reads are declared.
#[proxy(interface = "org.bluez.Device1", default_service = "org.bluez")]
pub trait Device1 {
    /// Display name of the device.
    #[zbus(property)]
    fn name(&self) -> Result<String>;

    /// Freedesktop icon name for the device class.
    #[zbus(property)]
    fn icon(&self) -> Result<String>;
}

/// BlueZ MediaPlayer1 interface proxy.
///
/// AVRCP target controls of a connected device.
#[proxy(interface = "org.bluez.MediaPlayer1", default_service = "org.bluez")]
pub trait MediaPlayer1 {
    /// Resume playback.
    fn play(&self) -> Result<()>;

    /// Pause playback.
    fn pause(&self) -> Result<()>;

    /// Stop playback.
    fn stop(&self) -> Result<()>;

    /// Skip to the next track.
    fn next(&self) -> Result<()>;

    /// Skip to the previous track.
    fn previous(&self) -> Result<()>;

    /// One of playing, stopped, paused, forward-seek, reverse-seek, error.
    #[zbus(property)]
    fn status(&self) -> Result<String>;

    /// One of off, singletrack, alltracks, group.
    #[zbus(property)]
    fn repeat(&self) -> Result<String>;

    #[zbus(property)]
    fn set_repeat(&self, value: &str) -> Result<()>;

    /// One of off, alltracks, group.
    #[zbus(property)]
    fn shuffle(&self) -> Result<String>;

    #[zbus(property)]
    fn set_shuffle(&self, value: &str) -> Result<()>;

    /// Playback position in milliseconds.
    #[zbus(property)]
    fn position(&self) -> Result<u32>;

    /// Current track record (Title, Artist, Album, Genre, TrackNumber, Duration, ...).
    #[zbus(property)]
    fn track(&self) -> Result<HashMap<String, OwnedValue>>;
}
