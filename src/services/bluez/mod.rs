//! BlueZ media-control backend.
//!
//! Proxies for `org.bluez.Device1` and `org.bluez.MediaPlayer1`, the backend
//! traits the bridge programs against, and the object-registry enumerator
//! that finds players.

/// Backend traits and their zbus implementations
pub mod backend;
/// Player enumeration through the BlueZ object manager
pub mod discovery;
/// D-Bus proxy trait definitions
pub mod proxy;
/// Backend identifiers and records
pub mod types;

pub use backend::*;
pub use discovery::*;
pub use types::*;

/// Well-known name of the BlueZ daemon.
pub const BLUEZ_SERVICE: &str = "org.bluez";

/// Interface implemented by every media player object.
pub const MEDIA_PLAYER_INTERFACE: &str = "org.bluez.MediaPlayer1";

#[cfg(test)]
pub(crate) mod testing;
