//! Exposed MPRIS surface.
//!
//! One [`Session`] per backend player: a property table translating the
//! backend vocabulary, the two served MPRIS interfaces, and the relay that
//! turns backend change notifications into `PropertiesChanged` signals.

/// Served D-Bus interfaces
pub mod interface;
/// Track metadata translation
pub mod metadata;
/// Property table and generic property access
pub mod properties;
/// Backend change-notification relay
pub mod relay;
/// Session lifecycle
pub mod session;
#[cfg(test)]
pub(crate) mod testing;
/// Vocabulary translators
pub mod types;

pub use interface::*;
pub use metadata::*;
pub use properties::*;
pub use session::*;
pub use types::*;

/// Bus-name prefix of every exposed session.
pub const MPRIS_BUS_NAME_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Object path every session serves its interfaces at.
pub const MPRIS_OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Root MPRIS interface name.
pub const ROOT_INTERFACE: &str = "org.mpris.MediaPlayer2";

/// Player MPRIS interface name.
pub const PLAYER_INTERFACE: &str = "org.mpris.MediaPlayer2.Player";

/// Artwork attached to every non-empty track.
pub const DEFAULT_ART_URL: &str = "file:///usr/share/bluempris/default_artwork.png";
