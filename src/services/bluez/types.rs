use std::{collections::HashMap, fmt, str::FromStr};

use zbus::zvariant::OwnedValue;

use crate::core::BridgeError;

/// Object path of a BlueZ media player, e.g.
/// `/org/bluez/hci0/dev_AC_22_0B_47_68_46/player0`.
///
/// The path is the session key in the registry. Construction validates that
/// the parent segment is a device node, so the device path and exposed
/// name can always be derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerPath(String);

impl PlayerPath {
    /// Validate a backend object path.
    ///
    /// # Errors
    /// Returns `BridgeError::InvalidPlayerPath` if the path is not absolute,
    /// has an empty player segment, or its parent is not a `dev_` node.
    pub fn parse(path: &str) -> Result<Self, BridgeError> {
        let invalid = || BridgeError::InvalidPlayerPath(path.to_string());

        if !path.starts_with('/') || path.ends_with('/') {
            return Err(invalid());
        }

        let (device, player) = path.rsplit_once('/').ok_or_else(invalid)?;
        let device_node = device.rsplit('/').next().unwrap_or_default();

        if player.is_empty() || !device_node.starts_with("dev_") {
            return Err(invalid());
        }

        Ok(Self(path.to_string()))
    }

    /// The player object path.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Object path of the device that owns this player.
    pub fn device_path(&self) -> &str {
        self.split().0
    }

    /// Name suffix for the exposed MPRIS bus name.
    ///
    /// `bt` followed by the alphanumeric characters of the device node and
    /// then of the player node. The `bt` prefix keeps the element from
    /// starting with a digit.
    pub fn exposed_name(&self) -> String {
        let (device, player) = self.split();
        let device_node = device.rsplit('/').next().unwrap_or_default();

        let mut name = String::from("bt");
        name.extend(device_node.chars().filter(char::is_ascii_alphanumeric));
        name.extend(player.chars().filter(char::is_ascii_alphanumeric));
        name
    }

    fn split(&self) -> (&str, &str) {
        self.0.rsplit_once('/').unwrap_or(("", &self.0))
    }
}

impl FromStr for PlayerPath {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PlayerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display identity of a backend device, read once at session creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Human-readable device name
    pub name: String,

    /// Freedesktop icon name, if the device reports one
    pub icon: Option<String>,
}

/// Typed view of the `Track` dictionary of `org.bluez.MediaPlayer1`.
///
/// Fields the device did not report stay `None`. Durations are in
/// milliseconds, as the backend reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackRecord {
    /// Track title
    pub title: Option<String>,

    /// Track artist
    pub artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Genre
    pub genre: Option<String>,

    /// Position of the track within its album
    pub track_number: Option<u32>,

    /// Track duration in milliseconds
    pub duration: Option<u32>,
}

impl TrackRecord {
    /// Build a record from the raw backend dictionary.
    ///
    /// Returns `None` for an empty dictionary, which the device sends when
    /// nothing is loaded. Entries with an unexpected type are skipped.
    pub fn from_properties(track: &HashMap<String, OwnedValue>) -> Option<Self> {
        if track.is_empty() {
            return None;
        }

        let string = |key: &str| {
            track
                .get(key)
                .and_then(|value| value.downcast_ref::<&str>().ok())
                .map(str::to_string)
        };
        let number = |key: &str| {
            track
                .get(key)
                .and_then(|value| value.downcast_ref::<u32>().ok())
        };

        Some(Self {
            title: string("Title"),
            artist: string("Artist"),
            album: string("Album"),
            genre: string("Genre"),
            track_number: number("TrackNumber"),
            duration: number("Duration"),
        })
    }
}
