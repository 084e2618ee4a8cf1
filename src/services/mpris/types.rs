use std::{fmt, str::FromStr};

use crate::core::BridgeError;

/// Exposed playback status of a media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Player is currently playing
    Playing,

    /// Player is paused
    Paused,

    /// Player is stopped
    Stopped,
}

impl PlaybackStatus {
    /// Translate a backend status.
    ///
    /// Seeking counts as playing and an error state as stopped. Values
    /// outside the backend vocabulary are treated as stopped.
    pub fn from_bluez(status: &str) -> Self {
        match status {
            "playing" | "forward-seek" | "reverse-seek" => Self::Playing,
            "paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }

    /// MPRIS spelling of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exposed loop status of a media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// No looping
    None,

    /// Loop current track
    Track,

    /// Loop entire playlist
    Playlist,
}

impl LoopStatus {
    /// Translate a backend repeat mode.
    ///
    /// Every repeat mode other than `off` and `singletrack` (`alltracks`,
    /// `group`) loops the playlist.
    pub fn from_bluez(repeat: &str) -> Self {
        match repeat {
            "off" => Self::None,
            "singletrack" => Self::Track,
            _ => Self::Playlist,
        }
    }

    /// Backend repeat mode for this loop status.
    pub fn to_bluez(self) -> &'static str {
        match self {
            Self::None => "off",
            Self::Track => "singletrack",
            Self::Playlist => "alltracks",
        }
    }

    /// MPRIS spelling of the loop status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Track => "Track",
            Self::Playlist => "Playlist",
        }
    }
}

impl FromStr for LoopStatus {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "None" => Ok(Self::None),
            "Track" => Ok(Self::Track),
            "Playlist" => Ok(Self::Playlist),
            other => Err(BridgeError::invalid_value(
                "LoopStatus",
                format!("'{other}' is not one of None, Track, Playlist"),
            )),
        }
    }
}

impl fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translate a backend shuffle mode. Anything but `off` shuffles.
pub fn shuffle_from_bluez(shuffle: &str) -> bool {
    shuffle != "off"
}

/// Backend shuffle mode for an exposed shuffle flag.
pub fn shuffle_to_bluez(shuffle: bool) -> &'static str {
    if shuffle { "alltracks" } else { "off" }
}

/// Convert a backend time in milliseconds to MPRIS microseconds.
pub fn to_mpris_micros(millis: u32) -> i64 {
    i64::from(millis) * 1000
}
