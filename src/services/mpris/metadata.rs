use std::collections::HashMap;

use uuid::Uuid;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};

use super::types::to_mpris_micros;
use crate::services::bluez::TrackRecord;

/// Track id reported while the device has nothing loaded.
pub const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

const TRACK_ID_PREFIX: &str = "/org/bluempris/track/";

/// Exposed metadata of the current track.
///
/// Only fields present in the backend record are set; absent fields are
/// omitted from the dictionary rather than defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    /// `mpris:trackid`
    pub track_id: OwnedObjectPath,

    /// `mpris:artUrl`
    pub art_url: Option<String>,

    /// `mpris:length`, microseconds
    pub length: Option<i64>,

    /// `xesam:title`
    pub title: Option<String>,

    /// `xesam:artist`
    pub artist: Option<Vec<String>>,

    /// `xesam:album`
    pub album: Option<String>,

    /// `xesam:genre`
    pub genre: Option<Vec<String>>,

    /// `xesam:trackNumber`
    pub track_number: Option<i32>,
}

impl Metadata {
    /// Placeholder metadata carrying only the no-track id.
    pub fn empty() -> Self {
        Self {
            track_id: ObjectPath::from_static_str_unchecked(NO_TRACK).into(),
            art_url: None,
            length: None,
            title: None,
            artist: None,
            album: None,
            genre: None,
            track_number: None,
        }
    }

    /// Translate the backend track record.
    ///
    /// A fresh track id is generated on every call, so two reads of the same
    /// track report different ids.
    pub fn from_track(track: Option<&TrackRecord>, art_url: &str) -> Self {
        let Some(track) = track else {
            return Self::empty();
        };

        let track_id = ObjectPath::from_string_unchecked(format!(
            "{TRACK_ID_PREFIX}{}",
            Uuid::new_v4().simple()
        ));

        Self {
            track_id: track_id.into(),
            art_url: Some(art_url.to_string()),
            length: track.duration.map(to_mpris_micros),
            title: track.title.clone(),
            artist: track.artist.clone().map(|artist| vec![artist]),
            album: track.album.clone(),
            genre: track.genre.clone().map(|genre| vec![genre]),
            track_number: track.track_number.and_then(|n| i32::try_from(n).ok()),
        }
    }

    /// Render as an MPRIS `a{sv}` dictionary.
    pub fn into_dict(self) -> HashMap<String, Value<'static>> {
        let mut dict = HashMap::new();
        dict.insert(
            "mpris:trackid".to_string(),
            Value::from(self.track_id.into_inner()),
        );

        if let Some(art_url) = self.art_url {
            dict.insert("mpris:artUrl".to_string(), Value::from(art_url));
        }
        if let Some(length) = self.length {
            dict.insert("mpris:length".to_string(), Value::from(length));
        }
        if let Some(title) = self.title {
            dict.insert("xesam:title".to_string(), Value::from(title));
        }
        if let Some(artist) = self.artist {
            dict.insert("xesam:artist".to_string(), Value::from(artist));
        }
        if let Some(album) = self.album {
            dict.insert("xesam:album".to_string(), Value::from(album));
        }
        if let Some(genre) = self.genre {
            dict.insert("xesam:genre".to_string(), Value::from(genre));
        }
        if let Some(track_number) = self.track_number {
            dict.insert("xesam:trackNumber".to_string(), Value::from(track_number));
        }

        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ART: &str = "file:///usr/share/bluempris/default_artwork.png";

    fn sorted_keys(metadata: Metadata) -> Vec<String> {
        let mut keys: Vec<String> = metadata.into_dict().into_keys().collect();
        keys.sort();
        keys
    }

    #[test]
    fn empty_record_yields_placeholder_only() {
        let metadata = Metadata::from_track(None, ART);

        assert_eq!(metadata.track_id.as_str(), NO_TRACK);
        assert_eq!(sorted_keys(metadata), vec!["mpris:trackid"]);
    }

    #[test]
    fn title_only_record_omits_other_fields() {
        let track = TrackRecord {
            title: Some("Song".to_string()),
            ..TrackRecord::default()
        };

        let metadata = Metadata::from_track(Some(&track), ART);

        assert_eq!(metadata.title.as_deref(), Some("Song"));
        assert_eq!(
            sorted_keys(metadata),
            vec!["mpris:artUrl", "mpris:trackid", "xesam:title"]
        );
    }

    #[test]
    fn full_record_converts_units_and_shapes() {
        let track = TrackRecord {
            title: Some("Song".to_string()),
            artist: Some("Band".to_string()),
            album: Some("Record".to_string()),
            genre: Some("Rock".to_string()),
            track_number: Some(7),
            duration: Some(215_000),
        };

        let metadata = Metadata::from_track(Some(&track), ART);

        assert_eq!(metadata.length, Some(215_000_000));
        assert_eq!(metadata.artist, Some(vec!["Band".to_string()]));
        assert_eq!(metadata.genre, Some(vec!["Rock".to_string()]));
        assert_eq!(metadata.track_number, Some(7));
        assert_eq!(metadata.art_url.as_deref(), Some(ART));
        assert_eq!(sorted_keys(metadata).len(), 8);
    }

    #[test]
    fn track_id_is_regenerated_on_every_read() {
        let track = TrackRecord {
            title: Some("Song".to_string()),
            ..TrackRecord::default()
        };

        let first = Metadata::from_track(Some(&track), ART);
        let second = Metadata::from_track(Some(&track), ART);

        assert!(first.track_id.as_str().starts_with(TRACK_ID_PREFIX));
        assert_ne!(first.track_id, second.track_id);
    }
}
