use std::{collections::HashMap, sync::Arc};

use tracing::debug;
use zbus::{
    fdo, interface,
    object_server::SignalEmitter,
    zvariant::{OwnedObjectPath, OwnedValue},
};

use super::{
    Metadata, PlayerProperty, PropertyKey, PropertyTable, PropertyValue, RootProperty,
};
use crate::core::BridgeError;

async fn read<T>(table: &PropertyTable, key: impl Into<PropertyKey>) -> fdo::Result<T>
where
    T: TryFrom<PropertyValue, Error = BridgeError>,
{
    Ok(table.get(key).await?.try_into()?)
}

/// Route a `Properties.Set` to the table.
///
/// Read-only properties accept and ignore the write. zbus emits the change
/// for writable ones by re-reading the getter once the setter returns.
async fn write(
    table: &PropertyTable,
    key: impl Into<PropertyKey>,
    value: impl Into<PropertyValue>,
) -> fdo::Result<()> {
    table.apply(key, value.into()).await?;
    Ok(())
}

/// `org.mpris.MediaPlayer2` served for one session.
///
/// All properties come from the session's [`PropertyTable`]. Every property
/// accepts `Set`; those without a table setter ignore it.
pub struct RootInterface {
    table: Arc<PropertyTable>,
}

impl RootInterface {
    /// Serve the root interface from `table`.
    pub fn new(table: Arc<PropertyTable>) -> Self {
        Self { table }
    }
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootInterface {
    /// No window to raise.
    async fn raise(&self) {
        debug!("org.mpris.MediaPlayer2.Raise called");
    }

    /// The remote player cannot be quit.
    async fn quit(&self) {
        debug!("org.mpris.MediaPlayer2.Quit called");
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_quit(&self) -> fdo::Result<bool> {
        read(&self.table, RootProperty::CanQuit).await
    }

    #[zbus(property)]
    async fn set_can_quit(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, RootProperty::CanQuit, value).await
    }

    #[zbus(property(emits_changed_signal = "false"))]
    async fn fullscreen(&self) -> fdo::Result<bool> {
        read(&self.table, RootProperty::Fullscreen).await
    }

    #[zbus(property)]
    async fn set_fullscreen(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, RootProperty::Fullscreen, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_set_fullscreen(&self) -> fdo::Result<bool> {
        read(&self.table, RootProperty::CanSetFullscreen).await
    }

    #[zbus(property)]
    async fn set_can_set_fullscreen(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, RootProperty::CanSetFullscreen, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_raise(&self) -> fdo::Result<bool> {
        read(&self.table, RootProperty::CanRaise).await
    }

    #[zbus(property)]
    async fn set_can_raise(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, RootProperty::CanRaise, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn has_track_list(&self) -> fdo::Result<bool> {
        read(&self.table, RootProperty::HasTrackList).await
    }

    #[zbus(property)]
    async fn set_has_track_list(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, RootProperty::HasTrackList, value).await
    }

    #[zbus(property(emits_changed_signal = "false"))]
    async fn identity(&self) -> fdo::Result<String> {
        read(&self.table, RootProperty::Identity).await
    }

    #[zbus(property)]
    async fn set_identity(&mut self, value: String) -> fdo::Result<()> {
        write(&self.table, RootProperty::Identity, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn desktop_entry(&self) -> fdo::Result<String> {
        read(&self.table, RootProperty::DesktopEntry).await
    }

    #[zbus(property)]
    async fn set_desktop_entry(&mut self, value: String) -> fdo::Result<()> {
        write(&self.table, RootProperty::DesktopEntry, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn supported_uri_schemes(&self) -> fdo::Result<Vec<String>> {
        read(&self.table, RootProperty::SupportedUriSchemes).await
    }

    #[zbus(property)]
    async fn set_supported_uri_schemes(&mut self, value: Vec<String>) -> fdo::Result<()> {
        write(&self.table, RootProperty::SupportedUriSchemes, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn supported_mime_types(&self) -> fdo::Result<Vec<String>> {
        read(&self.table, RootProperty::SupportedMimeTypes).await
    }

    #[zbus(property)]
    async fn set_supported_mime_types(&mut self, value: Vec<String>) -> fdo::Result<()> {
        write(&self.table, RootProperty::SupportedMimeTypes, value).await
    }
}

/// `org.mpris.MediaPlayer2.Player` served for one session.
///
/// Transport methods are forwarded to the backend player. Seeking and URI
/// opening are guarded by the capability flags and otherwise do nothing.
pub struct PlayerInterface {
    table: Arc<PropertyTable>,
}

impl PlayerInterface {
    /// Serve the player interface from `table`.
    pub fn new(table: Arc<PropertyTable>) -> Self {
        Self { table }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerInterface {
    /// Skip to the next track.
    async fn next(&self) -> fdo::Result<()> {
        debug!("org.mpris.MediaPlayer2.Player.Next called");
        Ok(self.table.player().next().await?)
    }

    /// Skip to the previous track.
    async fn previous(&self) -> fdo::Result<()> {
        debug!("org.mpris.MediaPlayer2.Player.Previous called");
        Ok(self.table.player().previous().await?)
    }

    /// Pause playback.
    async fn pause(&self) -> fdo::Result<()> {
        debug!("org.mpris.MediaPlayer2.Player.Pause called");
        Ok(self.table.player().pause().await?)
    }

    /// Pause if playing, otherwise start playback.
    async fn play_pause(&self) -> fdo::Result<()> {
        debug!("org.mpris.MediaPlayer2.Player.PlayPause called");
        let player = self.table.player();

        if player.status().await? == "playing" {
            Ok(player.pause().await?)
        } else {
            Ok(player.play().await?)
        }
    }

    /// Stop playback.
    async fn stop(&self) -> fdo::Result<()> {
        debug!("org.mpris.MediaPlayer2.Player.Stop called");
        Ok(self.table.player().stop().await?)
    }

    /// Start or resume playback.
    async fn play(&self) -> fdo::Result<()> {
        debug!("org.mpris.MediaPlayer2.Player.Play called");
        Ok(self.table.player().play().await?)
    }

    /// Seeking is not supported by the backend.
    async fn seek(&self, offset: i64) -> fdo::Result<()> {
        debug!(offset, "org.mpris.MediaPlayer2.Player.Seek called");
        if !self.table.flag(PlayerProperty::CanSeek).await? {
            debug!("Seek not allowed");
        }
        Ok(())
    }

    /// Seeking is not supported by the backend.
    #[zbus(name = "SetPosition")]
    async fn set_track_position(
        &self,
        track_id: OwnedObjectPath,
        position: i64,
    ) -> fdo::Result<()> {
        debug!(%track_id, position, "org.mpris.MediaPlayer2.Player.SetPosition called");
        if !self.table.flag(PlayerProperty::CanSeek).await? {
            debug!("SetPosition not allowed");
        }
        Ok(())
    }

    /// Opening URIs is not supported by the backend.
    async fn open_uri(&self, uri: String) -> fdo::Result<()> {
        debug!(%uri, "org.mpris.MediaPlayer2.Player.OpenUri called");
        if !self.table.flag(PlayerProperty::CanControl).await? {
            debug!("OpenUri not allowed");
        }
        Ok(())
    }

    /// Declared for completeness; the backend offers no seeking.
    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property(emits_changed_signal = "false"))]
    async fn playback_status(&self) -> fdo::Result<String> {
        read(&self.table, PlayerProperty::PlaybackStatus).await
    }

    #[zbus(property)]
    async fn set_playback_status(&mut self, value: String) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::PlaybackStatus, value).await
    }

    #[zbus(property)]
    async fn loop_status(&self) -> fdo::Result<String> {
        read(&self.table, PlayerProperty::LoopStatus).await
    }

    #[zbus(property)]
    async fn set_loop_status(&mut self, value: String) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::LoopStatus, value).await
    }

    #[zbus(property)]
    async fn rate(&self) -> fdo::Result<f64> {
        read(&self.table, PlayerProperty::Rate).await
    }

    #[zbus(property)]
    async fn set_rate(&mut self, value: f64) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::Rate, value).await
    }

    #[zbus(property)]
    async fn shuffle(&self) -> fdo::Result<bool> {
        read(&self.table, PlayerProperty::Shuffle).await
    }

    #[zbus(property)]
    async fn set_shuffle(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::Shuffle, value).await
    }

    #[zbus(property(emits_changed_signal = "false"))]
    async fn metadata(&self) -> fdo::Result<HashMap<String, OwnedValue>> {
        let metadata: Metadata = read(&self.table, PlayerProperty::Metadata).await?;

        metadata
            .into_dict()
            .into_iter()
            .map(|(key, value)| {
                OwnedValue::try_from(value)
                    .map(|value| (key, value))
                    .map_err(|e| fdo::Error::Failed(format!("metadata conversion failed: {e}")))
            })
            .collect()
    }

    /// Track metadata is read-only; the written dictionary is discarded.
    #[zbus(property)]
    async fn set_metadata(&mut self, _value: HashMap<String, OwnedValue>) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::Metadata, Metadata::empty()).await
    }

    #[zbus(property)]
    async fn volume(&self) -> fdo::Result<f64> {
        read(&self.table, PlayerProperty::Volume).await
    }

    #[zbus(property)]
    async fn set_volume(&mut self, value: f64) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::Volume, value).await
    }

    #[zbus(property(emits_changed_signal = "false"))]
    async fn position(&self) -> fdo::Result<i64> {
        read(&self.table, PlayerProperty::Position).await
    }

    #[zbus(property)]
    async fn set_position(&mut self, value: i64) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::Position, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn minimum_rate(&self) -> fdo::Result<f64> {
        read(&self.table, PlayerProperty::MinimumRate).await
    }

    #[zbus(property)]
    async fn set_minimum_rate(&mut self, value: f64) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::MinimumRate, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn maximum_rate(&self) -> fdo::Result<f64> {
        read(&self.table, PlayerProperty::MaximumRate).await
    }

    #[zbus(property)]
    async fn set_maximum_rate(&mut self, value: f64) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::MaximumRate, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_go_next(&self) -> fdo::Result<bool> {
        read(&self.table, PlayerProperty::CanGoNext).await
    }

    #[zbus(property)]
    async fn set_can_go_next(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::CanGoNext, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_go_previous(&self) -> fdo::Result<bool> {
        read(&self.table, PlayerProperty::CanGoPrevious).await
    }

    #[zbus(property)]
    async fn set_can_go_previous(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::CanGoPrevious, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_play(&self) -> fdo::Result<bool> {
        read(&self.table, PlayerProperty::CanPlay).await
    }

    #[zbus(property)]
    async fn set_can_play(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::CanPlay, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_pause(&self) -> fdo::Result<bool> {
        read(&self.table, PlayerProperty::CanPause).await
    }

    #[zbus(property)]
    async fn set_can_pause(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::CanPause, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_seek(&self) -> fdo::Result<bool> {
        read(&self.table, PlayerProperty::CanSeek).await
    }

    #[zbus(property)]
    async fn set_can_seek(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::CanSeek, value).await
    }

    #[zbus(property(emits_changed_signal = "const"))]
    async fn can_control(&self) -> fdo::Result<bool> {
        read(&self.table, PlayerProperty::CanControl).await
    }

    #[zbus(property)]
    async fn set_can_control(&mut self, value: bool) -> fdo::Result<()> {
        write(&self.table, PlayerProperty::CanControl, value).await
    }
}

#[cfg(test)]
mod tests {
    use zbus::{Connection, Message, MessageStream, zvariant::Value};

    use super::*;
    use crate::services::{
        bluez::testing::FakePlayer,
        mpris::{
            MPRIS_OBJECT_PATH, PLAYER_INTERFACE, ROOT_INTERFACE,
            testing::{next_signal, served_pair, table},
        },
    };

    const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

    async fn call<B>(
        client: &Connection,
        interface: &str,
        method: &str,
        body: &B,
    ) -> zbus::Result<Message>
    where
        B: serde::Serialize + zbus::zvariant::DynamicType,
    {
        client
            .call_method(None::<()>, MPRIS_OBJECT_PATH, Some(interface), method, body)
            .await
    }

    async fn set(
        client: &Connection,
        interface: &str,
        property: &str,
        value: Value<'_>,
    ) -> zbus::Result<Message> {
        call(client, PROPERTIES_INTERFACE, "Set", &(interface, property, value)).await
    }

    #[tokio::test]
    async fn set_on_read_only_property_is_accepted_and_silent() {
        let player = Arc::new(FakePlayer::default());
        let (_server, client) = served_pair(table(player.clone())).await;
        let mut stream = MessageStream::from(&client);

        let metadata: HashMap<&str, Value<'_>> = HashMap::new();
        let writes = [
            (ROOT_INTERFACE, "CanQuit", Value::from(false)),
            (ROOT_INTERFACE, "Identity", Value::from("Speaker")),
            (ROOT_INTERFACE, "Fullscreen", Value::from(true)),
            (PLAYER_INTERFACE, "CanSeek", Value::from(true)),
            (PLAYER_INTERFACE, "PlaybackStatus", Value::from("Playing")),
            (PLAYER_INTERFACE, "Position", Value::from(5_i64)),
            (PLAYER_INTERFACE, "Metadata", Value::from(metadata)),
        ];
        for (interface, property, value) in writes {
            assert!(
                set(&client, interface, property, value).await.is_ok(),
                "Set({property}) was rejected"
            );
        }

        // The first signal on the wire must come from the writable property.
        set(&client, PLAYER_INTERFACE, "LoopStatus", Value::from("Track"))
            .await
            .unwrap();
        let signal = next_signal(&mut stream).await;
        let (interface, changed, _): (String, HashMap<String, OwnedValue>, Vec<String>) =
            signal.body().deserialize().unwrap();

        assert_eq!(interface, PLAYER_INTERFACE);
        assert_eq!(changed.keys().collect::<Vec<_>>(), vec!["LoopStatus"]);
        assert_eq!(player.state().repeat, "singletrack");
        assert_eq!(player.calls(), Vec::<&str>::new());
    }

    #[tokio::test]
    async fn read_only_values_survive_set() {
        let (_server, client) = served_pair(table(Arc::new(FakePlayer::default()))).await;

        set(&client, ROOT_INTERFACE, "CanQuit", Value::from(false))
            .await
            .unwrap();
        let reply = call(&client, PROPERTIES_INTERFACE, "Get", &(ROOT_INTERFACE, "CanQuit"))
            .await
            .unwrap();
        let value: OwnedValue = reply.body().deserialize().unwrap();

        assert!(bool::try_from(value).unwrap());
    }

    #[tokio::test]
    async fn set_with_wrong_type_is_rejected() {
        let (_server, client) = served_pair(table(Arc::new(FakePlayer::default()))).await;

        assert!(
            set(&client, PLAYER_INTERFACE, "Shuffle", Value::from("yes"))
                .await
                .is_err()
        );
        assert!(
            set(&client, PLAYER_INTERFACE, "LoopStatus", Value::from("Forever"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn get_all_serves_every_root_property() {
        let (_server, client) = served_pair(table(Arc::new(FakePlayer::default()))).await;

        let reply = call(&client, PROPERTIES_INTERFACE, "GetAll", &(ROOT_INTERFACE,))
            .await
            .unwrap();
        let properties: HashMap<String, OwnedValue> = reply.body().deserialize().unwrap();

        assert_eq!(properties.len(), RootProperty::ALL.len());
        assert_eq!(
            String::try_from(properties["Identity"].try_clone().unwrap()).unwrap(),
            "Headphones"
        );
    }

    #[tokio::test]
    async fn play_pause_toggles_on_backend_status() {
        let player = Arc::new(FakePlayer::default());
        let (_server, client) = served_pair(table(player.clone())).await;

        call(&client, PLAYER_INTERFACE, "PlayPause", &()).await.unwrap();
        player.update(|state| state.status = "playing".to_string());
        call(&client, PLAYER_INTERFACE, "PlayPause", &()).await.unwrap();
        call(&client, PLAYER_INTERFACE, "Seek", &(1_000_i64,)).await.unwrap();

        assert_eq!(player.calls(), vec!["play", "pause"]);
    }
}
