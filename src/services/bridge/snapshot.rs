use std::{collections::BTreeMap, fmt, sync::Arc};

use tracing::{instrument, warn};
use zbus::Connection;

use crate::{
    core::Result,
    services::{
        bluez::{BluezDevice, BluezPlayer, PlayerEnumerator, PlayerPath},
        mpris::{MprisInterface, PropertyTable, PropertyValue, SessionSettings},
    },
};

/// Exposed view of one backend player, read once.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// Backend player path
    pub path: PlayerPath,
    /// Name the player is exposed under
    pub exposed_name: String,
    /// `org.mpris.MediaPlayer2` properties
    pub root: BTreeMap<&'static str, PropertyValue>,
    /// `org.mpris.MediaPlayer2.Player` properties
    pub player: BTreeMap<&'static str, PropertyValue>,
}

impl PlayerSnapshot {
    /// Read every exposed property of `table`.
    ///
    /// # Errors
    /// Returns the first backend error
    pub async fn capture(path: &PlayerPath, table: &PropertyTable) -> Result<Self> {
        Ok(Self {
            path: path.clone(),
            exposed_name: path.exposed_name(),
            root: table.get_all(MprisInterface::Root).await?,
            player: table.get_all(MprisInterface::Player).await?,
        })
    }
}

impl fmt::Display for PlayerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.exposed_name, self.path)?;
        for (interface, values) in [
            (MprisInterface::Root, &self.root),
            (MprisInterface::Player, &self.player),
        ] {
            writeln!(f, "  {}", interface.name())?;
            for (name, value) in values {
                writeln!(f, "    {name} = {value:?}")?;
            }
        }
        Ok(())
    }
}

/// Snapshot every enumerated player without exposing anything.
///
/// Players that vanish between enumeration and reading are skipped.
///
/// # Errors
/// Returns error if enumeration fails
#[instrument(skip_all)]
pub async fn snapshot_players<E: PlayerEnumerator>(
    system: &Connection,
    enumerator: &E,
    settings: &SessionSettings,
) -> Result<Vec<PlayerSnapshot>> {
    let mut snapshots = Vec::new();

    for path in enumerator.enumerate().await? {
        match snapshot_player(system, &path, settings).await {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(e) => warn!(%path, "Skipping player: {e}"),
        }
    }

    Ok(snapshots)
}

async fn snapshot_player(
    system: &Connection,
    path: &PlayerPath,
    settings: &SessionSettings,
) -> Result<PlayerSnapshot> {
    let device = BluezDevice::connect(system, path.device_path()).await?;
    let player = BluezPlayer::connect(system, path).await?;
    let table = PropertyTable::new(
        Arc::new(device),
        Arc::new(player),
        &path.exposed_name(),
        &settings.art_url,
    );

    PlayerSnapshot::capture(path, &table).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::bluez::testing::{FakeDevice, FakePlayer};

    #[tokio::test]
    async fn capture_reads_both_interfaces() {
        let path = PlayerPath::parse("/org/bluez/hci0/dev_AA_BB/player0").unwrap();
        let player = Arc::new(FakePlayer::default());
        player.update(|state| state.status = "playing".to_string());
        let table = PropertyTable::new(
            Arc::new(FakeDevice::new("Phone")),
            player,
            &path.exposed_name(),
            "file:///art.png",
        );

        let snapshot = PlayerSnapshot::capture(&path, &table).await.unwrap();

        assert_eq!(snapshot.root.len(), 9);
        assert_eq!(snapshot.player.len(), 15);
        assert_eq!(
            snapshot.player.get("PlaybackStatus"),
            Some(&PropertyValue::Str("Playing".to_string()))
        );

        let rendered = snapshot.to_string();
        assert!(rendered.starts_with("btdevAABBplayer0 (/org/bluez/hci0/dev_AA_BB/player0)\n"));
        assert!(rendered.contains("  org.mpris.MediaPlayer2.Player\n"));
        assert!(rendered.contains("    Identity = Str(\"Phone\")\n"));
    }
}
