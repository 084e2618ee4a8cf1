use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::{debug, instrument, warn};
use zbus::{Connection, fdo::PropertiesChanged, zvariant::Value};

use super::{MPRIS_OBJECT_PATH, PLAYER_INTERFACE, PropertyTable, PropertyValue};
use crate::services::bluez::MEDIA_PLAYER_INTERFACE;

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// A backend change notification reduced to what the relay acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendChange {
    /// Interface whose properties changed
    pub interface: String,

    /// Names of the changed properties
    pub properties: Vec<String>,
}

impl BackendChange {
    /// Reduce a received `PropertiesChanged` signal.
    ///
    /// Returns `None` for signals whose body cannot be decoded.
    pub fn from_signal(signal: &PropertiesChanged) -> Option<Self> {
        let args = match signal.args() {
            Ok(args) => args,
            Err(e) => {
                debug!("Dropping malformed PropertiesChanged: {e}");
                return None;
            }
        };

        Some(Self {
            interface: args.interface_name().to_string(),
            properties: args
                .changed_properties()
                .keys()
                .map(|name| name.to_string())
                .collect(),
        })
    }
}

/// Where the relay publishes resolved changes.
#[async_trait]
pub trait ChangeSink: Send + Sync {
    /// Publish one batch of changed properties of `interface`.
    ///
    /// # Errors
    /// Returns error if the batch cannot be published
    async fn properties_changed(
        &self,
        interface: &str,
        batch: BTreeMap<&'static str, PropertyValue>,
    ) -> zbus::Result<()>;
}

#[async_trait]
impl ChangeSink for Connection {
    async fn properties_changed(
        &self,
        interface: &str,
        batch: BTreeMap<&'static str, PropertyValue>,
    ) -> zbus::Result<()> {
        emit_properties_changed(self, interface, batch).await
    }
}

/// Drain a session's backend change stream.
///
/// Each change of `org.bluez.MediaPlayer1` becomes at most one
/// `PropertiesChanged` on the player interface, covering the exposed
/// properties it affects. Changes of any other interface are dropped.
/// Returns when the stream ends or the backend player vanishes.
#[instrument(skip_all, fields(session = %session))]
pub async fn run<S, K>(mut changes: S, table: Arc<PropertyTable>, sink: K, session: String)
where
    S: Stream<Item = BackendChange> + Unpin + Send,
    K: ChangeSink,
{
    while let Some(change) = changes.next().await {
        if change.interface != MEDIA_PLAYER_INTERFACE {
            continue;
        }
        debug!(changed = ?change.properties, "Backend properties changed");

        let batch = match table
            .changed_batch(change.properties.iter().map(String::as_str))
            .await
        {
            Ok(batch) => batch,
            Err(e) if e.is_object_gone() => {
                debug!("Backend player vanished, stopping relay");
                return;
            }
            Err(e) => {
                warn!("Failed to resolve changed properties: {e}");
                continue;
            }
        };

        if batch.is_empty() {
            continue;
        }

        if let Err(e) = sink.properties_changed(PLAYER_INTERFACE, batch).await {
            warn!("Failed to emit PropertiesChanged: {e}");
        }
    }

    debug!("Backend change stream ended");
}

/// Emit one `org.freedesktop.DBus.Properties.PropertiesChanged` at the MPRIS path.
///
/// # Errors
/// Returns error if the signal cannot be sent
pub async fn emit_properties_changed(
    connection: &Connection,
    interface: &str,
    batch: BTreeMap<&'static str, PropertyValue>,
) -> zbus::Result<()> {
    let changed: HashMap<&str, Value<'static>> = batch
        .into_iter()
        .map(|(name, value)| (name, value.into_value()))
        .collect();
    let invalidated: Vec<&str> = Vec::new();

    connection
        .emit_signal(
            Option::<&str>::None,
            MPRIS_OBJECT_PATH,
            PROPERTIES_INTERFACE,
            "PropertiesChanged",
            &(interface, changed, invalidated),
        )
        .await
}
