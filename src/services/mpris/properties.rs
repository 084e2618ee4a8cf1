use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;
use zbus::zvariant::Value;

use super::{
    Metadata, PLAYER_INTERFACE, ROOT_INTERFACE,
    types::{LoopStatus, PlaybackStatus, shuffle_from_bluez, shuffle_to_bluez, to_mpris_micros},
};
use crate::{
    core::{BridgeError, Result},
    services::bluez::{DeviceBackend, PlayerBackend},
};

/// The two MPRIS interfaces a session serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MprisInterface {
    /// `org.mpris.MediaPlayer2`
    Root,

    /// `org.mpris.MediaPlayer2.Player`
    Player,
}

impl MprisInterface {
    /// D-Bus interface name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Root => ROOT_INTERFACE,
            Self::Player => PLAYER_INTERFACE,
        }
    }

    /// Resolve a D-Bus interface name.
    ///
    /// # Errors
    /// Returns `BridgeError::UnknownInterface` for any other name
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            ROOT_INTERFACE => Ok(Self::Root),
            PLAYER_INTERFACE => Ok(Self::Player),
            other => Err(BridgeError::UnknownInterface(other.to_string())),
        }
    }
}

macro_rules! property_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[allow(missing_docs)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every property of the interface.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// D-Bus property name.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

property_enum! {
    /// Properties of `org.mpris.MediaPlayer2`.
    RootProperty {
        CanQuit,
        Fullscreen,
        CanSetFullscreen,
        CanRaise,
        HasTrackList,
        Identity,
        DesktopEntry,
        SupportedUriSchemes,
        SupportedMimeTypes,
    }
}

property_enum! {
    /// Properties of `org.mpris.MediaPlayer2.Player`.
    PlayerProperty {
        PlaybackStatus,
        LoopStatus,
        Rate,
        Shuffle,
        Metadata,
        Volume,
        Position,
        MinimumRate,
        MaximumRate,
        CanGoNext,
        CanGoPrevious,
        CanPlay,
        CanPause,
        CanSeek,
        CanControl,
    }
}

/// A property of either exposed interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    /// Root interface property
    Root(RootProperty),

    /// Player interface property
    Player(PlayerProperty),
}

impl PropertyKey {
    /// Interface the property belongs to.
    pub fn interface(self) -> MprisInterface {
        match self {
            Self::Root(_) => MprisInterface::Root,
            Self::Player(_) => MprisInterface::Player,
        }
    }

    /// D-Bus property name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Root(property) => property.name(),
            Self::Player(property) => property.name(),
        }
    }

    /// Resolve an (interface, property) pair as received over D-Bus.
    ///
    /// # Errors
    /// Returns `UnknownInterface` or `UnknownProperty` when either name is
    /// outside the declared schema
    pub fn parse(interface: &str, property: &str) -> Result<Self> {
        let unknown = || BridgeError::UnknownProperty {
            interface: interface.to_string(),
            property: property.to_string(),
        };

        match MprisInterface::parse(interface)? {
            MprisInterface::Root => RootProperty::from_name(property)
                .map(Self::Root)
                .ok_or_else(unknown),
            MprisInterface::Player => PlayerProperty::from_name(property)
                .map(Self::Player)
                .ok_or_else(unknown),
        }
    }
}

impl From<RootProperty> for PropertyKey {
    fn from(property: RootProperty) -> Self {
        Self::Root(property)
    }
}

impl From<PlayerProperty> for PropertyKey {
    fn from(property: PlayerProperty) -> Self {
        Self::Player(property)
    }
}

/// Value of an exposed property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `b`
    Bool(bool),

    /// `d`
    Double(f64),

    /// `x`
    Int64(i64),

    /// `s`
    Str(String),

    /// `as`
    StrList(Vec<String>),

    /// `a{sv}`
    Metadata(Metadata),
}

impl PropertyValue {
    /// Convert to a D-Bus value.
    pub fn into_value(self) -> Value<'static> {
        match self {
            Self::Bool(value) => Value::from(value),
            Self::Double(value) => Value::from(value),
            Self::Int64(value) => Value::from(value),
            Self::Str(value) => Value::from(value),
            Self::StrList(value) => Value::from(value),
            Self::Metadata(value) => Value::from(value.into_dict()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Double(_) => "double",
            Self::Int64(_) => "int64",
            Self::Str(_) => "string",
            Self::StrList(_) => "string list",
            Self::Metadata(_) => "metadata",
        }
    }
}

fn variant_kind(variant: &str) -> &'static str {
    match variant {
        "Bool" => "boolean",
        "Double" => "double",
        "Int64" => "int64",
        "Str" => "string",
        "StrList" => "string list",
        _ => "metadata",
    }
}

macro_rules! property_value_conversions {
    ($($variant:ident => $ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::$variant(value)
                }
            }

            impl TryFrom<PropertyValue> for $ty {
                type Error = BridgeError;

                fn try_from(value: PropertyValue) -> Result<Self> {
                    match value {
                        PropertyValue::$variant(inner) => Ok(inner),
                        other => Err(BridgeError::invalid_value(
                            "value",
                            format!("expected {}, got {}", variant_kind(stringify!($variant)), other.kind()),
                        )),
                    }
                }
            }
        )+
    };
}

property_value_conversions! {
    Bool => bool,
    Double => f64,
    Int64 => i64,
    Str => String,
    StrList => Vec<String>,
    Metadata => Metadata,
}

/// Backend reads behind the dynamic properties.
#[derive(Debug, Clone, Copy)]
enum LiveRead {
    DeviceName,
    PlaybackStatus,
    LoopStatus,
    Shuffle,
    Metadata,
    Position,
}

#[derive(Debug, Clone)]
enum Getter {
    Constant(PropertyValue),
    Live(LiveRead),
}

#[derive(Debug, Clone, Copy)]
enum Setter {
    LoopStatus,
    Shuffle,
    Rate,
    Volume,
}

#[derive(Debug, Clone)]
struct PropertyEntry {
    getter: Getter,
    setter: Option<Setter>,
}

impl PropertyEntry {
    fn constant(value: impl Into<PropertyValue>) -> Self {
        Self {
            getter: Getter::Constant(value.into()),
            setter: None,
        }
    }

    fn live(read: LiveRead) -> Self {
        Self {
            getter: Getter::Live(read),
            setter: None,
        }
    }

    fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }
}

/// Exposed property corresponding to a backend `MediaPlayer1` property.
///
/// Backend properties without an exposed counterpart map to `None`.
pub fn translated_property(backend_property: &str) -> Option<PlayerProperty> {
    match backend_property {
        "Repeat" => Some(PlayerProperty::LoopStatus),
        "Shuffle" => Some(PlayerProperty::Shuffle),
        "Status" => Some(PlayerProperty::PlaybackStatus),
        "Position" => Some(PlayerProperty::Position),
        "Track" => Some(PlayerProperty::Metadata),
        _ => None,
    }
}

/// Per-session property table for both exposed interfaces.
///
/// Built once when the session is created. Every entry is a getter, either
/// a constant or a live backend read, and an optional setter. `get`,
/// `get_all` and `set` are implemented once against the table, and the
/// change relay resolves its batches through the same getters.
pub struct PropertyTable {
    entries: BTreeMap<PropertyKey, PropertyEntry>,
    device: Arc<dyn DeviceBackend>,
    player: Arc<dyn PlayerBackend>,
    art_url: String,
}

impl PropertyTable {
    /// Build the table for one device/player pair.
    ///
    /// `desktop_entry` is the session's exposed name and `art_url` the
    /// artwork attached to every non-empty track.
    pub fn new(
        device: Arc<dyn DeviceBackend>,
        player: Arc<dyn PlayerBackend>,
        desktop_entry: &str,
        art_url: &str,
    ) -> Self {
        use PlayerProperty as P;
        use RootProperty as R;

        let root = [
            (R::CanQuit, PropertyEntry::constant(true)),
            (R::Fullscreen, PropertyEntry::constant(false)),
            (R::CanSetFullscreen, PropertyEntry::constant(false)),
            (R::CanRaise, PropertyEntry::constant(true)),
            (R::HasTrackList, PropertyEntry::constant(false)),
            (R::Identity, PropertyEntry::live(LiveRead::DeviceName)),
            (
                R::DesktopEntry,
                PropertyEntry::constant(desktop_entry.to_string()),
            ),
            (
                R::SupportedUriSchemes,
                PropertyEntry::constant(Vec::<String>::new()),
            ),
            (
                R::SupportedMimeTypes,
                PropertyEntry::constant(Vec::<String>::new()),
            ),
        ];

        let player_entries = [
            (P::PlaybackStatus, PropertyEntry::live(LiveRead::PlaybackStatus)),
            (
                P::LoopStatus,
                PropertyEntry::live(LiveRead::LoopStatus).with_setter(Setter::LoopStatus),
            ),
            (P::Rate, PropertyEntry::constant(1.0).with_setter(Setter::Rate)),
            (
                P::Shuffle,
                PropertyEntry::live(LiveRead::Shuffle).with_setter(Setter::Shuffle),
            ),
            (P::Metadata, PropertyEntry::live(LiveRead::Metadata)),
            (P::Volume, PropertyEntry::constant(1.0).with_setter(Setter::Volume)),
            (P::Position, PropertyEntry::live(LiveRead::Position)),
            (P::MinimumRate, PropertyEntry::constant(1.0)),
            (P::MaximumRate, PropertyEntry::constant(1.0)),
            (P::CanGoNext, PropertyEntry::constant(true)),
            (P::CanGoPrevious, PropertyEntry::constant(true)),
            (P::CanPlay, PropertyEntry::constant(true)),
            (P::CanPause, PropertyEntry::constant(true)),
            (P::CanSeek, PropertyEntry::constant(false)),
            (P::CanControl, PropertyEntry::constant(true)),
        ];

        let entries = root
            .into_iter()
            .map(|(property, entry)| (PropertyKey::Root(property), entry))
            .chain(
                player_entries
                    .into_iter()
                    .map(|(property, entry)| (PropertyKey::Player(property), entry)),
            )
            .collect();

        Self {
            entries,
            device,
            player,
            art_url: art_url.to_string(),
        }
    }

    /// Backend player the table reads from.
    pub fn player(&self) -> &Arc<dyn PlayerBackend> {
        &self.player
    }

    /// Whether the property has a setter.
    pub fn is_writable(&self, key: impl Into<PropertyKey>) -> bool {
        self.entries
            .get(&key.into())
            .is_some_and(|entry| entry.setter.is_some())
    }

    fn entry(&self, key: PropertyKey) -> Result<&PropertyEntry> {
        self.entries
            .get(&key)
            .ok_or_else(|| BridgeError::UnknownProperty {
                interface: key.interface().name().to_string(),
                property: key.name().to_string(),
            })
    }

    /// Current value of a property.
    ///
    /// Constants are returned as stored; live entries read the backend now.
    ///
    /// # Errors
    /// Returns error if the backend read fails
    pub async fn get(&self, key: impl Into<PropertyKey>) -> Result<PropertyValue> {
        let entry = self.entry(key.into())?;

        match &entry.getter {
            Getter::Constant(value) => Ok(value.clone()),
            Getter::Live(read) => self.read(*read).await,
        }
    }

    /// [`get`](Self::get) with D-Bus names.
    ///
    /// # Errors
    /// Returns `UnknownInterface`/`UnknownProperty` for names outside the
    /// schema, or the backend error
    pub async fn get_by_name(&self, interface: &str, property: &str) -> Result<PropertyValue> {
        self.get(PropertyKey::parse(interface, property)?).await
    }

    /// Snapshot of every property of an interface.
    ///
    /// Each live property costs one backend round-trip.
    ///
    /// # Errors
    /// Returns the first backend error encountered
    pub async fn get_all(
        &self,
        interface: MprisInterface,
    ) -> Result<BTreeMap<&'static str, PropertyValue>> {
        let mut values = BTreeMap::new();

        for key in self.entries.keys().filter(|key| key.interface() == interface) {
            values.insert(key.name(), self.get(*key).await?);
        }

        Ok(values)
    }

    /// [`get_all`](Self::get_all) with a D-Bus interface name.
    ///
    /// # Errors
    /// Returns `UnknownInterface` for names outside the schema, or the
    /// backend error
    pub async fn get_all_by_name(
        &self,
        interface: &str,
    ) -> Result<BTreeMap<&'static str, PropertyValue>> {
        self.get_all(MprisInterface::parse(interface)?).await
    }

    /// Write a property.
    ///
    /// Properties without a setter ignore the write and return `None`.
    /// Otherwise the setter runs and the property is read back; the fresh
    /// value is returned for the change notification.
    ///
    /// # Errors
    /// Returns `InvalidValue` if the value has the wrong type or vocabulary,
    /// or the backend error
    pub async fn set(
        &self,
        key: impl Into<PropertyKey>,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>> {
        let key = key.into();

        if !self.apply(key, value).await? {
            return Ok(None);
        }
        Ok(Some(self.get(key).await?))
    }

    /// Run a property's setter without reading the value back.
    ///
    /// Returns whether a setter ran. Properties without one ignore the
    /// write.
    ///
    /// # Errors
    /// Returns `InvalidValue` if the value has the wrong type or vocabulary,
    /// or the backend error
    pub async fn apply(&self, key: impl Into<PropertyKey>, value: PropertyValue) -> Result<bool> {
        let key = key.into();
        let Some(setter) = self.entry(key)?.setter else {
            debug!(property = key.name(), "Ignoring write to read-only property");
            return Ok(false);
        };

        self.write(key, setter, value).await?;
        Ok(true)
    }

    /// [`set`](Self::set) with D-Bus names.
    ///
    /// # Errors
    /// Returns `UnknownInterface`/`UnknownProperty` for names outside the
    /// schema, or any error of [`set`](Self::set)
    pub async fn set_by_name(
        &self,
        interface: &str,
        property: &str,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>> {
        self.set(PropertyKey::parse(interface, property)?, value)
            .await
    }

    /// Current value of a boolean capability flag.
    ///
    /// # Errors
    /// Returns `InvalidValue` if the property is not boolean
    pub async fn flag(&self, key: impl Into<PropertyKey>) -> Result<bool> {
        self.get(key).await?.try_into()
    }

    /// Resolve the exposed changes implied by a backend change notification.
    ///
    /// Every backend property with an exposed counterpart contributes that
    /// property once, resolved through its getter rather than taken from the
    /// notification payload. The batch is ordered by property.
    ///
    /// # Errors
    /// Returns the first backend error encountered
    pub async fn changed_batch<'a, I>(
        &self,
        backend_properties: I,
    ) -> Result<BTreeMap<&'static str, PropertyValue>>
    where
        I: IntoIterator<Item = &'a str> + Send,
        I::IntoIter: Send,
    {
        let affected: Vec<PlayerProperty> = backend_properties
            .into_iter()
            .filter_map(translated_property)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut batch = BTreeMap::new();
        for property in affected {
            batch.insert(property.name(), self.get(property).await?);
        }

        Ok(batch)
    }

    async fn read(&self, read: LiveRead) -> Result<PropertyValue> {
        let value = match read {
            LiveRead::DeviceName => PropertyValue::Str(self.device.name().await?),
            LiveRead::PlaybackStatus => {
                let status = self.player.status().await?;
                PropertyValue::Str(PlaybackStatus::from_bluez(&status).as_str().to_string())
            }
            LiveRead::LoopStatus => {
                let repeat = self.player.repeat().await?;
                PropertyValue::Str(LoopStatus::from_bluez(&repeat).as_str().to_string())
            }
            LiveRead::Shuffle => {
                PropertyValue::Bool(shuffle_from_bluez(&self.player.shuffle().await?))
            }
            LiveRead::Metadata => {
                let track = self.player.track().await?;
                PropertyValue::Metadata(Metadata::from_track(track.as_ref(), &self.art_url))
            }
            LiveRead::Position => {
                PropertyValue::Int64(to_mpris_micros(self.player.position().await?))
            }
        };

        Ok(value)
    }

    async fn write(&self, key: PropertyKey, setter: Setter, value: PropertyValue) -> Result<()> {
        if !self.flag(PlayerProperty::CanControl).await? {
            debug!(?setter, "Write refused, player cannot be controlled");
            return Ok(());
        }

        match setter {
            Setter::LoopStatus => {
                let status: LoopStatus = expect::<String>(key, value)?.parse()?;
                self.player.set_repeat(status.to_bluez()).await
            }
            Setter::Shuffle => {
                let shuffle = expect::<bool>(key, value)?;
                self.player.set_shuffle(shuffle_to_bluez(shuffle)).await
            }
            Setter::Rate => {
                if expect::<f64>(key, value)? == 0.0 {
                    self.player.pause().await?;
                }
                Ok(())
            }
            Setter::Volume => expect::<f64>(key, value).map(drop),
        }
    }
}

/// Convert a written value, naming the property in the error.
fn expect<T>(key: PropertyKey, value: PropertyValue) -> Result<T>
where
    T: TryFrom<PropertyValue, Error = BridgeError>,
{
    T::try_from(value).map_err(|err| match err {
        BridgeError::InvalidValue { reason, .. } => BridgeError::invalid_value(key.name(), reason),
        other => other,
    })
}
