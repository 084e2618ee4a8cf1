use thiserror::Error;
use zbus::fdo;

/// Error types for the Bluetooth to MPRIS bridge.
///
/// Covers backend D-Bus failures, malformed backend object paths and
/// exposed-protocol contract violations (unknown interface or property,
/// values of the wrong shape).
#[derive(Error, Debug)]
pub enum BridgeError {
    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    Dbus(#[from] zbus::Error),

    /// D-Bus standard interface error
    #[error("D-Bus call failed: {0}")]
    Fdo(#[from] fdo::Error),

    /// Backend object path does not name a device player
    #[error("invalid player path '{0}'")]
    InvalidPlayerPath(String),

    /// Exposed interface name not served by a session
    #[error("unknown interface '{0}'")]
    UnknownInterface(String),

    /// Property name absent from the interface's property table
    #[error("unknown property '{property}' on interface '{interface}'")]
    UnknownProperty {
        /// Interface the lookup was made against
        interface: String,
        /// Property that was not found
        property: String,
    },

    /// Value passed to a property setter has the wrong type or vocabulary
    #[error("invalid value for '{property}': {reason}")]
    InvalidValue {
        /// Property being written
        property: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Session could not be brought up for a backend player
    #[error("failed to create session for {path}: {reason}")]
    SessionCreationFailed {
        /// Backend player object path
        path: String,
        /// Reason for the failure
        reason: String,
    },
}

/// A specialized `Result` type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Creates an invalid-value error for a property setter.
    pub fn invalid_value(property: &'static str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidValue {
            property,
            reason: reason.into(),
        }
    }

    /// Whether the error means the backend object no longer exists.
    ///
    /// The relay stops on such errors instead of logging them.
    pub fn is_object_gone(&self) -> bool {
        match self {
            BridgeError::Fdo(err) => is_gone_fdo(err),
            BridgeError::Dbus(zbus::Error::FDO(err)) => is_gone_fdo(err),
            BridgeError::Dbus(zbus::Error::MethodError(name, _, _)) => {
                matches!(
                    name.as_str(),
                    "org.freedesktop.DBus.Error.UnknownObject"
                        | "org.freedesktop.DBus.Error.UnknownMethod"
                        | "org.freedesktop.DBus.Error.ServiceUnknown"
                )
            }
            _ => false,
        }
    }
}

fn is_gone_fdo(err: &fdo::Error) -> bool {
    matches!(
        err,
        fdo::Error::UnknownObject(_)
            | fdo::Error::UnknownMethod(_)
            | fdo::Error::ServiceUnknown(_)
            | fdo::Error::NameHasNoOwner(_)
    )
}

impl From<BridgeError> for fdo::Error {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Fdo(err) => err,
            BridgeError::UnknownInterface(_) => fdo::Error::UnknownInterface(err.to_string()),
            BridgeError::UnknownProperty { .. } => fdo::Error::UnknownProperty(err.to_string()),
            BridgeError::InvalidValue { .. } => fdo::Error::InvalidArgs(err.to_string()),
            other => fdo::Error::Failed(other.to_string()),
        }
    }
}
