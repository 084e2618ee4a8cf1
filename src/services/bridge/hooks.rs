use std::io;

use async_trait::async_trait;
use thiserror::Error;

use crate::services::bluez::DeviceIdentity;

/// Failure of a collaborator side effect.
///
/// Never propagated past the reconciler; logged and dropped.
#[derive(Error, Debug)]
pub enum HookError {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// External command exited unsuccessfully
    #[error("command '{command}' failed: {reason}")]
    Command {
        /// Command line that was run
        command: String,
        /// Exit status or stderr
        reason: String,
    },

    /// External command produced output that is not the expected format
    #[error("cannot parse output of '{command}': {reason}")]
    Parse {
        /// Command line that was run
        command: String,
        /// Parser diagnostic
        reason: String,
    },
}

/// Side effects outside the bus that follow session lifecycle.
#[async_trait]
pub trait SessionHooks: Send + Sync {
    /// Called after a session came up.
    ///
    /// # Errors
    /// Returns error if the side effect fails
    async fn session_created(
        &self,
        exposed_name: &str,
        identity: &DeviceIdentity,
    ) -> Result<(), HookError>;

    /// Called after a session was torn down.
    ///
    /// # Errors
    /// Returns error if the side effect fails
    async fn session_destroyed(&self, exposed_name: &str) -> Result<(), HookError>;
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

#[async_trait]
impl SessionHooks for NoHooks {
    async fn session_created(&self, _: &str, _: &DeviceIdentity) -> Result<(), HookError> {
        Ok(())
    }

    async fn session_destroyed(&self, _: &str) -> Result<(), HookError> {
        Ok(())
    }
}
