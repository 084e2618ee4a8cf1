use async_trait::async_trait;
use zbus::Connection;

use super::{ManagedSession, SessionFactory};
use crate::{
    core::Result,
    services::{
        bluez::{DeviceIdentity, PlayerPath},
        mpris::{Session, SessionSettings},
    },
};

/// Creates MPRIS sessions for BlueZ players.
#[derive(Debug, Clone)]
pub struct BluezSessionFactory {
    system: Connection,
    settings: SessionSettings,
}

impl BluezSessionFactory {
    /// Factory reading backends from `system`.
    pub fn new(system: Connection, settings: SessionSettings) -> Self {
        Self { system, settings }
    }
}

#[async_trait]
impl SessionFactory for BluezSessionFactory {
    type Session = Session;

    async fn create(&self, path: &PlayerPath) -> Result<Session> {
        Session::create(&self.system, path, &self.settings).await
    }
}

#[async_trait]
impl ManagedSession for Session {
    fn exposed_name(&self) -> &str {
        Session::exposed_name(self)
    }

    fn identity(&self) -> &DeviceIdentity {
        Session::identity(self)
    }

    async fn destroy(self) {
        Session::destroy(self).await;
    }
}
