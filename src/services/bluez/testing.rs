//! In-memory backends for unit tests.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use zbus::fdo;

use super::{DeviceBackend, PlayerBackend, TrackRecord};
use crate::core::{BridgeError, Result};

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub status: String,
    pub repeat: String,
    pub shuffle: String,
    pub position: u32,
    pub track: Option<TrackRecord>,
    pub gone: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            status: "stopped".to_string(),
            repeat: "off".to_string(),
            shuffle: "off".to_string(),
            position: 0,
            track: None,
            gone: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FakePlayer {
    state: Mutex<PlayerState>,
    calls: Mutex<Vec<&'static str>>,
    reads: AtomicUsize,
}

impl FakePlayer {
    pub fn state(&self) -> PlayerState {
        self.state.lock().unwrap().clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut PlayerState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Property getters served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn get<T>(&self, f: impl FnOnce(&PlayerState) -> T) -> Result<T> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.read(f)
    }

    fn read<T>(&self, f: impl FnOnce(&PlayerState) -> T) -> Result<T> {
        let state = self.state.lock().unwrap();
        if state.gone {
            return Err(BridgeError::Fdo(fdo::Error::UnknownObject(
                "player removed".to_string(),
            )));
        }
        Ok(f(&state))
    }

    fn call(&self, name: &'static str) -> Result<()> {
        self.read(|_| ())?;
        self.calls.lock().unwrap().push(name);
        Ok(())
    }
}

#[async_trait]
impl PlayerBackend for FakePlayer {
    async fn status(&self) -> Result<String> {
        self.get(|state| state.status.clone())
    }

    async fn repeat(&self) -> Result<String> {
        self.get(|state| state.repeat.clone())
    }

    async fn set_repeat(&self, value: &str) -> Result<()> {
        self.read(|_| ())?;
        self.update(|state| state.repeat = value.to_string());
        Ok(())
    }

    async fn shuffle(&self) -> Result<String> {
        self.get(|state| state.shuffle.clone())
    }

    async fn set_shuffle(&self, value: &str) -> Result<()> {
        self.read(|_| ())?;
        self.update(|state| state.shuffle = value.to_string());
        Ok(())
    }

    async fn position(&self) -> Result<u32> {
        self.get(|state| state.position)
    }

    async fn track(&self) -> Result<Option<TrackRecord>> {
        self.get(|state| state.track.clone())
    }

    async fn play(&self) -> Result<()> {
        self.call("play")
    }

    async fn pause(&self) -> Result<()> {
        self.call("pause")
    }

    async fn stop(&self) -> Result<()> {
        self.call("stop")
    }

    async fn next(&self) -> Result<()> {
        self.call("next")
    }

    async fn previous(&self) -> Result<()> {
        self.call("previous")
    }
}

#[derive(Debug)]
pub struct FakeDevice {
    name: String,
}

impl FakeDevice {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl DeviceBackend for FakeDevice {
    async fn name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    async fn icon(&self) -> Result<Option<String>> {
        Ok(Some("audio-headphones".to_string()))
    }
}
