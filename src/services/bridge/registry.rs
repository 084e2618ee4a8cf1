use std::collections::{BTreeMap, BTreeSet};

use crate::services::bluez::PlayerPath;

/// Live sessions keyed by backend player path.
///
/// Holds at most one session per path. Owned by the reconciler, which is
/// the only code that mutates it.
#[derive(Debug)]
pub struct SessionRegistry<S> {
    sessions: BTreeMap<PlayerPath, S>,
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SessionRegistry<S> {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Whether a session exists for `path`.
    pub fn contains(&self, path: &PlayerPath) -> bool {
        self.sessions.contains_key(path)
    }

    /// Session for `path`.
    pub fn get(&self, path: &PlayerPath) -> Option<&S> {
        self.sessions.get(path)
    }

    /// Paths with a live session, in order.
    pub fn identifiers(&self) -> impl Iterator<Item = &PlayerPath> {
        self.sessions.keys()
    }

    /// Register a session.
    ///
    /// # Errors
    /// Hands the session back if `path` already has one; the existing
    /// session is kept.
    pub fn insert(&mut self, path: PlayerPath, session: S) -> Result<(), S> {
        if self.sessions.contains_key(&path) {
            return Err(session);
        }
        self.sessions.insert(path, session);
        Ok(())
    }

    /// Unregister and return the session for `path`.
    pub fn remove(&mut self, path: &PlayerPath) -> Option<S> {
        self.sessions.remove(path)
    }

    /// Registered paths missing from `current`.
    pub fn stale(&self, current: &BTreeSet<PlayerPath>) -> Vec<PlayerPath> {
        self.sessions
            .keys()
            .filter(|path| !current.contains(*path))
            .cloned()
            .collect()
    }

    /// Paths of `current` without a session.
    pub fn missing(&self, current: &BTreeSet<PlayerPath>) -> Vec<PlayerPath> {
        current
            .iter()
            .filter(|path| !self.sessions.contains_key(*path))
            .cloned()
            .collect()
    }

    /// Remove every session.
    pub fn drain(&mut self) -> Vec<(PlayerPath, S)> {
        std::mem::take(&mut self.sessions).into_iter().collect()
    }
}
