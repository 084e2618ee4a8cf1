use std::{collections::BTreeSet, future::Future, time::Duration};

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use super::{SessionHooks, SessionRegistry};
use crate::{
    core::Result,
    services::bluez::{DeviceIdentity, PlayerEnumerator, PlayerPath},
};

/// A live session as seen by the reconciler.
#[async_trait]
pub trait ManagedSession: Send {
    /// Exposed name suffix, passed to the hooks.
    fn exposed_name(&self) -> &str;

    /// Device identity read when the session came up.
    fn identity(&self) -> &DeviceIdentity;

    /// Tear the session down. Must not fail.
    async fn destroy(self);
}

/// Builds sessions for newly enumerated players.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Session type produced.
    type Session: ManagedSession;

    /// Bring up a session for `path`.
    ///
    /// # Errors
    /// Returns error if the session cannot be created; the reconciler
    /// retries on a later tick
    async fn create(&self, path: &PlayerPath) -> Result<Self::Session>;
}

/// What a single reconciliation tick changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Players that gained a session
    pub created: Vec<PlayerPath>,
    /// Players whose session was torn down
    pub destroyed: Vec<PlayerPath>,
    /// Players whose session could not be created
    pub failed: Vec<PlayerPath>,
}

impl TickReport {
    /// Whether the tick changed nothing and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.destroyed.is_empty() && self.failed.is_empty()
    }
}

/// Keeps the session registry converged with the enumerated player set.
///
/// Sole owner of the registry. Every tick destroys sessions whose player
/// disappeared, then creates sessions for players that appeared.
pub struct Reconciler<E, F: SessionFactory, H> {
    enumerator: E,
    factory: F,
    hooks: H,
    registry: SessionRegistry<F::Session>,
    // Players whose last creation attempt failed; repeats log at debug.
    failing: BTreeSet<PlayerPath>,
}

impl<E, F, H> Reconciler<E, F, H>
where
    E: PlayerEnumerator,
    F: SessionFactory,
    H: SessionHooks,
{
    /// Create a reconciler over an existing registry.
    pub fn new(enumerator: E, factory: F, hooks: H, registry: SessionRegistry<F::Session>) -> Self {
        Self {
            enumerator,
            factory,
            hooks,
            registry,
            failing: BTreeSet::new(),
        }
    }

    /// Live sessions.
    pub fn registry(&self) -> &SessionRegistry<F::Session> {
        &self.registry
    }

    /// Whether the last attempt to create a session for `path` failed.
    pub fn is_failing(&self, path: &PlayerPath) -> bool {
        self.failing.contains(path)
    }

    /// Run one reconciliation pass.
    ///
    /// A session that fails to come up is left for the next tick; the
    /// remaining players are still processed. Only the first failure of a
    /// player is logged as a warning until it succeeds or disappears.
    ///
    /// # Errors
    /// Returns error if enumeration fails, in which case the registry is
    /// left untouched
    #[instrument(skip(self), fields(live = self.registry.len()))]
    pub async fn tick(&mut self) -> Result<TickReport> {
        let current = self.enumerator.enumerate().await?;
        let mut report = TickReport::default();
        self.failing.retain(|path| current.contains(path));

        for path in self.registry.stale(&current) {
            if let Some(session) = self.registry.remove(&path) {
                self.teardown(session).await;
                info!(%path, "Player disappeared");
                report.destroyed.push(path);
            }
        }

        for path in self.registry.missing(&current) {
            match self.factory.create(&path).await {
                Ok(session) => {
                    self.failing.remove(&path);
                    if let Err(duplicate) = self.registry.insert(path.clone(), session) {
                        duplicate.destroy().await;
                        continue;
                    }
                    if let Some(session) = self.registry.get(&path) {
                        self.announce(session).await;
                    }
                    info!(%path, "Player appeared");
                    report.created.push(path);
                }
                Err(e) => {
                    if self.failing.insert(path.clone()) {
                        warn!(%path, "Failed to create session: {e}");
                    } else {
                        debug!(%path, "Session creation still failing: {e}");
                    }
                    report.failed.push(path);
                }
            }
        }

        Ok(report)
    }

    /// Tick every `period` until `shutdown` resolves, then tear every
    /// session down.
    ///
    /// Ticks are strictly serialized; a tick that overruns delays the next
    /// one instead of bunching up.
    pub async fn run<S>(mut self, period: Duration, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = interval.tick() => match self.tick().await {
                    Ok(report) if !report.is_empty() => debug!(?report, "Sessions reconciled"),
                    Ok(_) => {}
                    Err(e) => warn!("Player enumeration failed: {e}"),
                },
            }
        }

        self.shutdown().await;
    }

    /// Tear down every live session.
    #[instrument(skip(self), fields(live = self.registry.len()))]
    pub async fn shutdown(&mut self) {
        for (_, session) in self.registry.drain() {
            self.teardown(session).await;
        }
    }

    async fn announce(&self, session: &F::Session) {
        if let Err(e) = self
            .hooks
            .session_created(session.exposed_name(), session.identity())
            .await
        {
            warn!(name = session.exposed_name(), "Session created hook failed: {e}");
        }
    }

    async fn teardown(&self, session: F::Session) {
        let name = session.exposed_name().to_string();
        session.destroy().await;

        if let Err(e) = self.hooks.session_destroyed(&name).await {
            warn!(%name, "Session destroyed hook failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{BTreeSet, HashSet},
        sync::{Arc, Mutex},
    };

    use zbus::fdo;

    use super::*;
    use crate::{
        core::BridgeError,
        services::bridge::{HookError, NoHooks},
    };

    type Log = Arc<Mutex<Vec<String>>>;

    fn path(raw: &str) -> PlayerPath {
        PlayerPath::parse(raw).unwrap()
    }

    fn phone() -> PlayerPath {
        path("/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF/player0")
    }

    fn speaker() -> PlayerPath {
        path("/org/bluez/hci0/dev_11_22_33_44_55_66/player0")
    }

    #[derive(Clone, Default)]
    struct FakeEnumerator {
        players: Arc<Mutex<BTreeSet<PlayerPath>>>,
        broken: Arc<Mutex<bool>>,
    }

    impl FakeEnumerator {
        fn set(&self, players: &[PlayerPath]) {
            *self.players.lock().unwrap() = players.iter().cloned().collect();
        }

        fn break_registry(&self, broken: bool) {
            *self.broken.lock().unwrap() = broken;
        }
    }

    #[async_trait]
    impl PlayerEnumerator for FakeEnumerator {
        async fn enumerate(&self) -> Result<BTreeSet<PlayerPath>> {
            if *self.broken.lock().unwrap() {
                return Err(BridgeError::Fdo(fdo::Error::ServiceUnknown(
                    "org.bluez".to_string(),
                )));
            }
            Ok(self.players.lock().unwrap().clone())
        }
    }

    struct FakeSession {
        name: String,
        identity: DeviceIdentity,
        log: Log,
    }

    #[async_trait]
    impl ManagedSession for FakeSession {
        fn exposed_name(&self) -> &str {
            &self.name
        }

        fn identity(&self) -> &DeviceIdentity {
            &self.identity
        }

        async fn destroy(self) {
            self.log.lock().unwrap().push(format!("destroy {}", self.name));
        }
    }

    #[derive(Clone, Default)]
    struct FakeFactory {
        log: Log,
        failing: Arc<Mutex<HashSet<PlayerPath>>>,
    }

    impl FakeFactory {
        fn fail_for(&self, path: &PlayerPath, failing: bool) {
            let mut set = self.failing.lock().unwrap();
            if failing {
                set.insert(path.clone());
            } else {
                set.remove(path);
            }
        }
    }

    #[async_trait]
    impl SessionFactory for FakeFactory {
        type Session = FakeSession;

        async fn create(&self, path: &PlayerPath) -> Result<FakeSession> {
            if self.failing.lock().unwrap().contains(path) {
                return Err(BridgeError::SessionCreationFailed {
                    path: path.to_string(),
                    reason: "name already taken".to_string(),
                });
            }

            let name = path.exposed_name();
            self.log.lock().unwrap().push(format!("create {name}"));
            Ok(FakeSession {
                name,
                identity: DeviceIdentity {
                    name: "Phone".to_string(),
                    icon: None,
                },
                log: Arc::clone(&self.log),
            })
        }
    }

    #[derive(Clone, Default)]
    struct RecordingHooks {
        log: Log,
    }

    #[async_trait]
    impl SessionHooks for RecordingHooks {
        async fn session_created(
            &self,
            exposed_name: &str,
            identity: &DeviceIdentity,
        ) -> std::result::Result<(), HookError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("created {exposed_name} {}", identity.name));
            Ok(())
        }

        async fn session_destroyed(&self, exposed_name: &str) -> std::result::Result<(), HookError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("destroyed {exposed_name}"));
            Err(HookError::Command {
                command: "gsettings".to_string(),
                reason: "not installed".to_string(),
            })
        }
    }

    fn live(reconciler: &Reconciler<FakeEnumerator, FakeFactory, impl SessionHooks>) -> Vec<PlayerPath> {
        reconciler.registry().identifiers().cloned().collect()
    }

    #[tokio::test]
    async fn registry_tracks_enumerated_players() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let mut reconciler =
            Reconciler::new(enumerator.clone(), factory.clone(), NoHooks, SessionRegistry::new());

        enumerator.set(&[phone(), speaker()]);
        let report = reconciler.tick().await.unwrap();
        assert_eq!(report.created.len(), 2);

        let expected: Vec<PlayerPath> = BTreeSet::from([phone(), speaker()]).into_iter().collect();
        assert_eq!(live(&reconciler), expected);
    }

    #[tokio::test]
    async fn unchanged_registry_is_idempotent() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let mut reconciler =
            Reconciler::new(enumerator.clone(), factory.clone(), NoHooks, SessionRegistry::new());

        enumerator.set(&[phone()]);
        reconciler.tick().await.unwrap();
        let second = reconciler.tick().await.unwrap();

        assert!(second.is_empty());
        assert_eq!(factory.log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn appearance_then_disappearance_calls_hooks() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let hooks = RecordingHooks::default();
        let mut reconciler = Reconciler::new(
            enumerator.clone(),
            factory.clone(),
            hooks.clone(),
            SessionRegistry::new(),
        );

        enumerator.set(&[phone()]);
        reconciler.tick().await.unwrap();
        assert_eq!(
            *hooks.log.lock().unwrap(),
            vec!["created btdevAABBCCDDEEFFplayer0 Phone"]
        );

        enumerator.set(&[]);
        let report = reconciler.tick().await.unwrap();

        assert_eq!(report.destroyed, vec![phone()]);
        assert!(reconciler.registry().is_empty());
        assert_eq!(
            factory.log.lock().unwrap().last().map(String::as_str),
            Some("destroy btdevAABBCCDDEEFFplayer0")
        );
        assert_eq!(
            hooks.log.lock().unwrap().last().map(String::as_str),
            Some("destroyed btdevAABBCCDDEEFFplayer0")
        );
    }

    #[tokio::test]
    async fn failed_creation_is_retried_next_tick() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let mut reconciler =
            Reconciler::new(enumerator.clone(), factory.clone(), NoHooks, SessionRegistry::new());

        enumerator.set(&[phone(), speaker()]);
        factory.fail_for(&speaker(), true);

        let report = reconciler.tick().await.unwrap();
        assert_eq!(report.created, vec![phone()]);
        assert_eq!(report.failed, vec![speaker()]);
        assert_eq!(live(&reconciler), vec![phone()]);

        factory.fail_for(&speaker(), false);
        let report = reconciler.tick().await.unwrap();
        assert_eq!(report.created, vec![speaker()]);
        assert_eq!(reconciler.registry().len(), 2);
    }

    #[tokio::test]
    async fn persistent_failure_is_tracked_until_player_leaves() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let mut reconciler =
            Reconciler::new(enumerator.clone(), factory.clone(), NoHooks, SessionRegistry::new());

        // Same device on a second adapter maps to an exposed name already held.
        let twin = path("/org/bluez/hci1/dev_AA_BB_CC_DD_EE_FF/player0");
        assert_eq!(twin.exposed_name(), phone().exposed_name());
        enumerator.set(&[phone(), twin.clone()]);
        factory.fail_for(&twin, true);

        for _ in 0..3 {
            let report = reconciler.tick().await.unwrap();
            assert_eq!(report.failed, vec![twin.clone()]);
            assert!(reconciler.is_failing(&twin));
        }
        assert!(!reconciler.is_failing(&phone()));

        enumerator.set(&[phone()]);
        reconciler.tick().await.unwrap();
        assert!(!reconciler.is_failing(&twin));

        enumerator.set(&[phone(), twin.clone()]);
        factory.fail_for(&twin, false);
        let report = reconciler.tick().await.unwrap();
        assert_eq!(report.created, vec![twin.clone()]);
        assert!(!reconciler.is_failing(&twin));
    }

    #[tokio::test]
    async fn enumeration_failure_leaves_registry_untouched() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let mut reconciler =
            Reconciler::new(enumerator.clone(), factory.clone(), NoHooks, SessionRegistry::new());

        enumerator.set(&[phone()]);
        reconciler.tick().await.unwrap();

        enumerator.break_registry(true);
        assert!(reconciler.tick().await.is_err());
        assert_eq!(live(&reconciler), vec![phone()]);
    }

    #[tokio::test]
    async fn destruction_precedes_creation_within_a_tick() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let mut reconciler =
            Reconciler::new(enumerator.clone(), factory.clone(), NoHooks, SessionRegistry::new());

        enumerator.set(&[phone()]);
        reconciler.tick().await.unwrap();

        enumerator.set(&[speaker()]);
        reconciler.tick().await.unwrap();

        let log = factory.log.lock().unwrap().clone();
        assert_eq!(
            log[1..],
            [
                "destroy btdevAABBCCDDEEFFplayer0".to_string(),
                "create btdev112233445566player0".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn run_tears_down_sessions_on_shutdown() {
        let enumerator = FakeEnumerator::default();
        let factory = FakeFactory::default();
        let reconciler =
            Reconciler::new(enumerator.clone(), factory.clone(), NoHooks, SessionRegistry::new());
        enumerator.set(&[phone()]);

        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(reconciler.run(Duration::from_millis(10), async move {
            let _ = stopped.await;
        }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.send(()).unwrap();
        handle.await.unwrap();

        let log = factory.log.lock().unwrap().clone();
        assert_eq!(log.first().map(String::as_str), Some("create btdevAABBCCDDEEFFplayer0"));
        assert_eq!(log.last().map(String::as_str), Some("destroy btdevAABBCCDDEEFFplayer0"));
    }
}
