//! # Shopdesk Runtime
//!
//! Runtime implementation for the Shopdesk state core.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The single process-wide state container; all mutation goes through `send`
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Cancellation registry**: Tracks cancellable effects so stale requests can be aborted
//!
//! ## Example
//!
//! ```ignore
//! use shopdesk_runtime::Store;
//!
//! let store = Store::new(initial_state, reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use shopdesk_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Prometheus metrics for observability
pub mod metrics;

/// Runtime errors
pub mod error {
    use thiserror::Error;

    /// Why a store operation did not complete
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// `send` was called after shutdown began
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown gave up with this many effects still running
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching action arrived in time (`send_and_wait_for`, `EffectHandle::wait_with_timeout`)
        #[error("Timeout waiting for action")]
        Timeout,

        /// Every sender of the action broadcast is gone
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Store tuning
///
/// ```
/// use shopdesk_runtime::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Actions a slow observer may fall behind before it starts losing them
    pub broadcast_capacity: usize,
    /// Used by [`Store::shutdown_default`]
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity; zero is raised to one
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Set the timeout used by [`Store::shutdown_default`]
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 64,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Counts running effects and wakes waiters when the count drops to zero
#[derive(Clone)]
struct Tracker {
    running: Arc<AtomicUsize>,
    idle: Arc<watch::Sender<()>>,
}

impl Tracker {
    fn new() -> Self {
        Self {
            running: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(watch::channel(()).0),
        }
    }

    fn count(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    fn started(&self) {
        self.running.fetch_add(1, Ordering::SeqCst);
    }

    fn finished(&self) {
        if self.running.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.send_replace(());
        }
    }

    /// Resolve once nothing is running
    async fn wait_idle(&self) {
        let mut idle = self.idle.subscribe();
        while self.count() > 0 {
            if idle.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Marks one effect as finished in every tracker it was started in
///
/// Dropped on completion, panic and abort alike.
struct Running(Vec<Tracker>);

impl Running {
    fn start(trackers: Vec<Tracker>) -> Self {
        for tracker in &trackers {
            tracker.started();
        }
        Self(trackers)
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        for tracker in &self.0 {
            tracker.finished();
        }
    }
}

/// Completion handle for the effects of one [`Store::send`]
///
/// Effects started later by feedback actions have handles of their own and
/// are not awaited here.
///
/// ```ignore
/// let mut handle = store.send(CrudAction::list_all().into()).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    tracker: Tracker,
}

impl EffectHandle {
    /// Effects of this send still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.count()
    }

    /// Wait until every effect of this send has finished
    pub async fn wait(&mut self) {
        self.tracker.wait_idle().await;
    }

    /// [`wait`](Self::wait), bounded by `timeout`
    ///
    /// # Errors
    ///
    /// [`StoreError::Timeout`] if effects are still running after `timeout`.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Running cancellable tasks, keyed by effect id then by task key
type CancellationMap = HashMap<EffectId, HashMap<u64, tokio::task::AbortHandle>>;

/// Registry of abortable tasks spawned under [`Effect::Cancellable`]
#[derive(Clone, Default)]
struct CancellationRegistry {
    tasks: Arc<Mutex<CancellationMap>>,
    next_key: Arc<AtomicU64>,
}

impl CancellationRegistry {
    /// Spawn `fut` and register it under `id` if one is given
    ///
    /// The registry lock is held across spawn and insert, so the task's own
    /// cleanup can never run before its registration.
    fn spawn<F>(&self, id: Option<&EffectId>, fut: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let Some(id) = id else {
            tokio::spawn(fut);
            return;
        };

        let key = self.next_key.fetch_add(1, Ordering::Relaxed);
        let guard = RegistrationGuard {
            registry: self.clone(),
            id: id.clone(),
            key,
        };

        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            fut.await;
        });
        tasks
            .entry(id.clone())
            .or_default()
            .insert(key, handle.abort_handle());
    }

    /// Abort every task registered under `id`, returning how many were aborted
    fn cancel(&self, id: &EffectId) -> usize {
        let removed = {
            let mut tasks = self
                .tasks
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            tasks.remove(id)
        };

        let Some(handles) = removed else {
            return 0;
        };

        for handle in handles.values() {
            handle.abort();
        }
        handles.len()
    }

    /// Number of live cancellable tasks
    fn len(&self) -> usize {
        let tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        tasks.values().map(HashMap::len).sum()
    }

    fn remove(&self, id: &EffectId, key: u64) {
        let mut tasks = self
            .tasks
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(entries) = tasks.get_mut(id) {
            entries.remove(&key);
            if entries.is_empty() {
                tasks.remove(id);
            }
        }
    }
}

/// Removes a task's registry entry when the task finishes or is aborted
struct RegistrationGuard {
    registry: CancellationRegistry,
    id: EffectId,
    key: u64,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        self.registry.remove(&self.id, self.key);
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, CancellationRegistry, Duration, Effect, EffectHandle, EffectId, Ordering,
        Reducer, Running, RwLock, StoreConfig, StoreError, Tracker,
    };
    use crate::metrics::StoreMetrics;
    use shopdesk_core::SmallVec;
    use tokio::sync::broadcast;

    /// Owner of one application state
    ///
    /// All mutation goes through [`send`](Self::send): the reducer runs under
    /// the write lock, so actions apply one at a time in arrival order, and
    /// the effects it returns run as tokio tasks whose resulting actions are
    /// sent back in. Clones share state, reducer, environment and effects.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
        running: Tracker,
        cancellations: CancellationRegistry,
        /// Every action processed by the reducer, in processing order.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Store with [`StoreConfig::default()`]
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Store with explicit tuning
        #[must_use]
        pub fn with_config(initial_state: S, reducer: R, environment: E, config: StoreConfig) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
                running: Tracker::new(),
                cancellations: CancellationRegistry::default(),
                action_broadcast,
            }
        }

        /// The injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// Effects running across the whole store
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.running.count()
        }

        /// Number of running effects that can still be cancelled
        #[must_use]
        pub fn cancellable_effects(&self) -> usize {
            self.cancellations.len()
        }

        /// [`shutdown`](Self::shutdown) with the configured default timeout
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.default_shutdown_timeout).await
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// Effects already running still settle: the actions they feed back
        /// are reduced and broadcast, so no request is left half-applied in
        /// state. Effects those actions return are not started.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownTimeout`] with the number of effects still
        /// running when `timeout` elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.shutdown.store(true, Ordering::Release);
            tracing::info!(pending_effects = self.running.count(), "Shutting down store");
            metrics::counter!("store.shutdown.initiated").increment(1);

            if tokio::time::timeout(timeout, self.running.wait_idle()).await.is_ok() {
                tracing::info!("Store drained");
                return Ok(());
            }

            let pending = self.running.count();
            tracing::error!(pending_effects = pending, "Shutdown timed out");
            metrics::counter!("store.shutdown.timeout").increment(1);
            Err(StoreError::ShutdownTimeout(pending))
        }

        /// Apply `action` and start its effects
        ///
        /// The action is broadcast to observers after the reducer ran and
        /// before any of its effects start. Returns once the effects are
        /// spawned; the handle waits for them.
        ///
        /// # Errors
        ///
        /// [`StoreError::ShutdownInProgress`] once shutdown has begun.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let effects = self.apply(action).await;

            let tracker = Tracker::new();
            for effect in effects {
                self.execute_effect(effect, &tracker, None);
            }

            Ok(EffectHandle { tracker })
        }

        /// Reduce `action` and broadcast it, returning the effects unexecuted
        async fn apply(&self, action: A) -> SmallVec<[Effect<A>; 4]> {
            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self
                    .reducer
                    .reduce(&mut *state, action.clone(), &self.environment);
                StoreMetrics::record_action(start.elapsed(), effects.len());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            // No receivers is fine
            let _ = self.action_broadcast.send(action);
            effects
        }

        /// Send an action and wait for a matching result action
        ///
        /// Subscribes to the action broadcast before sending, so a fast
        /// completion cannot be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to every action processed by this store
        ///
        /// Actions arrive after the reducer has applied them, in processing order.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.customers.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Spawn `fut`, counted by `tracker` and the store, abortable under `cancel_id`
        fn spawn_tracked<F>(&self, tracker: &Tracker, cancel_id: Option<&EffectId>, fut: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            let running = Running::start(vec![tracker.clone(), self.running.clone()]);
            self.cancellations.spawn(cancel_id, async move {
                let _running = running;
                fut.await;
            });
        }

        /// Apply an action produced by an effect
        ///
        /// Unlike [`send`](Self::send) this is never refused: once shutdown
        /// has begun the action is still reduced, only its effects are dropped.
        async fn feed_back(&self, action: A) {
            let effects = self.apply(action).await;

            if self.shutdown.load(Ordering::Acquire) {
                let dropped = effects.iter().filter(|e| !e.is_none()).count();
                if dropped > 0 {
                    tracing::debug!(dropped, "Skipped effects of a feedback action during shutdown");
                }
                return;
            }

            let tracker = Tracker::new();
            for effect in effects {
                self.execute_effect(effect, &tracker, None);
            }
        }

        /// Run one effect description
        ///
        /// A future inside a `Cancellable` is registered under its id; an
        /// aborted task never delivers its action.
        fn execute_effect(&self, effect: Effect<A>, tracker: &Tracker, cancel_id: Option<&EffectId>) {
            match effect {
                Effect::None => StoreMetrics::record_effect("none"),
                Effect::Future(fut) => {
                    StoreMetrics::record_effect("future");
                    let store = self.clone();
                    self.spawn_tracked(tracker, cancel_id, async move {
                        if let Some(action) = fut.await {
                            store.feed_back(action).await;
                        }
                    });
                },
                Effect::Cancellable { id, effect } => {
                    StoreMetrics::record_effect("cancellable");
                    self.execute_effect(*effect, tracker, Some(&id));
                },
                Effect::Cancel(id) => {
                    let aborted = self.cancellations.cancel(&id);
                    StoreMetrics::record_cancel(aborted);
                    tracing::debug!(effect_id = %id, aborted, "Cancelled effects");
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
                running: self.running.clone(),
                cancellations: self.cancellations.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use shopdesk_core::{SmallVec, smallvec};

    #[derive(Debug, Clone, Default)]
    struct TestState {
        value: i32,
        loaded: Vec<i32>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Add(i32),
        Load { id: &'static str, value: i32, delay_ms: u64 },
        Loaded(i32),
        Cancel(&'static str),
    }

    #[derive(Clone)]
    struct TestReducer;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Add(n) => {
                    state.value += n;
                    SmallVec::new()
                },
                TestAction::Load { id, value, delay_ms } => smallvec![
                    Effect::future(async move {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        Some(TestAction::Loaded(value))
                    })
                    .cancellable(id)
                ],
                TestAction::Loaded(value) => {
                    state.loaded.push(value);
                    SmallVec::new()
                },
                TestAction::Cancel(id) => smallvec![Effect::Cancel(EffectId::new(id))],
            }
        }
    }

    #[tokio::test]
    async fn test_send_applies_reducer() {
        let store = Store::new(TestState::default(), TestReducer, ());
        store.send(TestAction::Add(2)).await.unwrap();
        store.send(TestAction::Add(3)).await.unwrap();
        assert_eq!(store.state(|s| s.value).await, 5);
    }

    #[tokio::test]
    async fn test_effect_feedback_is_delivered() {
        let store = Store::new(TestState::default(), TestReducer, ());
        let result = store
            .send_and_wait_for(
                TestAction::Load { id: "a", value: 7, delay_ms: 1 },
                |a| matches!(a, TestAction::Loaded(_)),
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        assert_eq!(result, TestAction::Loaded(7));
        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![7]);
    }

    #[tokio::test]
    async fn test_cancel_discards_completion() {
        let store = Store::new(TestState::default(), TestReducer, ());
        let mut handle = store
            .send(TestAction::Load { id: "slow", value: 1, delay_ms: 200 })
            .await
            .unwrap();
        assert_eq!(store.cancellable_effects(), 1);

        store.send(TestAction::Cancel("slow")).await.unwrap();
        handle.wait_with_timeout(Duration::from_secs(1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(store.state(|s| s.loaded.is_empty()).await);
        assert_eq!(store.cancellable_effects(), 0);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn test_cancel_leaves_other_ids_running() {
        let store = Store::new(TestState::default(), TestReducer, ());
        store
            .send(TestAction::Load { id: "keep", value: 1, delay_ms: 20 })
            .await
            .unwrap();
        store
            .send(TestAction::Load { id: "drop", value: 2, delay_ms: 20 })
            .await
            .unwrap();
        store.send(TestAction::Cancel("drop")).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![1]);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_actions() {
        let store = Store::new(TestState::default(), TestReducer, ());
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        assert!(matches!(
            store.send(TestAction::Add(1)).await,
            Err(StoreError::ShutdownInProgress)
        ));
    }

    #[tokio::test]
    async fn test_shutdown_times_out_with_running_effects() {
        let store = Store::new(TestState::default(), TestReducer, ());
        store
            .send(TestAction::Load { id: "slow", value: 1, delay_ms: 500 })
            .await
            .unwrap();
        let result = store.shutdown(Duration::from_millis(30)).await;
        assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
    }

    #[tokio::test]
    async fn test_shutdown_applies_settlements_of_running_effects() {
        let store = Store::new(TestState::default(), TestReducer, ());
        let mut rx = store.subscribe_actions();
        store
            .send(TestAction::Load { id: "late", value: 9, delay_ms: 30 })
            .await
            .unwrap();

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.state(|s| s.loaded.clone()).await, vec![9]);
        assert!(matches!(rx.recv().await.unwrap(), TestAction::Load { .. }));
        assert_eq!(rx.recv().await.unwrap(), TestAction::Loaded(9));
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_every_processed_action() {
        let store = Store::new(TestState::default(), TestReducer, ());
        let mut rx = store.subscribe_actions();
        store.send(TestAction::Add(1)).await.unwrap();
        store
            .send(TestAction::Load { id: "a", value: 4, delay_ms: 1 })
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), TestAction::Add(1));
        assert!(matches!(rx.recv().await.unwrap(), TestAction::Load { .. }));
        assert_eq!(rx.recv().await.unwrap(), TestAction::Loaded(4));
    }
}
