//! # Coordinator: the public facade.
//!
//! Owns the pieces (cache, bus, scheduler, dispatcher) and exposes the
//! host-facing API: run/shutdown lifecycle, cache reads, per-category
//! change listeners, action dispatch, and out-of-cycle refresh.
//!
//! ```text
//!    host ── dispatch(action) ──► ActionDispatcher ──► Fetcher
//!    host ── read(category) ────► StateCache
//!    host ── subscribe(cat, f) ─► StateCache listeners
//!    host ── run().await ───────► Scheduler loop + subscriber fan-out
//!    host ── shutdown() ────────► CancellationToken
//! ```
//!
//! ## Rules
//! - `run()` may be awaited once; a second call returns `AlreadyRunning`.
//! - `shutdown()` is idempotent and callable from any task; `run()` returns
//!   after the loop drains and `Stopped` is published.
//! - Reads and dispatch work from any task at any time; before `run()` the
//!   cache simply serves never-polled sentinels.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::actions::Action;
use crate::cache::{CategoryState, StateCache, SubscriptionId, ValueListener};
use crate::categories::{CategoryId, CategoryRegistry};
use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, FetchError};
use crate::events::{Bus, Event, EventKind};
use crate::fetcher::Fetcher;
use crate::subscribers::{Subscribe, SubscriberSet};

use super::dispatch::ActionDispatcher;
use super::scheduler::{Command, Scheduler};

/// Capacity of the dispatcher/force-refresh command channel.
const COMMAND_CAPACITY: usize = 64;

/// Pieces consumed exactly once by [`Coordinator::run`].
struct Runnable {
    scheduler: Scheduler,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

/// The polling coordinator.
///
/// Construct with [`Coordinator::new`], await [`run`](Self::run) in a task,
/// interact through the remaining methods from anywhere.
pub struct Coordinator {
    config: CoordinatorConfig,
    cache: Arc<StateCache>,
    bus: Bus,
    dispatcher: ActionDispatcher,
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
    runnable: Mutex<Option<Runnable>>,
}

impl Coordinator {
    /// Builds a coordinator over the given fetcher and category set.
    ///
    /// Fails fast on out-of-range configuration; nothing is clamped.
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        config: CoordinatorConfig,
        registry: CategoryRegistry,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, CoordinatorError> {
        config.validate()?;

        let bus = Bus::new(config.bus_capacity_clamped());
        let cache = Arc::new(StateCache::new(config.failure_threshold));
        let cancel = CancellationToken::new();
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);

        let scheduler = Scheduler::new(
            config.clone(),
            &registry,
            Arc::clone(&fetcher),
            Arc::clone(&cache),
            bus.clone(),
            commands_rx,
            cancel.clone(),
        );
        let dispatcher = ActionDispatcher::new(fetcher, bus.clone(), commands_tx.clone());

        Ok(Self {
            config,
            cache,
            bus,
            dispatcher,
            commands: commands_tx,
            cancel,
            runnable: Mutex::new(Some(Runnable {
                scheduler,
                subscribers,
            })),
        })
    }

    /// Runs the polling loop until [`shutdown`](Self::shutdown).
    ///
    /// Consumes the internal scheduler; a second call returns
    /// [`CoordinatorError::AlreadyRunning`]. Subscriber workers are spawned
    /// here and drained before this returns.
    pub async fn run(&self) -> Result<(), CoordinatorError> {
        let Runnable {
            scheduler,
            subscribers,
        } = self
            .runnable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(CoordinatorError::AlreadyRunning)?;

        // Attach the fan-out before the first tick so startup events are
        // not missed.
        let set = SubscriberSet::new(subscribers, self.bus.clone());
        let mut events = self.bus.subscribe();
        let forward_cancel = CancellationToken::new();
        let forward_guard = forward_cancel.clone();
        let forwarder = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = forward_guard.cancelled() => break,
                    received = events.recv() => match received {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            // Deliver anything published before cancellation won the race
            // (the final Stopped event in particular).
            while let Ok(ev) = events.try_recv() {
                set.emit(&ev);
            }
            set.shutdown().await;
        });

        scheduler.run().await;

        forward_cancel.cancel();
        let _ = forwarder.await;
        Ok(())
    }

    /// Requests shutdown. Idempotent; safe from any task.
    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.cancel.cancel();
    }

    /// Returns the current snapshot for one category.
    ///
    /// Never polled yet (or before `run()`) yields the never-polled
    /// sentinel, not an error.
    #[must_use]
    pub fn read(&self, category: CategoryId) -> CategoryState {
        self.cache.read(category)
    }

    /// Returns snapshots for every category that has been polled.
    #[must_use]
    pub fn read_all(&self) -> Vec<CategoryState> {
        self.cache.read_all()
    }

    /// Registers a listener called with the new snapshot whenever the
    /// category's value or availability changes.
    pub fn subscribe(&self, category: CategoryId, listener: ValueListener) -> SubscriptionId {
        self.cache.subscribe(category, listener)
    }

    /// Removes a change listener. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.cache.unsubscribe(id)
    }

    /// Returns a receiver observing coordinator events from this point on.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Executes one control action against the BMC.
    ///
    /// Success opens the burst window and forces the affected burst-eligible
    /// categories due. Failure returns the fetcher's error verbatim; the
    /// action is never retried and the schedule is untouched.
    pub async fn dispatch(&self, action: Action) -> Result<(), FetchError> {
        self.dispatcher.dispatch(action).await
    }

    /// Forces categories due out of cycle, whatever their cadence class.
    ///
    /// Intended for hosts that changed slow-moving state themselves (or know
    /// it changed) and want the static cadence bypassed once.
    pub async fn force_refresh(&self, categories: &[CategoryId]) {
        let _ = self
            .commands
            .send(Command::ForceRefresh {
                categories: categories.to_vec(),
            })
            .await;
    }

    /// The validated configuration this coordinator runs with.
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::time::Instant;

    use crate::cache::UnavailableReason;
    use crate::categories::{
        CadenceClass, Category, FanMode, ManagerInfo, Payload, PostCode, PowerReading, PowerState,
        ThermalReport,
    };
    use crate::categories::Health;

    use super::*;

    type FetchFn = Box<dyn Fn(CategoryId) -> Result<Payload, FetchError> + Send + Sync>;
    type CommandFn = Box<dyn Fn(&Action) -> Result<(), FetchError> + Send + Sync>;

    struct MockFetcher {
        calls: StdMutex<Vec<(CategoryId, Instant)>>,
        commands: StdMutex<Vec<&'static str>>,
        fetch_delay: Duration,
        fetch_fn: FetchFn,
        command_fn: CommandFn,
    }

    impl MockFetcher {
        fn ok() -> Self {
            Self::with_fetch(Box::new(|category| Ok(sample_payload(category))))
        }

        fn with_fetch(fetch_fn: FetchFn) -> Self {
            Self {
                calls: StdMutex::new(Vec::new()),
                commands: StdMutex::new(Vec::new()),
                fetch_delay: Duration::ZERO,
                fetch_fn,
                command_fn: Box::new(|_| Ok(())),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.fetch_delay = delay;
            self
        }

        fn with_command(mut self, command_fn: CommandFn) -> Self {
            self.command_fn = command_fn;
            self
        }

        fn launches(&self, category: CategoryId) -> Vec<Instant> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| *c == category)
                .map(|(_, t)| *t)
                .collect()
        }

        fn launch_count(&self, category: CategoryId) -> usize {
            self.launches(category).len()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, category: CategoryId) -> Result<Payload, FetchError> {
            self.calls.lock().unwrap().push((category, Instant::now()));
            if !self.fetch_delay.is_zero() {
                tokio::time::sleep(self.fetch_delay).await;
            }
            (self.fetch_fn)(category)
        }

        async fn invoke_command(&self, action: &Action) -> Result<(), FetchError> {
            self.commands.lock().unwrap().push(action.as_label());
            (self.command_fn)(action)
        }
    }

    fn sample_payload(category: CategoryId) -> Payload {
        match category {
            CategoryId::Power => Payload::Power(PowerReading {
                state: PowerState::On,
                watts: Some(120.0),
            }),
            CategoryId::Thermal => Payload::Thermal(ThermalReport::default()),
            CategoryId::FanMode => Payload::FanMode(FanMode::Optimal),
            CategoryId::PostSnoop => Payload::PostSnoop(PostCode { code: 0x00 }),
            CategoryId::Manager => Payload::Manager(ManagerInfo {
                firmware_version: "01.01.06".into(),
                health: Health::Ok,
            }),
            other => panic!("no sample payload for {other} in these tests"),
        }
    }

    fn registry_of(defs: &[(CategoryId, CadenceClass, bool)]) -> CategoryRegistry {
        CategoryRegistry::custom(
            defs.iter()
                .map(|(id, cadence, burst)| Category::new(*id, *cadence, *burst))
                .collect(),
        )
    }

    fn coordinator(
        fetcher: Arc<MockFetcher>,
        config: CoordinatorConfig,
        registry: CategoryRegistry,
    ) -> Arc<Coordinator> {
        Arc::new(Coordinator::new(fetcher, config, registry, Vec::new()).unwrap())
    }

    async fn run_in_background(coord: &Arc<Coordinator>) -> tokio::task::JoinHandle<()> {
        let c = Arc::clone(coord);
        tokio::spawn(async move {
            c.run().await.unwrap();
        })
    }

    fn drain_kinds(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        kinds
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_action_accelerates_burst_eligible_polling() {
        let fetcher = Arc::new(MockFetcher::ok());
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;

        // Startup poll only; without burst the next poll is 30s out.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Power), 1);

        coord.dispatch(Action::PowerOn).await.unwrap();

        // 60s burst window at 5s cadence: the forced refresh plus roughly
        // one launch per 5s, far more than the one base-cadence launch.
        tokio::time::sleep(Duration::from_secs(60)).await;
        let during_burst = fetcher.launch_count(CategoryId::Power) - 1;
        assert!(
            during_burst >= 10,
            "expected burst cadence, got {during_burst} launches in 60s"
        );

        // Window lapsed: back to the 30s interval.
        let before = fetcher.launch_count(CategoryId::Power);
        tokio::time::sleep(Duration::from_secs(60)).await;
        let after_expiry = fetcher.launch_count(CategoryId::Power) - before;
        assert!(
            after_expiry <= 3,
            "expected base cadence after expiry, got {after_expiry} launches in 60s"
        );

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeat_action_extends_burst_instead_of_stacking() {
        let fetcher = Arc::new(MockFetcher::ok());
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;
        let mut events = coord.events();

        coord.dispatch(Action::PowerOn).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        coord.dispatch(Action::PowerOff).await.unwrap();

        // Second window ends 60s after the second action; only one expiry
        // event total.
        tokio::time::sleep(Duration::from_secs(59)).await;
        let kinds = drain_kinds(&mut events);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == EventKind::BurstActivated)
                .count(),
            2
        );
        assert!(!kinds.contains(&EventKind::BurstExpired));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let kinds = drain_kinds(&mut events);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == EventKind::BurstExpired)
                .count(),
            1
        );

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_static_category_ignores_burst() {
        let fetcher = Arc::new(MockFetcher::ok());
        let registry = registry_of(&[
            (CategoryId::Power, CadenceClass::Fast, true),
            (CategoryId::Manager, CadenceClass::Static, false),
        ]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        coord.dispatch(Action::PowerOn).await.unwrap();
        tokio::time::sleep(Duration::from_secs(200)).await;

        // Static interval is 300s: only the startup poll despite the burst.
        assert_eq!(fetcher.launch_count(CategoryId::Manager), 1);
        // The burst did apply to the eligible fast category.
        assert!(fetcher.launch_count(CategoryId::Power) >= 10);

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_is_unavailable_immediately_but_keeps_cadence() {
        let fetcher = Arc::new(MockFetcher::with_fetch(Box::new(|_| {
            Err(FetchError::Auth {
                message: "401 unauthorized".into(),
            })
        })));
        let registry = registry_of(&[(CategoryId::FanMode, CadenceClass::Normal, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = coord.read(CategoryId::FanMode);
        assert!(!state.available);
        assert_eq!(state.unavailable_reason, Some(UnavailableReason::AuthFailed));
        assert_eq!(state.consecutive_failures, 1);

        // Not retired: polling continues at the scan interval.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(fetcher.launch_count(CategoryId::FanMode), 2);

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_cap_of_one_serializes_fetches() {
        let fetcher = Arc::new(MockFetcher::ok().with_delay(Duration::from_secs(2)));
        let registry = registry_of(&[
            (CategoryId::Power, CadenceClass::Fast, true),
            (CategoryId::Thermal, CadenceClass::Normal, true),
            (CategoryId::FanMode, CadenceClass::Normal, true),
            (CategoryId::PostSnoop, CadenceClass::Normal, true),
            (CategoryId::Manager, CadenceClass::Static, false),
        ]);
        let mut config = CoordinatorConfig::default();
        config.max_concurrent = 1;
        let coord = coordinator(Arc::clone(&fetcher), config, registry);
        let handle = run_in_background(&coord).await;

        tokio::time::sleep(Duration::from_secs(20)).await;

        // Everyone eventually completed, none were starved.
        for id in [
            CategoryId::Power,
            CategoryId::Thermal,
            CategoryId::FanMode,
            CategoryId::PostSnoop,
            CategoryId::Manager,
        ] {
            assert!(fetcher.launch_count(id) >= 1, "{id} never launched");
            assert!(coord.read(id).available, "{id} never applied");
        }

        // Strictly one at a time: consecutive launches are at least a full
        // fetch duration apart.
        let mut all: Vec<Instant> = fetcher.calls.lock().unwrap().iter().map(|(_, t)| *t).collect();
        all.sort();
        for pair in all.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2));
        }

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_is_never_overlapped_within_category() {
        // Every fetch outlives its timeout: the first runs for the full 10s
        // base-cadence cap, later ones for the 2.5s burst-cadence cap.
        let fetcher = Arc::new(MockFetcher::ok().with_delay(Duration::from_secs(20)));
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;

        // Startup launch at t=0; open the burst (5s cadence) and force the
        // category due while that fetch is still in flight.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Power), 1);
        coord.dispatch(Action::PowerOn).await.unwrap();
        coord.force_refresh(&[CategoryId::Power]).await;

        // Due at the burst cadence from t=5 onward, but the first fetch
        // holds its slot until the 10s timeout: still a single launch.
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Power), 1);

        // The pending demand is served once the slot frees up.
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Power), 2);

        tokio::time::sleep(Duration::from_secs(28)).await;
        let launches = fetcher.launches(CategoryId::Power);
        assert!(launches.len() >= 4);
        // No relaunch before the previous attempt resolved: the first slot
        // was held for 10s, every burst-cadence slot for 2.5s.
        assert!(launches[1] - launches[0] >= Duration::from_secs(10));
        for pair in launches.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(2500));
        }

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_crossing_retains_value_then_recovers() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let fetcher = Arc::new(MockFetcher::with_fetch(Box::new(move |category| {
            // Success, then three transport failures, then success again.
            match counter.fetch_add(1, Ordering::SeqCst) {
                0 => Ok(sample_payload(category)),
                1..=3 => Err(FetchError::Transport {
                    message: "connection refused".into(),
                }),
                _ => Ok(sample_payload(category)),
            }
        })));
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;
        let mut events = coord.events();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(coord.read(CategoryId::Power).available);

        // Failures 1 and 2 at t=30/t=60: stale value still served.
        tokio::time::sleep(Duration::from_secs(60)).await;
        let state = coord.read(CategoryId::Power);
        assert!(state.available);
        assert_eq!(state.consecutive_failures, 2);

        // Failure 3 at t=90 crosses the default threshold.
        tokio::time::sleep(Duration::from_secs(30)).await;
        let state = coord.read(CategoryId::Power);
        assert!(!state.available);
        assert_eq!(state.unavailable_reason, Some(UnavailableReason::Degraded));
        assert!(state.value.is_some(), "stale value must be retained");

        // Success at t=120 recovers.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(coord.read(CategoryId::Power).available);

        let kinds = drain_kinds(&mut events);
        assert!(kinds.contains(&EventKind::CategoryUnavailable));
        assert!(kinds.contains(&EventKind::CategoryRecovered));

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_retires_category_permanently() {
        let fetcher = Arc::new(MockFetcher::with_fetch(Box::new(|_| {
            Err(FetchError::Unsupported {
                message: "no oem endpoint".into(),
            })
        })));
        let registry = registry_of(&[(CategoryId::PostSnoop, CadenceClass::Normal, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;
        let mut events = coord.events();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(
            fetcher.launch_count(CategoryId::PostSnoop),
            1,
            "retired category must never be polled again"
        );
        let state = coord.read(CategoryId::PostSnoop);
        assert_eq!(state.unavailable_reason, Some(UnavailableReason::Unsupported));

        let kinds = drain_kinds(&mut events);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == EventKind::CategoryRetired)
                .count(),
            1
        );

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_counts_as_transient_failure() {
        // 20s fetch against a 10s cap.
        let fetcher = Arc::new(MockFetcher::ok().with_delay(Duration::from_secs(20)));
        let registry = registry_of(&[(CategoryId::Manager, CadenceClass::Static, false)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;
        let mut events = coord.events();

        tokio::time::sleep(Duration::from_secs(15)).await;
        let state = coord.read(CategoryId::Manager);
        assert!(matches!(state.last_error, Some(FetchError::Timeout { .. })));
        assert_eq!(state.consecutive_failures, 1);

        let kinds = drain_kinds(&mut events);
        assert!(kinds.contains(&EventKind::FetchTimedOut));
        assert!(kinds.contains(&EventKind::FetchFailed));

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_action_returns_error_verbatim_without_burst() {
        let fetcher = Arc::new(MockFetcher::ok().with_command(Box::new(|_| {
            Err(FetchError::Transport {
                message: "post failed".into(),
            })
        })));
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;
        let mut events = coord.events();

        let err = coord.dispatch(Action::PowerOn).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        // Exactly one attempt; never retried.
        assert_eq!(fetcher.commands.lock().unwrap().len(), 1);

        // No burst: base cadence only.
        tokio::time::sleep(Duration::from_secs(62)).await;
        assert!(fetcher.launch_count(CategoryId::Power) <= 4);
        let kinds = drain_kinds(&mut events);
        assert!(kinds.contains(&EventKind::ActionFailed));
        assert!(!kinds.contains(&EventKind::BurstActivated));

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_refresh_bypasses_static_cadence_once() {
        let fetcher = Arc::new(MockFetcher::ok());
        let registry = registry_of(&[(CategoryId::Manager, CadenceClass::Static, false)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Manager), 1);

        coord.force_refresh(&[CategoryId::Manager]).await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Manager), 2);

        // One-shot: no further acceleration.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Manager), 2);

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_twice_is_rejected() {
        let fetcher = Arc::new(MockFetcher::ok());
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(fetcher, CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let err = coord.run().await.unwrap_err();
        assert!(matches!(err, CoordinatorError::AlreadyRunning));

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling_and_publishes_lifecycle_events() {
        let fetcher = Arc::new(MockFetcher::ok());
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let mut events = coord.events();
        let handle = run_in_background(&coord).await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        coord.shutdown();
        coord.shutdown(); // idempotent
        handle.await.unwrap();

        let before = fetcher.launch_count(CategoryId::Power);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Power), before);

        let kinds = drain_kinds(&mut events);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == EventKind::ShutdownRequested)
                .count(),
            1
        );
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::Stopped).count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_in_flight_fetch_applies_nothing() {
        // 5s fetch; shutdown arrives while it is still running.
        let fetcher = Arc::new(MockFetcher::ok().with_delay(Duration::from_secs(5)));
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);
        let handle = run_in_background(&coord).await;

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fetcher.launch_count(CategoryId::Power), 1);
        coord.shutdown();
        handle.await.unwrap();

        // Let the cancelled fetch task unwind, then confirm the result was
        // dropped rather than applied.
        tokio::time::sleep(Duration::from_secs(10)).await;
        let state = coord.read(CategoryId::Power);
        assert!(!state.polled());
        assert!(state.value.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_listener_fires_through_coordinator() {
        let flips = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&flips);
        let fetcher = Arc::new(MockFetcher::with_fetch(Box::new(move |_| {
            // Alternate power state every poll so every apply is a change.
            let on = counter.fetch_add(1, Ordering::SeqCst) % 2 == 0;
            Ok(Payload::Power(PowerReading {
                state: if on { PowerState::On } else { PowerState::Off },
                watts: None,
            }))
        })));
        let registry = registry_of(&[(CategoryId::Power, CadenceClass::Fast, true)]);
        let coord = coordinator(Arc::clone(&fetcher), CoordinatorConfig::default(), registry);

        let seen = Arc::new(AtomicU32::new(0));
        let s = Arc::clone(&seen);
        let sub = coord.subscribe(
            CategoryId::Power,
            Arc::new(move |_state| {
                s.fetch_add(1, Ordering::SeqCst);
            }),
        );

        let handle = run_in_background(&coord).await;
        tokio::time::sleep(Duration::from_secs(62)).await;
        assert!(seen.load(Ordering::SeqCst) >= 3);

        coord.unsubscribe(sub);
        let before = seen.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(seen.load(Ordering::SeqCst), before);

        coord.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_at_construction() {
        let mut config = CoordinatorConfig::default();
        config.max_concurrent = 0;
        let result = Coordinator::new(
            Arc::new(MockFetcher::ok()),
            config,
            CategoryRegistry::standard(),
            Vec::new(),
        );
        assert!(matches!(
            result,
            Err(CoordinatorError::ConfigOutOfRange {
                field: "max_concurrent",
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_before_run_serves_never_polled_sentinel() {
        let coord = coordinator(
            Arc::new(MockFetcher::ok()),
            CoordinatorConfig::default(),
            CategoryRegistry::standard(),
        );
        let state = coord.read(CategoryId::Thermal);
        assert!(!state.available);
        assert_eq!(state.unavailable_reason, Some(UnavailableReason::NeverPolled));
    }
}
