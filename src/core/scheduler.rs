//! # Scheduler: the single polling loop.
//!
//! One task owns all scheduling state (due times, in-flight flags, the burst
//! window) and is the **sole writer** to the state cache. Fetches run in
//! detached tasks, each holding a gate permit, and report back over a
//! channel; nothing else mutates the cache, so observers can never see a
//! torn update.
//!
//! ```text
//!            ┌──────────────── tick (≤ 1s) ────────────────┐
//!            ▼                                             │
//!    ┌──────────────┐   due?  ┌──────┐  permit  ┌────────────────┐
//!    │  Scheduler   │────────►│ Gate │─────────►│ fetch task (N) │
//!    │  (one task)  │         └──────┘          │ timeout-bound  │
//!    └──────────────┘                           └────────────────┘
//!       ▲       ▲                                       │
//!       │       └────────── FetchOutcome channel ───────┘
//!       └────────────────── Command channel (dispatcher, force_refresh)
//! ```
//!
//! ## Rules
//! - Per category, at most one fetch is in flight; a still-running fetch
//!   suppresses the next due launch rather than queueing behind it.
//! - A category becomes due `effective_interval` after its last **launch**,
//!   so launches for one category are spaced at least that far apart.
//! - After cancellation no outcome is applied to the cache; fetch tasks
//!   observe the token and drop their result.
//! - Retired categories (unsupported) are never launched again.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cache::StateCache;
use crate::categories::{Category, CategoryId, CategoryRegistry, Payload};
use crate::config::CoordinatorConfig;
use crate::error::FetchError;
use crate::events::{Bus, Event, EventKind};
use crate::fetcher::Fetcher;

use super::burst::{effective_interval, BurstWindow};
use super::gate::Gate;

/// Requests from outside the loop (dispatcher, `force_refresh`).
#[derive(Debug)]
pub(crate) enum Command {
    /// A control action was accepted by the BMC: open the burst window and
    /// force the burst-eligible affected categories due.
    ActionSucceeded {
        action: &'static str,
        affected: &'static [CategoryId],
    },
    /// Force specific categories due out of cycle (cadence class ignored).
    ForceRefresh { categories: Vec<CategoryId> },
}

/// Result of one detached fetch task.
struct FetchOutcome {
    category: CategoryId,
    result: Result<Payload, FetchError>,
    elapsed: Duration,
    timeout: Duration,
}

/// Per-category scheduling slot.
struct Slot {
    category: Category,
    in_flight: bool,
    last_launch: Option<Instant>,
    forced: bool,
    retired: bool,
}

impl Slot {
    fn new(category: Category) -> Self {
        Self {
            category,
            in_flight: false,
            last_launch: None,
            forced: false,
            retired: false,
        }
    }

    fn due(&self, now: Instant, interval: Duration) -> bool {
        if self.retired || self.in_flight {
            return false;
        }
        self.forced
            || self
                .last_launch
                .map_or(true, |launched| now.duration_since(launched) >= interval)
    }
}

/// The polling loop state. Consumed by [`Scheduler::run`].
pub(crate) struct Scheduler {
    config: CoordinatorConfig,
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<StateCache>,
    bus: Bus,
    gate: Gate,
    slots: Vec<Slot>,
    burst: BurstWindow,
    commands: mpsc::Receiver<Command>,
    outcomes_tx: mpsc::Sender<FetchOutcome>,
    outcomes_rx: mpsc::Receiver<FetchOutcome>,
    cancel: CancellationToken,
}

impl Scheduler {
    pub(crate) fn new(
        config: CoordinatorConfig,
        registry: &CategoryRegistry,
        fetcher: Arc<dyn Fetcher>,
        cache: Arc<StateCache>,
        bus: Bus,
        commands: mpsc::Receiver<Command>,
        cancel: CancellationToken,
    ) -> Self {
        let slots: Vec<Slot> = registry.list().iter().copied().map(Slot::new).collect();
        // Sized so every slot can hold one pending outcome without the
        // fetch tasks ever blocking on send.
        let (outcomes_tx, outcomes_rx) = mpsc::channel(slots.len().max(1));
        Self {
            gate: Gate::new(config.max_concurrent),
            config,
            fetcher,
            cache,
            bus,
            slots,
            burst: BurstWindow::new(),
            commands,
            outcomes_tx,
            outcomes_rx,
            cancel,
        }
    }

    /// Runs until the cancellation token fires, then publishes `Stopped`.
    pub(crate) async fn run(mut self) {
        let mut tick = tokio::time::interval(self.config.tick_interval());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tick.tick() => self.on_tick(),
                Some(cmd) = self.commands.recv() => self.on_command(cmd),
                Some(outcome) = self.outcomes_rx.recv() => self.on_outcome(outcome),
            }
        }

        self.bus.publish(Event::new(EventKind::Stopped));
    }

    /// One scheduling pass: expire the burst window, launch everything due
    /// for which a permit is free.
    fn on_tick(&mut self) {
        let now = Instant::now();
        if self.burst.expire_if_lapsed(now) {
            self.bus.publish(Event::new(EventKind::BurstExpired));
        }
        let burst_active = self.burst.is_active(now);

        for idx in 0..self.slots.len() {
            let interval = effective_interval(&self.slots[idx].category, &self.config, burst_active);
            if !self.slots[idx].due(now, interval) {
                continue;
            }
            // No permit: the slot stays due and is retried next tick.
            let Some(permit) = self.gate.try_acquire() else {
                break;
            };
            self.launch(idx, permit, interval, now);
        }
    }

    fn launch(
        &mut self,
        idx: usize,
        permit: tokio::sync::OwnedSemaphorePermit,
        interval: Duration,
        now: Instant,
    ) {
        let slot = &mut self.slots[idx];
        slot.in_flight = true;
        slot.forced = false;
        slot.last_launch = Some(now);

        let category = slot.category.id;
        let timeout = self.config.fetch_timeout(interval);
        self.bus
            .publish(Event::new(EventKind::FetchStarted).with_category(category));

        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.outcomes_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let started = Instant::now();
            let result = tokio::select! {
                // Shutdown: drop the fetch, report nothing.
                _ = cancel.cancelled() => return,
                res = tokio::time::timeout(timeout, fetcher.fetch(category)) => match res {
                    Ok(inner) => inner,
                    Err(_) => Err(FetchError::Timeout { timeout }),
                },
            };
            let _ = tx
                .send(FetchOutcome {
                    category,
                    result,
                    elapsed: started.elapsed(),
                    timeout,
                })
                .await;
        });
    }

    fn on_outcome(&mut self, outcome: FetchOutcome) {
        let Some(slot) = self
            .slots
            .iter_mut()
            .find(|s| s.category.id == outcome.category)
        else {
            return;
        };
        slot.in_flight = false;
        let category = slot.category;

        if matches!(outcome.result, Err(FetchError::Timeout { .. })) {
            self.bus.publish(
                Event::new(EventKind::FetchTimedOut)
                    .with_category(category.id)
                    .with_timeout(outcome.timeout),
            );
        }
        let error_text = outcome.result.as_ref().err().map(ToString::to_string);

        let applied = self.cache.apply(&category, outcome.result);

        match error_text {
            None => self.bus.publish(
                Event::new(EventKind::FetchSucceeded)
                    .with_category(category.id)
                    .with_duration(outcome.elapsed),
            ),
            Some(text) => self.bus.publish(
                Event::new(EventKind::FetchFailed)
                    .with_category(category.id)
                    .with_reason(text)
                    .with_failures(applied.snapshot.consecutive_failures),
            ),
        }

        if applied.retired {
            if let Some(s) = self
                .slots
                .iter_mut()
                .find(|s| s.category.id == category.id)
            {
                s.retired = true;
            }
            let reason = applied
                .snapshot
                .last_error
                .as_ref()
                .map_or_else(|| "unsupported".to_string(), ToString::to_string);
            self.bus.publish(
                Event::new(EventKind::CategoryRetired)
                    .with_category(category.id)
                    .with_reason(reason),
            );
        } else if applied.became_unavailable {
            let reason = applied
                .snapshot
                .unavailable_reason
                .map_or("unavailable", |r| r.as_label());
            self.bus.publish(
                Event::new(EventKind::CategoryUnavailable)
                    .with_category(category.id)
                    .with_reason(reason)
                    .with_failures(applied.snapshot.consecutive_failures),
            );
        } else if applied.recovered {
            self.bus
                .publish(Event::new(EventKind::CategoryRecovered).with_category(category.id));
        }
    }

    fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::ActionSucceeded { action, affected } => {
                let now = Instant::now();
                self.burst.activate(now, self.config.burst_duration);
                self.bus.publish(
                    Event::new(EventKind::BurstActivated)
                        .with_action(action)
                        .with_duration(self.config.burst_duration)
                        .with_count(self.burst.activations()),
                );
                let eligible: Vec<CategoryId> = affected
                    .iter()
                    .copied()
                    .filter(|id| {
                        self.slots
                            .iter()
                            .any(|s| s.category.id == *id && s.category.burst_eligible)
                    })
                    .collect();
                self.force(&eligible);
            }
            Command::ForceRefresh { categories } => self.force(&categories),
        }
    }

    /// Marks known, unretired categories due now; the next tick launches
    /// them (permits allowing).
    fn force(&mut self, categories: &[CategoryId]) {
        for id in categories {
            let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| s.category.id == *id && !s.retired)
            else {
                continue;
            };
            slot.forced = true;
            self.bus
                .publish(Event::new(EventKind::RefreshForced).with_category(*id));
        }
    }
}
