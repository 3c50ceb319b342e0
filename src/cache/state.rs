//! # StateCache: last-known-good values with change notification.
//!
//! The cache is the single read surface for observers: a snapshot per
//! category plus a listener registry that fires on meaningful change.
//!
//! ```text
//!    scheduler (sole writer)
//!        │ apply(category, result)
//!        ▼
//!    ┌─────────────────────────────┐     read(id) ──► CategoryState (clone)
//!    │  RwLock<HashMap<Id, State>> │◄────
//!    └─────────────────────────────┘
//!        │ changed?
//!        ▼
//!    listeners for that category (called synchronously, lock released)
//! ```
//!
//! ## Rules
//! - Only the scheduler calls [`StateCache::apply`]; everyone else reads.
//! - Listeners fire only when the entry materially changed (value,
//!   availability, or unavailability reason), never on a no-op refresh.
//! - Listeners are invoked **after** the write lock is released; a listener
//!   may call [`StateCache::read`] without deadlocking.
//! - A payload whose tag does not match the polled category is treated as a
//!   malformed response, never stored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::SystemTime;

use crate::categories::{Category, CategoryId, Payload};
use crate::error::FetchError;

use super::entry::{CategoryState, UnavailableReason};

/// Callback invoked with the new snapshot when a category's state changes.
pub type ValueListener = Arc<dyn Fn(&CategoryState) + Send + Sync>;

/// Opaque handle returned by [`StateCache::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What an [`StateCache::apply`] call did, for the scheduler's event
/// publishing. All transitions are computed inside the write lock so they
/// are consistent with the returned snapshot.
#[derive(Clone, Debug)]
pub struct ApplyOutcome {
    /// The entry as it stands after this apply.
    pub snapshot: CategoryState,
    /// The stored value changed (first value, or merge produced a
    /// different one).
    pub value_changed: bool,
    /// The category flipped from available to unavailable, or its
    /// unavailability reason changed (e.g. degraded -> auth_failed).
    pub became_unavailable: bool,
    /// The category was unavailable after at least one prior attempt and is
    /// available again.
    pub recovered: bool,
    /// The category was marked unsupported by this apply (first time).
    pub retired: bool,
}

impl ApplyOutcome {
    /// True if listeners were (or would be) notified for this apply.
    pub fn changed(&self) -> bool {
        self.value_changed || self.became_unavailable || self.recovered || self.retired
    }
}

/// Concurrent last-known-good store for all categories.
///
/// Reads are lock-cheap clones; writes go through [`StateCache::apply`] and
/// are expected to come from a single task.
pub struct StateCache {
    entries: RwLock<HashMap<CategoryId, CategoryState>>,
    listeners: Mutex<HashMap<CategoryId, Vec<(SubscriptionId, ValueListener)>>>,
    next_sub: AtomicU64,
    failure_threshold: u32,
}

impl StateCache {
    /// Creates an empty cache.
    ///
    /// `failure_threshold` is the number of consecutive transient failures
    /// after which a category with a stale value is marked unavailable.
    #[must_use]
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            next_sub: AtomicU64::new(1),
            failure_threshold,
        }
    }

    /// Returns the current snapshot for a category.
    ///
    /// Before the first poll this is the never-polled sentinel, not an
    /// error.
    #[must_use]
    pub fn read(&self, category: CategoryId) -> CategoryState {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&category)
            .cloned()
            .unwrap_or_else(|| CategoryState::never_polled(category))
    }

    /// Returns snapshots for every category that has an entry.
    #[must_use]
    pub fn read_all(&self) -> Vec<CategoryState> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Registers a listener for one category's changes.
    pub fn subscribe(&self, category: CategoryId, listener: ValueListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_sub.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(category)
            .or_default()
            .push((id, listener));
        id
    }

    /// Removes a previously registered listener. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut listeners = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for subs in listeners.values_mut() {
            subs.retain(|(sub_id, _)| *sub_id != id);
        }
    }

    /// Applies one fetch result and returns what changed.
    ///
    /// Success merges the payload via the category's merge function and
    /// clears the failure streak. Failure increments the streak and retains
    /// the stale value; availability is recomputed from the error class and
    /// the threshold. Listeners fire synchronously after the lock is
    /// released, only if something observable changed.
    pub fn apply(&self, category: &Category, result: Result<Payload, FetchError>) -> ApplyOutcome {
        // Guard against a fetcher returning a payload for the wrong
        // category; store nothing, count it as a malformed response.
        let result = match result {
            Ok(payload) if payload.category() != category.id => {
                Err(FetchError::Malformed {
                    message: format!(
                        "payload tagged {} for category {}",
                        payload.category(),
                        category.id
                    ),
                })
            }
            other => other,
        };

        let outcome = {
            let mut entries = self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let entry = entries
                .entry(category.id)
                .or_insert_with(|| CategoryState::never_polled(category.id));

            let was_available = entry.available;
            let was_reason = entry.unavailable_reason;
            let had_polled = entry.polled();
            let now = SystemTime::now();
            entry.last_attempt_at = Some(now);

            let value_changed = match result {
                Ok(payload) => {
                    let prev = entry.value.take();
                    let merged = (category.merge)(prev.clone(), payload);
                    let changed = prev.as_ref() != Some(&merged);
                    entry.value = Some(merged);
                    entry.last_success_at = Some(now);
                    entry.last_error = None;
                    entry.consecutive_failures = 0;
                    entry.available = true;
                    entry.unavailable_reason = None;
                    changed
                }
                Err(err) => {
                    entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                    if err.is_terminal() {
                        entry.available = false;
                        entry.unavailable_reason = Some(UnavailableReason::Unsupported);
                    } else if err.escalates() {
                        entry.available = false;
                        entry.unavailable_reason = Some(UnavailableReason::AuthFailed);
                    } else {
                        let healthy = entry.value.is_some()
                            && entry.consecutive_failures < self.failure_threshold;
                        entry.available = healthy;
                        entry.unavailable_reason = if healthy {
                            None
                        } else if had_polled || entry.value.is_some() {
                            Some(UnavailableReason::Degraded)
                        } else {
                            Some(UnavailableReason::NeverPolled)
                        };
                    }
                    entry.last_error = Some(err);
                    false
                }
            };

            let retired = entry.unavailable_reason == Some(UnavailableReason::Unsupported)
                && was_reason != Some(UnavailableReason::Unsupported);
            let became_unavailable = !entry.available
                && (was_available || was_reason != entry.unavailable_reason)
                && !retired;
            let recovered = entry.available && !was_available && had_polled;

            ApplyOutcome {
                snapshot: entry.clone(),
                value_changed,
                became_unavailable,
                recovered,
                retired,
            }
        };

        if outcome.changed() {
            self.notify(&outcome.snapshot);
        }
        outcome
    }

    fn notify(&self, snapshot: &CategoryState) {
        let callbacks: Vec<ValueListener> = {
            let listeners = self
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            listeners
                .get(&snapshot.category)
                .map(|subs| subs.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default()
        };
        for listener in callbacks {
            listener(snapshot);
        }
    }
}
