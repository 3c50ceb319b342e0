//! # Gate: the outbound concurrency cap.
//!
//! Wraps a semaphore sized to `max_concurrent`. Each launched fetch holds an
//! owned permit for its whole lifetime (including the timeout window), so
//! the BMC never sees more simultaneous requests than the cap — even when
//! every category becomes due in the same tick.
//!
//! The scheduler uses [`Gate::try_acquire`] rather than waiting: a category
//! that finds no permit simply stays due and is retried on the next tick.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Semaphore-backed cap on simultaneously in-flight fetches.
#[derive(Clone, Debug)]
pub(crate) struct Gate {
    sem: Arc<Semaphore>,
}

impl Gate {
    /// Creates a gate admitting at most `max_concurrent` holders (≥ 1).
    pub(crate) fn new(max_concurrent: usize) -> Self {
        Self {
            sem: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Takes a permit if one is free right now.
    ///
    /// The permit is released when dropped, which the fetch task does on
    /// completion, timeout, or cancellation.
    pub(crate) fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        Arc::clone(&self.sem).try_acquire_owned().ok()
    }

    /// Permits currently free.
    #[cfg(test)]
    pub(crate) fn available(&self) -> usize {
        self.sem.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_is_enforced() {
        let gate = Gate::new(2);
        let a = gate.try_acquire();
        let b = gate.try_acquire();
        assert!(a.is_some());
        assert!(b.is_some());
        assert!(gate.try_acquire().is_none());

        drop(a);
        assert_eq!(gate.available(), 1);
        assert!(gate.try_acquire().is_some());
        drop(b);
    }

    #[test]
    fn test_zero_is_clamped_to_one() {
        let gate = Gate::new(0);
        assert!(gate.try_acquire().is_some());
    }
}
