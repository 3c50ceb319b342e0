//! Error types used by the bmcpoll coordinator and fetchers.
//!
//! This module defines two main error enums:
//!
//! - [`CoordinatorError`] — errors raised by the coordination layer itself
//!   (construction-time validation, lifecycle misuse).
//! - [`FetchError`] — errors raised by the fetcher for individual polls
//!   and commands.
//!
//! Both types provide `as_label()` for logging/metrics, and [`FetchError`]
//! adds classification helpers ([`FetchError::is_transient`],
//! [`FetchError::is_terminal`], [`FetchError::escalates`]) that drive the
//! coordinator's failure policy:
//!
//! | class                  | poll behavior                                   |
//! |------------------------|-------------------------------------------------|
//! | transient (transport,  | absorbed; counted toward the failure threshold, |
//! | timeout, malformed)    | retried on the normal schedule                  |
//! | escalating (auth)      | category marked unavailable immediately         |
//! | terminal (unsupported) | category retired; never polled again            |

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the coordinator runtime.
///
/// These represent failures in the coordination layer itself, not in any
/// individual fetch. Out-of-range configuration is rejected at construction;
/// it is never silently clamped.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// A configuration field is outside its permitted range.
    #[error("{field} = {value} out of range [{min}, {max}]")]
    ConfigOutOfRange {
        /// Name of the offending configuration field.
        field: &'static str,
        /// The rejected value (seconds for intervals, raw count otherwise).
        value: u64,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },

    /// `run()` was called more than once on the same coordinator.
    #[error("coordinator is already running (run() may only be called once)")]
    AlreadyRunning,
}

impl CoordinatorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CoordinatorError::ConfigOutOfRange { .. } => "config_out_of_range",
            CoordinatorError::AlreadyRunning => "already_running",
        }
    }
}

/// # Errors produced by fetch and command execution.
///
/// These represent failures of individual BMC interactions. The coordinator
/// never propagates poll errors up the call stack; they are recorded on the
/// category's cache entry and drive availability. Command errors from
/// [`dispatch`](crate::Coordinator::dispatch) are returned to the caller
/// verbatim and never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network/connection failure reaching the BMC.
    #[error("transport error: {message}")]
    Transport {
        /// The underlying transport error message.
        message: String,
    },

    /// The fetch exceeded its bounded timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The BMC rejected the configured credentials.
    #[error("authentication failed: {message}")]
    Auth {
        /// The rejection detail from the BMC.
        message: String,
    },

    /// The BMC does not implement this category or action.
    #[error("not supported by this BMC: {message}")]
    Unsupported {
        /// Which feature/endpoint was missing.
        message: String,
    },

    /// The BMC responded but the payload could not be parsed.
    #[error("malformed response: {message}")]
    Malformed {
        /// The parse failure detail.
        message: String,
    },
}

impl FetchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use bmcpoll::FetchError;
    ///
    /// let err = FetchError::Transport { message: "connection refused".into() };
    /// assert_eq!(err.as_label(), "fetch_transport");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "fetch_transport",
            FetchError::Timeout { .. } => "fetch_timeout",
            FetchError::Auth { .. } => "fetch_auth",
            FetchError::Unsupported { .. } => "fetch_unsupported",
            FetchError::Malformed { .. } => "fetch_malformed",
        }
    }

    /// True for errors that are absorbed and retried on the normal schedule.
    ///
    /// Transient errors count toward the consecutive-failure threshold; the
    /// cached value is retained (stale-but-present) while they accumulate.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Transport { .. }
                | FetchError::Timeout { .. }
                | FetchError::Malformed { .. }
        )
    }

    /// True for errors that mark the category unavailable immediately,
    /// without waiting for the failure threshold.
    pub fn escalates(&self) -> bool {
        matches!(self, FetchError::Auth { .. })
    }

    /// True for errors that retire the category for the life of the
    /// coordinator (the condition cannot change without a BMC firmware or
    /// configuration change).
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchError::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_is_disjoint() {
        let errors = [
            FetchError::Transport {
                message: "refused".into(),
            },
            FetchError::Timeout {
                timeout: Duration::from_secs(5),
            },
            FetchError::Auth {
                message: "locked".into(),
            },
            FetchError::Unsupported {
                message: "no oem endpoint".into(),
            },
            FetchError::Malformed {
                message: "truncated json".into(),
            },
        ];

        for err in &errors {
            let classes = [err.is_transient(), err.escalates(), err.is_terminal()];
            assert_eq!(
                classes.iter().filter(|c| **c).count(),
                1,
                "{} must fall into exactly one class",
                err.as_label()
            );
        }
    }

    #[test]
    fn test_config_error_names_field() {
        let err = CoordinatorError::ConfigOutOfRange {
            field: "scan_interval",
            value: 5,
            min: 10,
            max: 300,
        };
        let msg = err.to_string();
        assert!(msg.contains("scan_interval"));
        assert!(msg.contains('5'));
        assert_eq!(err.as_label(), "config_out_of_range");
    }
}
