//! Dispatch counters.
//!
//! Plugin misbehavior is otherwise invisible to operators, so the dispatcher
//! counts it. Counters are relaxed atomics: they are monotonic totals, never
//! used for synchronization.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct DispatchStats {
    dispatches: AtomicU64,
    unconfigured: AtomicU64,
    invocations: AtomicU64,
    callback_panics: AtomicU64,
    encoding_failures: AtomicU64,
    slow_callbacks: AtomicU64,
}

impl DispatchStats {
    pub(crate) fn record_dispatch(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_unconfigured(&self) {
        self.unconfigured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_panic(&self) {
        self.callback_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_encoding_failure(&self) {
        self.encoding_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_slow(&self) {
        self.slow_callbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            unconfigured: self.unconfigured.load(Ordering::Relaxed),
            invocations: self.invocations.load(Ordering::Relaxed),
            callback_panics: self.callback_panics.load(Ordering::Relaxed),
            encoding_failures: self.encoding_failures.load(Ordering::Relaxed),
            slow_callbacks: self.slow_callbacks.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Entry-point calls, including those skipped for lack of a registry.
    pub dispatches: u64,
    /// Calls that found no registry installed.
    pub unconfigured: u64,
    /// Callbacks invoked (including ones that panicked).
    pub invocations: u64,
    /// Callbacks that panicked and were isolated.
    pub callback_panics: u64,
    /// Encoded-payload dispatches skipped because encoding failed.
    pub encoding_failures: u64,
    /// Callbacks that exceeded the slow-callback threshold.
    pub slow_callbacks: u64,
}
