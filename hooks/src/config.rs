//! Dispatcher configuration.

use std::time::Duration;

use serde::Deserialize;

/// Controls how the dispatcher guards plugin callbacks.
///
/// Deserializable so a node can embed it in its own config file; missing
/// fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Catch a panicking callback, report it, and carry on with the next
    /// candidate. When `false` the panic unwinds into the pipeline.
    pub isolate_panics: bool,

    /// Callbacks running longer than this are reported as slow.
    /// `None` disables the check.
    /// Default: 250 ms.
    pub slow_callback_threshold_ms: Option<u64>,
}

impl DispatcherConfig {
    pub fn slow_callback_threshold(&self) -> Option<Duration> {
        self.slow_callback_threshold_ms.map(Duration::from_millis)
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            isolate_panics: true,
            slow_callback_threshold_ms: Some(250),
        }
    }
}
