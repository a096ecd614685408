//! Dispatch failure reports.
//!
//! None of these ever reach the pipeline: entry points return `()`. They
//! exist so each failure is logged with one consistent shape.

use std::any::Any;
use std::time::Duration;

use strata_primitives::CodecError;

use crate::name::HookName;

/// A failure observed while dispatching one hook.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No registry was installed when the dispatcher was built.
    #[error("attempting {hook}, but no plugin registry has been installed")]
    RegistryUnavailable { hook: HookName },

    /// The payload for an encoded-payload hook could not be serialized.
    #[error("{hook}: failed to encode {payload} payload, delivery skipped: {source}")]
    Encoding {
        hook: HookName,
        payload: &'static str,
        #[source]
        source: CodecError,
    },

    /// A plugin callback panicked.
    #[error("{hook}: callback from plugin `{plugin}` panicked: {message}")]
    CallbackPanicked {
        hook: HookName,
        plugin: String,
        message: String,
    },

    /// A plugin callback ran past the slow-callback threshold.
    #[error("{hook}: callback from plugin `{plugin}` took {elapsed:?} (threshold {threshold:?})")]
    SlowCallback {
        hook: HookName,
        plugin: String,
        elapsed: Duration,
        threshold: Duration,
    },
}

impl DispatchError {
    pub fn hook(&self) -> HookName {
        match self {
            Self::RegistryUnavailable { hook }
            | Self::Encoding { hook, .. }
            | Self::CallbackPanicked { hook, .. }
            | Self::SlowCallback { hook, .. } => *hook,
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
