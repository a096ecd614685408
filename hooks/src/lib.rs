//! `strata-hooks` — lifecycle hooks for the Strata block-processing pipeline.
//!
//! Plugins register callbacks under hook names in a [`PluginRegistry`].
//! The pipeline owns a [`HookDispatcher`] built over that registry and calls
//! one entry point per lifecycle event; the dispatcher finds the callbacks
//! whose shape matches the hook and invokes them in registration order.
//!
//! ```text
//! PreProcessBlock
//!   └─ per transaction: PreProcessTransaction
//!        ├─ failure: BlockProcessingError (block abandoned)
//!        └─ success: PostProcessTransaction
//! PostProcessBlock
//! NewHead | NewSideBlock | Reorg (+ NewHead)
//! ```

pub mod name;
pub mod callback;
pub mod registry;
pub mod encoder;
pub mod config;
pub mod error;
pub mod dispatcher;
mod stats;

pub use callback::{CallbackShape, HookCallback};
pub use config::DispatcherConfig;
pub use dispatcher::{BlockPayload, HookDispatcher, HookDispatcherBuilder};
pub use encoder::{CanonicalEncoder, PayloadEncoder};
pub use error::DispatchError;
pub use name::{HookName, UnknownHookName};
pub use registry::{Candidate, HookRegistry, Plugin, PluginRegistry, PluginRegistryBuilder};
pub use stats::StatsSnapshot;
