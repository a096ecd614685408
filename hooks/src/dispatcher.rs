//! Hook dispatcher: the pipeline's single point of contact with plugins.
//!
//! Every entry point follows the same four steps:
//!
//! 1. Availability: with no registry installed, log one warning and return.
//! 2. Lookup: ask the registry for candidates under the hook's name whose
//!    shape matches the hook.
//! 3. Payload: encoded-payload hooks serialize once, before fan-out, and
//!    only when at least one candidate matched. An encoding failure is
//!    logged and nothing is delivered. A [`BlockPayload`] carries one block
//!    encoding across the per-transaction dispatches of that block.
//! 4. Fan-out: invoke each candidate synchronously, in registry order, on
//!    the calling thread. A panicking callback is caught and reported, and
//!    the next candidate still runs.
//!
//! Entry points return `()`. Hooks are notifications: they never alter or
//! fail the pipeline step that fired them.
//!
//! Panic isolation relies on unwinding. A binary built with
//! `panic = "abort"` still aborts on a callback panic.

use std::cell::OnceCell;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use strata_primitives::{Block, CodecError, Hash, Log, Receipt, Transaction};

use crate::callback::HookCallback;
use crate::config::DispatcherConfig;
use crate::encoder::{CanonicalEncoder, PayloadEncoder};
use crate::error::{panic_message, DispatchError};
use crate::name::HookName;
use crate::registry::{Candidate, HookRegistry};
use crate::stats::{DispatchStats, StatsSnapshot};

/// Dispatches lifecycle events to plugin callbacks.
///
/// The registry is fixed at construction. A dispatcher built without one
/// is a valid, permanently disabled dispatcher; there is no way to install
/// or swap a registry afterwards.
///
/// `HookDispatcher` is `Send + Sync`: pipeline threads may share one
/// instance and dispatch concurrently.
pub struct HookDispatcher {
    registry: Option<Arc<dyn HookRegistry>>,
    encoder: Arc<dyn PayloadEncoder>,
    config: DispatcherConfig,
    stats: DispatchStats,
}

impl HookDispatcher {
    /// Dispatcher over `registry` with the canonical encoder and default config.
    pub fn new(registry: Arc<dyn HookRegistry>) -> Self {
        Self::builder().registry(registry).build()
    }

    /// Dispatcher with no registry: every entry point logs a warning and returns.
    pub fn disabled() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HookDispatcherBuilder {
        HookDispatcherBuilder::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.registry.is_some()
    }

    pub fn registry(&self) -> Option<&Arc<dyn HookRegistry>> {
        self.registry.as_ref()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    // ── Entry points ──

    /// Before a block's transactions run. Delivers the encoded block.
    pub fn pre_process_block(&self, block: &Block) {
        let hook = HookName::PreProcessBlock;
        let Some(candidates) = self.candidates(hook) else {
            return;
        };
        let Some(encoded) = self.encode(hook, "block", self.encoder.encode_block(block)) else {
            return;
        };
        self.fan_out(hook, &candidates, |callback| {
            if let HookCallback::EncodedBlock(f) = callback {
                f(&encoded);
            }
        });
    }

    /// Before transaction `index` of `block` runs. Delivers the encoded
    /// transaction, the encoded block, and `index` exactly as given.
    pub fn pre_process_transaction(&self, tx: &Transaction, block: &Block, index: i64) {
        self.pre_process_transaction_with(tx, &BlockPayload::new(block), index);
    }

    /// [`pre_process_transaction`](Self::pre_process_transaction) for callers
    /// looping over a block's transactions: the block is encoded on the first
    /// dispatch that needs it and reused by the rest.
    pub fn pre_process_transaction_with(&self, tx: &Transaction, block: &BlockPayload<'_>, index: i64) {
        let hook = HookName::PreProcessTransaction;
        let Some(candidates) = self.candidates(hook) else {
            return;
        };
        let Some(tx_bytes) = self.encode(hook, "transaction", self.encoder.encode_transaction(tx))
        else {
            return;
        };
        let encoded = block
            .encoded
            .get_or_init(|| self.encoder.encode_block(block.block));
        let Some(block_bytes) = self.encode(hook, "block", encoded.as_deref().map_err(Clone::clone))
        else {
            return;
        };
        self.fan_out(hook, &candidates, |callback| {
            if let HookCallback::EncodedTransaction(f) = callback {
                f(&tx_bytes, block_bytes, index);
            }
        });
    }

    /// A transaction failed and the block is being abandoned. The error is
    /// informational; it has already been decided by the time hooks see it.
    pub fn block_processing_error(&self, tx: &Transaction, block: &Block, err: &(dyn Error + 'static)) {
        let hook = HookName::BlockProcessingError;
        let Some(candidates) = self.candidates(hook) else {
            return;
        };
        self.fan_out(hook, &candidates, |callback| {
            if let HookCallback::ProcessingError(f) = callback {
                f(tx, block, err);
            }
        });
    }

    /// Transaction `index` of `block` ran and produced `receipt`.
    pub fn post_process_transaction(
        &self,
        tx: &Transaction,
        block: &Block,
        index: i64,
        receipt: &Receipt,
    ) {
        let hook = HookName::PostProcessTransaction;
        let Some(candidates) = self.candidates(hook) else {
            return;
        };
        self.fan_out(hook, &candidates, |callback| {
            if let HookCallback::TransactionReceipt(f) = callback {
                f(tx, block, index, receipt);
            }
        });
    }

    /// Every transaction of `block` ran successfully.
    pub fn post_process_block(&self, block: &Block) {
        let hook = HookName::PostProcessBlock;
        let Some(candidates) = self.candidates(hook) else {
            return;
        };
        self.fan_out(hook, &candidates, |callback| {
            if let HookCallback::Block(f) = callback {
                f(block);
            }
        });
    }

    /// `block` became the canonical head.
    pub fn new_head(&self, block: &Block, hash: Hash, logs: &[Log]) {
        self.chain_event(HookName::NewHead, block, hash, logs);
    }

    /// `block` was imported on a side branch.
    pub fn new_side_block(&self, block: &Block, hash: Hash, logs: &[Log]) {
        self.chain_event(HookName::NewSideBlock, block, hash, logs);
    }

    /// The canonical chain switched branches at `common`. Segments are
    /// delivered exactly as the pipeline passed them.
    pub fn reorg(&self, common: &Block, old_chain: &[Block], new_chain: &[Block]) {
        let hook = HookName::Reorg;
        let Some(candidates) = self.candidates(hook) else {
            return;
        };
        self.fan_out(hook, &candidates, |callback| {
            if let HookCallback::Reorg(f) = callback {
                f(common, old_chain, new_chain);
            }
        });
    }

    // ── Internals ──

    fn chain_event(&self, hook: HookName, block: &Block, hash: Hash, logs: &[Log]) {
        let Some(candidates) = self.candidates(hook) else {
            return;
        };
        self.fan_out(hook, &candidates, |callback| {
            if let HookCallback::ChainEvent(f) = callback {
                f(block, hash, logs);
            }
        });
    }

    /// Matching candidates, or `None` when there is nothing to deliver to.
    fn candidates(&self, hook: HookName) -> Option<Vec<&Candidate>> {
        self.stats.record_dispatch();

        let Some(registry) = self.registry.as_deref() else {
            self.stats.record_unconfigured();
            report(&DispatchError::RegistryUnavailable { hook });
            return None;
        };

        let candidates = registry.lookup(hook.as_str(), hook.expected_shape());
        if candidates.is_empty() {
            tracing::trace!(hook = %hook, "no matching callbacks");
            return None;
        }
        Some(candidates)
    }

    fn encode<B>(
        &self,
        hook: HookName,
        payload: &'static str,
        result: Result<B, CodecError>,
    ) -> Option<B> {
        match result {
            Ok(bytes) => Some(bytes),
            Err(source) => {
                self.stats.record_encoding_failure();
                report(&DispatchError::Encoding {
                    hook,
                    payload,
                    source,
                });
                None
            }
        }
    }

    fn fan_out<F>(&self, hook: HookName, candidates: &[&Candidate], invoke: F)
    where
        F: Fn(&HookCallback),
    {
        let _span = tracing::debug_span!("hook_dispatch", hook = %hook, candidates = candidates.len())
            .entered();

        for candidate in candidates {
            self.stats.record_invocation();
            let started = Instant::now();

            if self.config.isolate_panics {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| invoke(candidate.callback())));
                if let Err(payload) = outcome {
                    self.stats.record_panic();
                    report(&DispatchError::CallbackPanicked {
                        hook,
                        plugin: candidate.plugin().to_string(),
                        message: panic_message(payload.as_ref()),
                    });
                }
            } else {
                invoke(candidate.callback());
            }

            self.check_elapsed(hook, candidate, started.elapsed());
        }
    }

    fn check_elapsed(&self, hook: HookName, candidate: &Candidate, elapsed: Duration) {
        let Some(threshold) = self.config.slow_callback_threshold() else {
            return;
        };
        if elapsed <= threshold {
            return;
        }
        self.stats.record_slow();
        report(&DispatchError::SlowCallback {
            hook,
            plugin: candidate.plugin().to_string(),
            elapsed,
            threshold,
        });
    }
}

/// Log one dispatch failure. Panics are errors; everything else is a warning.
fn report(err: &DispatchError) {
    let hook = err.hook();
    match err {
        DispatchError::RegistryUnavailable { .. } => {
            tracing::warn!(hook = %hook, "{err}");
        }
        DispatchError::Encoding { payload, .. } => {
            tracing::warn!(hook = %hook, payload = *payload, "{err}");
        }
        DispatchError::CallbackPanicked { plugin, .. } => {
            tracing::error!(hook = %hook, plugin = plugin.as_str(), "{err}");
        }
        DispatchError::SlowCallback { plugin, elapsed, .. } => {
            tracing::warn!(
                hook = %hook,
                plugin = plugin.as_str(),
                elapsed_ms = elapsed.as_millis() as u64,
                "{err}"
            );
        }
    }
}

/// A block shared by the per-transaction dispatches of one processing run.
///
/// Its canonical encoding is produced at most once, by the first dispatch
/// that has a matching candidate. Not `Sync`; build one per processing loop.
pub struct BlockPayload<'a> {
    block: &'a Block,
    encoded: OnceCell<Result<Vec<u8>, CodecError>>,
}

impl<'a> BlockPayload<'a> {
    pub fn new(block: &'a Block) -> Self {
        Self {
            block,
            encoded: OnceCell::new(),
        }
    }

    pub fn block(&self) -> &'a Block {
        self.block
    }

    /// Whether an encoding has been attempted yet.
    pub fn is_encoded(&self) -> bool {
        self.encoded.get().is_some()
    }
}

impl fmt::Debug for HookDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDispatcher")
            .field("enabled", &self.is_enabled())
            .field("config", &self.config)
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

/// Builder for [`HookDispatcher`].
#[derive(Default)]
pub struct HookDispatcherBuilder {
    registry: Option<Arc<dyn HookRegistry>>,
    encoder: Option<Arc<dyn PayloadEncoder>>,
    config: DispatcherConfig,
}

impl HookDispatcherBuilder {
    pub fn registry(mut self, registry: Arc<dyn HookRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Install a registry when one was configured, leave the dispatcher
    /// disabled otherwise.
    pub fn maybe_registry(mut self, registry: Option<Arc<dyn HookRegistry>>) -> Self {
        self.registry = registry;
        self
    }

    pub fn encoder(mut self, encoder: Arc<dyn PayloadEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> HookDispatcher {
        HookDispatcher {
            registry: self.registry,
            encoder: self.encoder.unwrap_or_else(|| Arc::new(CanonicalEncoder)),
            config: self.config,
            stats: DispatchStats::default(),
        }
    }
}
