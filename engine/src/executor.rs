//! Block processor: executes a block on top of its parent state and fires
//! the processing hooks.
//!
//! Lifecycle for one block:
//!
//! 1. Validate the block (no hooks fire for an invalid block)
//! 2. `PreProcessBlock`
//! 3. For each transaction:
//!    a. `PreProcessTransaction`
//!    b. Execute against the working ledger, enforce the block gas limit
//!    c. On failure: `BlockProcessingError`, then abort
//!    d. On success: `PostProcessTransaction` with the receipt
//! 4. `PostProcessBlock`
//!
//! **Atomicity:** the working ledger is a copy of the parent state. A failed
//! transaction aborts the whole block and the copy is dropped; the parent
//! state is never modified.

use std::sync::Arc;

use strata_hooks::{BlockPayload, HookDispatcher};
use strata_primitives::{
    receipt::flatten_logs, types::short_hex, Block, BlockHeader, ExecError, ExecResult, Log,
    Receipt, Transaction,
};

use crate::config::ChainConfig;
use crate::transaction::{Ledger, TransferExecutor, TxContext, TxOutcome};
use crate::validation::validate_block;

/// Everything a successfully processed block produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedBlock {
    pub receipts: Vec<Receipt>,
    /// All logs of the block, in emission order.
    pub logs: Vec<Log>,
    pub gas_used: u64,
    /// State after the block.
    pub ledger: Ledger,
}

/// Executes blocks and notifies plugins along the way.
#[derive(Debug, Clone)]
pub struct BlockProcessor {
    config: ChainConfig,
    hooks: Arc<HookDispatcher>,
    executor: TransferExecutor,
}

impl BlockProcessor {
    pub fn new(config: ChainConfig, hooks: Arc<HookDispatcher>) -> Self {
        Self {
            config,
            hooks,
            executor: TransferExecutor,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn hooks(&self) -> &Arc<HookDispatcher> {
        &self.hooks
    }

    /// Process `block` against `state`, the ledger after its parent.
    pub fn process(
        &self,
        block: &Block,
        parent: Option<&BlockHeader>,
        state: &Ledger,
    ) -> ExecResult<ProcessedBlock> {
        validate_block(block, parent, &self.config)?;

        self.hooks.pre_process_block(block);

        let mut ledger = state.clone();
        let mut receipts: Vec<Receipt> = Vec::with_capacity(block.tx_count());
        let mut cumulative_gas: u64 = 0;
        let mut next_log_index: u32 = 0;
        let payload = BlockPayload::new(block);

        for (idx, tx) in block.transactions.iter().enumerate() {
            let index = idx as i64;
            self.hooks.pre_process_transaction_with(tx, &payload, index);

            let ctx = TxContext {
                block_height: block.height(),
                tx_index: idx as u32,
                next_log_index,
            };
            let outcome = self
                .executor
                .execute(&mut ledger, tx, ctx)
                .and_then(|outcome| charge_block_gas(block, cumulative_gas, outcome));

            let (outcome, cumulative) = match outcome {
                Ok(ok) => ok,
                Err(err) => return Err(self.abort(block, tx, idx, err)),
            };
            cumulative_gas = cumulative;
            next_log_index = next_log_index.saturating_add(outcome.logs.len() as u32);

            let receipt = Receipt {
                tx_hash: tx.hash(),
                tx_index: idx as u32,
                success: true,
                gas_used: outcome.gas_used,
                cumulative_gas_used: cumulative_gas,
                logs: outcome.logs,
            };
            self.hooks.post_process_transaction(tx, block, index, &receipt);
            receipts.push(receipt);
        }

        self.hooks.post_process_block(block);

        tracing::debug!(
            height = block.height(),
            hash = %short_hex(&block.hash()),
            txs = receipts.len(),
            gas_used = cumulative_gas,
            "block processed"
        );

        Ok(ProcessedBlock {
            logs: flatten_logs(&receipts),
            receipts,
            gas_used: cumulative_gas,
            ledger,
        })
    }

    fn abort(&self, block: &Block, tx: &Transaction, idx: usize, err: ExecError) -> ExecError {
        tracing::warn!(
            height = block.height(),
            tx_index = idx,
            error = %err,
            "transaction failed, abandoning block"
        );
        self.hooks.block_processing_error(tx, block, &err);
        err
    }
}

/// Add a transaction's gas to the block total, failing the transaction when
/// the block gas limit would be exceeded.
fn charge_block_gas(
    block: &Block,
    cumulative: u64,
    outcome: TxOutcome,
) -> ExecResult<(TxOutcome, u64)> {
    let total = cumulative
        .checked_add(outcome.gas_used)
        .ok_or(ExecError::Overflow("block gas"))?;
    if total > block.header.gas_limit {
        return Err(ExecError::OutOfGas {
            limit: block.header.gas_limit,
            used: total,
        });
    }
    Ok((outcome, total))
}
