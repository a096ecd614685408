//! Transaction receipts and the logs they carry.

use alloc::vec::Vec;
use crate::types::{Address, BlockHeight, Hash};

/// Per-transaction receipt produced by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the transaction this receipt belongs to.
    pub tx_hash: Hash,
    /// Index of this transaction in the block.
    pub tx_index: u32,
    /// Whether the transaction executed successfully.
    pub success: bool,
    /// Gas consumed by this transaction.
    pub gas_used: u64,
    /// Gas consumed by this and all earlier transactions of the block.
    pub cumulative_gas_used: u64,
    /// Logs emitted by this transaction.
    pub logs: Vec<Log>,
}

/// A log entry emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    /// Account that emitted the log.
    pub address: Address,
    /// Indexed topics; the first topic names the log kind.
    pub topics: Vec<Hash>,
    /// Unindexed payload.
    pub data: Vec<u8>,
    /// Height of the block containing the transaction.
    pub block_height: BlockHeight,
    /// Index of the emitting transaction in its block.
    pub tx_index: u32,
    /// Index of this log within the block.
    pub log_index: u32,
}

/// Collect the logs of several receipts in block order.
pub fn flatten_logs(receipts: &[Receipt]) -> Vec<Log> {
    receipts.iter().flat_map(|r| r.logs.iter().cloned()).collect()
}
