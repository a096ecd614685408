//! Gas schedule for transaction execution.

use crate::block::Transaction;

// ── Gas cost constants ──

/// Flat cost charged to every transaction.
pub const G_TX_BASE: u64 = 21_000;

/// Cost of verifying the transaction signature.
pub const G_VERIFY_ED25519: u64 = 2_000;

/// Per-byte cost of the transaction data payload.
pub const G_PER_DATA_BYTE: u64 = 16;

/// Cost of emitting one log.
pub const G_LOG: u64 = 375;

/// Gas a transaction pays before any state is touched.
pub fn intrinsic_gas(tx: &Transaction) -> u64 {
    let data_cost = (tx.data.len() as u64).saturating_mul(G_PER_DATA_BYTE);
    G_TX_BASE
        .saturating_add(G_VERIFY_ED25519)
        .saturating_add(data_cost)
}
