//! Block validation.
//!
//! These checks run before a block is executed. A block that fails them is
//! rejected outright: no hook fires and no state is touched.

use strata_primitives::types::{MAX_CHAIN_ID_LEN, MAX_EXTRA_DATA_LEN, MAX_TX_DATA_LEN};
use strata_primitives::{Block, BlockHeader, ExecError, ExecResult};

use crate::config::ChainConfig;

/// Validate header fields that do not depend on the parent.
///
/// Checks:
/// - `height > 0` (genesis is height 0 and is never validated here)
/// - `chain_id` matches the configured chain
/// - `gas_limit > 0`
/// - `chain_id` and `extra_data` fit their wire limits
pub fn validate_header_fields(header: &BlockHeader, config: &ChainConfig) -> ExecResult<()> {
    if header.height == 0 {
        return Err(ExecError::InvalidBlock("height must be > 0".into()));
    }

    check_wire_len("chain_id", header.chain_id.len(), MAX_CHAIN_ID_LEN)?;
    check_wire_len("extra_data", header.extra_data.len(), MAX_EXTRA_DATA_LEN)?;

    if header.chain_id != config.chain_id_bytes() {
        return Err(ExecError::InvalidBlock(format!(
            "chain id mismatch: expected {}, got {}",
            config.chain_id,
            String::from_utf8_lossy(&header.chain_id)
        )));
    }

    if header.gas_limit == 0 {
        return Err(ExecError::InvalidBlock("gas_limit must be > 0".into()));
    }

    Ok(())
}

/// Validate that `header` extends `parent`.
pub fn validate_linkage(header: &BlockHeader, parent: &BlockHeader) -> ExecResult<()> {
    if header.parent_hash != parent.hash() {
        return Err(ExecError::InvalidBlock("parent hash mismatch".into()));
    }

    if parent.height.checked_add(1) != Some(header.height) {
        return Err(ExecError::InvalidBlock(format!(
            "height {} does not follow parent height {}",
            header.height, parent.height
        )));
    }

    if header.block_time < parent.block_time {
        return Err(ExecError::InvalidBlock(format!(
            "block_time {} precedes parent block_time {}",
            header.block_time, parent.block_time
        )));
    }

    Ok(())
}

/// Validate the block body against its header.
pub fn validate_body(block: &Block, config: &ChainConfig) -> ExecResult<()> {
    if block.tx_count() > config.max_txs_per_block {
        return Err(ExecError::InvalidBlock(format!(
            "too many transactions: {} > {}",
            block.tx_count(),
            config.max_txs_per_block
        )));
    }

    if let Some(index) = block
        .transactions
        .iter()
        .position(|tx| tx.data.len() > MAX_TX_DATA_LEN)
    {
        return Err(ExecError::InvalidBlock(format!(
            "transaction {index} data too large: {} > {MAX_TX_DATA_LEN}",
            block.transactions[index].data.len()
        )));
    }

    if block.compute_tx_root() != block.header.tx_root {
        return Err(ExecError::InvalidBlock("tx_root does not match body".into()));
    }

    Ok(())
}

// Blocks must fit the canonical codec's wire limits.
fn check_wire_len(field: &str, len: usize, max: usize) -> ExecResult<()> {
    if len > max {
        return Err(ExecError::InvalidBlock(format!(
            "{field} too large: {len} > {max}"
        )));
    }
    Ok(())
}

/// Validate an entire block before processing.
///
/// Runs, in order: header fields, linkage (when `parent` is given), body.
pub fn validate_block(
    block: &Block,
    parent: Option<&BlockHeader>,
    config: &ChainConfig,
) -> ExecResult<()> {
    validate_header_fields(&block.header, config)?;
    if let Some(parent) = parent {
        validate_linkage(&block.header, parent)?;
    }
    validate_body(block, config)?;
    Ok(())
}
