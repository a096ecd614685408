//! Callback shapes.
//!
//! A plugin callback is stored as one variant of [`HookCallback`]; the tag
//! ([`CallbackShape`]) is what the registry filters on. Adding a shape means
//! adding a variant here, and every `match` over it fails to compile until
//! the new shape is handled.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use strata_primitives::{Block, Hash, Log, Receipt, Transaction};

/// `(encoded_block)`
pub type EncodedBlockFn = dyn Fn(&[u8]) + Send + Sync;

/// `(encoded_tx, encoded_block, tx_index)`
pub type EncodedTransactionFn = dyn Fn(&[u8], &[u8], i64) + Send + Sync;

/// `(tx, block, processing_error)`
pub type ProcessingErrorFn = dyn Fn(&Transaction, &Block, &(dyn Error + 'static)) + Send + Sync;

/// `(tx, block, tx_index, receipt)`
pub type TransactionReceiptFn = dyn Fn(&Transaction, &Block, i64, &Receipt) + Send + Sync;

/// `(block)`
pub type BlockFn = dyn Fn(&Block) + Send + Sync;

/// `(block, block_hash, logs)`
pub type ChainEventFn = dyn Fn(&Block, Hash, &[Log]) + Send + Sync;

/// `(common_ancestor, old_chain, new_chain)`
pub type ReorgFn = dyn Fn(&Block, &[Block], &[Block]) + Send + Sync;

/// Parameter shape of a callback, without the callable itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackShape {
    EncodedBlock,
    EncodedTransaction,
    ProcessingError,
    TransactionReceipt,
    Block,
    ChainEvent,
    Reorg,
}

impl fmt::Display for CallbackShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = match self {
            Self::EncodedBlock => "fn(&[u8])",
            Self::EncodedTransaction => "fn(&[u8], &[u8], i64)",
            Self::ProcessingError => "fn(&Transaction, &Block, &dyn Error)",
            Self::TransactionReceipt => "fn(&Transaction, &Block, i64, &Receipt)",
            Self::Block => "fn(&Block)",
            Self::ChainEvent => "fn(&Block, Hash, &[Log])",
            Self::Reorg => "fn(&Block, &[Block], &[Block])",
        };
        f.write_str(signature)
    }
}

/// A registered callback tagged with its shape.
///
/// Cloning is cheap: the callable is reference-counted.
#[derive(Clone)]
pub enum HookCallback {
    EncodedBlock(Arc<EncodedBlockFn>),
    EncodedTransaction(Arc<EncodedTransactionFn>),
    ProcessingError(Arc<ProcessingErrorFn>),
    TransactionReceipt(Arc<TransactionReceiptFn>),
    Block(Arc<BlockFn>),
    ChainEvent(Arc<ChainEventFn>),
    Reorg(Arc<ReorgFn>),
}

impl HookCallback {
    pub fn encoded_block<F>(f: F) -> Self
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        Self::EncodedBlock(Arc::new(f))
    }

    pub fn encoded_transaction<F>(f: F) -> Self
    where
        F: Fn(&[u8], &[u8], i64) + Send + Sync + 'static,
    {
        Self::EncodedTransaction(Arc::new(f))
    }

    pub fn processing_error<F>(f: F) -> Self
    where
        F: Fn(&Transaction, &Block, &(dyn Error + 'static)) + Send + Sync + 'static,
    {
        Self::ProcessingError(Arc::new(f))
    }

    pub fn transaction_receipt<F>(f: F) -> Self
    where
        F: Fn(&Transaction, &Block, i64, &Receipt) + Send + Sync + 'static,
    {
        Self::TransactionReceipt(Arc::new(f))
    }

    pub fn block<F>(f: F) -> Self
    where
        F: Fn(&Block) + Send + Sync + 'static,
    {
        Self::Block(Arc::new(f))
    }

    pub fn chain_event<F>(f: F) -> Self
    where
        F: Fn(&Block, Hash, &[Log]) + Send + Sync + 'static,
    {
        Self::ChainEvent(Arc::new(f))
    }

    pub fn reorg<F>(f: F) -> Self
    where
        F: Fn(&Block, &[Block], &[Block]) + Send + Sync + 'static,
    {
        Self::Reorg(Arc::new(f))
    }

    /// The shape tag of this callback.
    pub fn shape(&self) -> CallbackShape {
        match self {
            Self::EncodedBlock(_) => CallbackShape::EncodedBlock,
            Self::EncodedTransaction(_) => CallbackShape::EncodedTransaction,
            Self::ProcessingError(_) => CallbackShape::ProcessingError,
            Self::TransactionReceipt(_) => CallbackShape::TransactionReceipt,
            Self::Block(_) => CallbackShape::Block,
            Self::ChainEvent(_) => CallbackShape::ChainEvent,
            Self::Reorg(_) => CallbackShape::Reorg,
        }
    }
}

impl fmt::Debug for HookCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HookCallback").field(&self.shape()).finish()
    }
}
