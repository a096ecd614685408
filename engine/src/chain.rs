//! Block index and fork choice.
//!
//! [`Blockchain`] keeps every imported block, rooted at genesis, and tracks
//! the canonical head by longest chain. Ties keep the current head. Each
//! import ends in exactly one of:
//!
//! - the block extends the head: `NewHead`
//! - the block lands on a branch no longer than the head: `NewSideBlock`
//! - the block makes its branch the longest: `Reorg`, then `NewHead`
//!
//! Reorg segments run newest first and exclude the common ancestor.

use std::collections::HashMap;
use std::sync::Arc;

use strata_hooks::HookDispatcher;
use strata_primitives::{types::short_hex, Block, BlockHeight, ExecError, Hash, Log, Receipt};

use crate::config::ChainConfig;
use crate::executor::{BlockProcessor, ProcessedBlock};
use crate::transaction::Ledger;

/// Reasons a block cannot be imported.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("block {hash} is already known")]
    Duplicate { hash: String },

    #[error("unknown parent {parent} for block at height {height}")]
    UnknownParent { parent: String, height: BlockHeight },

    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    #[error("block rejected: {0}")]
    Rejected(#[from] ExecError),
}

/// How an imported block changed the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The block extended the canonical head.
    NewHead,
    /// The block was stored on a side branch.
    SideBlock,
    /// The block's branch replaced the canonical chain.
    Reorg {
        common_ancestor: Hash,
        dropped: usize,
        adopted: usize,
    },
}

#[derive(Debug, Clone)]
struct StoredBlock {
    block: Block,
    receipts: Vec<Receipt>,
    logs: Vec<Log>,
    ledger: Ledger,
}

/// Genesis-rooted block index with longest-chain fork choice.
#[derive(Debug)]
pub struct Blockchain {
    processor: BlockProcessor,
    blocks: HashMap<Hash, StoredBlock>,
    genesis: Hash,
    head: Hash,
}

impl Blockchain {
    /// Start a chain at `genesis` with `state` as its post-genesis ledger.
    ///
    /// Genesis is trusted: it is not executed and fires no hooks.
    pub fn new(
        config: ChainConfig,
        genesis: Block,
        state: Ledger,
        hooks: Arc<HookDispatcher>,
    ) -> Result<Self, ChainError> {
        if genesis.height() != 0 {
            return Err(ChainError::InvalidGenesis(format!(
                "height must be 0, got {}",
                genesis.height()
            )));
        }
        if genesis.header.chain_id != config.chain_id_bytes() {
            return Err(ChainError::InvalidGenesis("chain id mismatch".into()));
        }

        let hash = genesis.hash();
        let mut blocks = HashMap::new();
        blocks.insert(
            hash,
            StoredBlock {
                block: genesis,
                receipts: Vec::new(),
                logs: Vec::new(),
                ledger: state,
            },
        );

        tracing::info!(genesis = %short_hex(&hash), chain_id = %config.chain_id, "chain initialized");

        Ok(Self {
            processor: BlockProcessor::new(config, hooks),
            blocks,
            genesis: hash,
            head: hash,
        })
    }

    /// Execute and import `block`, then run fork choice.
    pub fn insert(&mut self, block: Block) -> Result<ImportOutcome, ChainError> {
        let hash = block.hash();
        if self.blocks.contains_key(&hash) {
            return Err(ChainError::Duplicate {
                hash: short_hex(&hash),
            });
        }

        let parent = self
            .blocks
            .get(&block.parent_hash())
            .ok_or_else(|| ChainError::UnknownParent {
                parent: short_hex(&block.parent_hash()),
                height: block.height(),
            })?;

        let ProcessedBlock {
            receipts,
            logs,
            ledger,
            ..
        } = self
            .processor
            .process(&block, Some(&parent.block.header), &parent.ledger)?;

        let extends_head = block.parent_hash() == self.head;
        let longer = block.height() > self.height();

        self.blocks.insert(
            hash,
            StoredBlock {
                block,
                receipts,
                logs,
                ledger,
            },
        );

        if extends_head {
            self.set_head(hash);
            return Ok(ImportOutcome::NewHead);
        }

        if !longer {
            self.announce_side_block(hash);
            return Ok(ImportOutcome::SideBlock);
        }

        Ok(self.reorg_to(hash))
    }

    fn announce_side_block(&self, hash: Hash) {
        if let Some(stored) = self.blocks.get(&hash) {
            tracing::debug!(
                height = stored.block.height(),
                hash = %short_hex(&hash),
                "side block imported"
            );
            self.hooks().new_side_block(&stored.block, hash, &stored.logs);
        }
    }

    fn reorg_to(&mut self, new_head: Hash) -> ImportOutcome {
        let old_head = self.head;
        // Every stored block descends from genesis, so an ancestor exists.
        let Some(ancestor) = self.common_ancestor(old_head, new_head) else {
            tracing::error!(new_head = %short_hex(&new_head), "no common ancestor with head");
            self.announce_side_block(new_head);
            return ImportOutcome::SideBlock;
        };

        let old_chain = self.segment(old_head, ancestor);
        let new_chain = self.segment(new_head, ancestor);

        tracing::warn!(
            common = %short_hex(&ancestor),
            old_head = %short_hex(&old_head),
            new_head = %short_hex(&new_head),
            dropped = old_chain.len(),
            adopted = new_chain.len(),
            "chain reorganization"
        );

        if let Some(common) = self.blocks.get(&ancestor) {
            self.hooks().reorg(&common.block, &old_chain, &new_chain);
        }
        self.set_head(new_head);

        ImportOutcome::Reorg {
            common_ancestor: ancestor,
            dropped: old_chain.len(),
            adopted: new_chain.len(),
        }
    }

    fn set_head(&mut self, hash: Hash) {
        self.head = hash;
        if let Some(stored) = self.blocks.get(&hash) {
            tracing::info!(
                height = stored.block.height(),
                hash = %short_hex(&hash),
                txs = stored.block.tx_count(),
                "new head"
            );
            self.hooks().new_head(&stored.block, hash, &stored.logs);
        }
    }

    /// Deepest block shared by the branches ending at `a` and `b`.
    fn common_ancestor(&self, a: Hash, b: Hash) -> Option<Hash> {
        let (mut a, mut b) = (a, b);
        while a != b {
            let block_a = &self.blocks.get(&a)?.block;
            let block_b = &self.blocks.get(&b)?.block;
            if block_a.height() >= block_b.height() {
                a = block_a.parent_hash();
            } else {
                b = block_b.parent_hash();
            }
        }
        Some(a)
    }

    /// Blocks from `tip` back to, but excluding, `ancestor`.
    fn segment(&self, tip: Hash, ancestor: Hash) -> Vec<Block> {
        let mut out = Vec::new();
        let mut cursor = tip;
        while cursor != ancestor {
            let Some(stored) = self.blocks.get(&cursor) else {
                break;
            };
            out.push(stored.block.clone());
            cursor = stored.block.parent_hash();
        }
        out
    }

    fn hooks(&self) -> &HookDispatcher {
        self.processor.hooks()
    }

    // ── Queries ──

    pub fn config(&self) -> &ChainConfig {
        self.processor.config()
    }

    pub fn genesis_hash(&self) -> Hash {
        self.genesis
    }

    pub fn head_hash(&self) -> Hash {
        self.head
    }

    /// The canonical head block.
    pub fn head(&self) -> Option<&Block> {
        self.get(&self.head)
    }

    /// Height of the canonical head.
    pub fn height(&self) -> BlockHeight {
        self.head().map(Block::height).unwrap_or(0)
    }

    pub fn get(&self, hash: &Hash) -> Option<&Block> {
        self.blocks.get(hash).map(|stored| &stored.block)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn receipts(&self, hash: &Hash) -> Option<&[Receipt]> {
        self.blocks.get(hash).map(|stored| stored.receipts.as_slice())
    }

    /// Ledger after the block `hash`.
    pub fn state_at(&self, hash: &Hash) -> Option<&Ledger> {
        self.blocks.get(hash).map(|stored| &stored.ledger)
    }

    /// Ledger after the canonical head.
    pub fn head_state(&self) -> Option<&Ledger> {
        self.state_at(&self.head)
    }

    /// Whether `hash` lies on the canonical chain.
    pub fn is_canonical(&self, hash: &Hash) -> bool {
        self.canonical_hashes().contains(hash)
    }

    /// Canonical chain from head back to genesis.
    pub fn canonical_hashes(&self) -> Vec<Hash> {
        let mut out = Vec::new();
        let mut cursor = self.head;
        while let Some(stored) = self.blocks.get(&cursor) {
            out.push(cursor);
            if cursor == self.genesis {
                break;
            }
            cursor = stored.block.parent_hash();
        }
        out
    }

    /// Number of stored blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
