//! Block and transaction types.
//!
//! Blocks are immutable once built: the pipeline, the dispatcher and every
//! plugin only ever see shared references to them.

use alloc::vec::Vec;
use crate::crypto::{hash_blake3, hash_sha256};
use crate::types::{Address, BlockHeight, Hash};

/// Block header.
///
/// The block hash is the SHA-256 of the header preimage (see [`BlockHeader::hash`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block height; genesis is height 0.
    pub height: BlockHeight,
    /// Hash of the parent block's header.
    pub parent_hash: Hash,
    /// State commitment after executing this block.
    pub state_root: Hash,
    /// Commitment over the ordered transaction hashes.
    pub tx_root: Hash,
    /// Address of the block proposer.
    pub proposer_id: Address,
    /// Logical block time from consensus.
    pub block_time: u64,
    /// Maximum gas all transactions of this block may consume together.
    pub gas_limit: u64,
    /// Chain identifier (e.g., "strata-testnet-1").
    pub chain_id: Vec<u8>,
    /// Free-form proposer data, at most `MAX_EXTRA_DATA_LEN` bytes on the wire.
    pub extra_data: Vec<u8>,
}

impl BlockHeader {
    /// Compute the header hash.
    ///
    /// Variable-length fields are prefixed with their `u64` LE length so the
    /// preimage is unambiguous. Unlike the wire codec this never fails, which
    /// lets oversize headers still be identified in logs.
    pub fn hash(&self) -> Hash {
        let mut preimage = Vec::with_capacity(
            8 * 5 + 32 * 4 + self.chain_id.len() + self.extra_data.len(),
        );
        preimage.extend_from_slice(&self.height.to_le_bytes());
        preimage.extend_from_slice(&self.parent_hash);
        preimage.extend_from_slice(&self.state_root);
        preimage.extend_from_slice(&self.tx_root);
        preimage.extend_from_slice(&self.proposer_id);
        preimage.extend_from_slice(&self.block_time.to_le_bytes());
        preimage.extend_from_slice(&self.gas_limit.to_le_bytes());
        preimage.extend_from_slice(&(self.chain_id.len() as u64).to_le_bytes());
        preimage.extend_from_slice(&self.chain_id);
        preimage.extend_from_slice(&(self.extra_data.len() as u64).to_le_bytes());
        preimage.extend_from_slice(&self.extra_data);
        hash_sha256(&preimage)
    }
}

/// Full block with ordered transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block header containing metadata.
    pub header: BlockHeader,
    /// Ordered list of transactions in this block.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Hash of this block (the header hash).
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Height of this block.
    pub fn height(&self) -> BlockHeight {
        self.header.height
    }

    /// Hash of the parent block.
    pub fn parent_hash(&self) -> Hash {
        self.header.parent_hash
    }

    /// Returns the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Returns true if this block has no transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Recompute the transaction root from the block body.
    pub fn compute_tx_root(&self) -> Hash {
        compute_tx_root(&self.transactions)
    }
}

/// BLAKE3 over the concatenated transaction hashes, in block order.
///
/// An empty body commits to the hash of the empty string.
pub fn compute_tx_root(transactions: &[Transaction]) -> Hash {
    let mut buf = Vec::with_capacity(transactions.len() * 32);
    for tx in transactions {
        buf.extend_from_slice(&tx.hash());
    }
    hash_blake3(&buf)
}

/// Transaction type tag, written as the second byte of the encoded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TxType {
    /// Value transfer between two accounts.
    Transfer = 0x01,
    /// Data-carrying transaction; `value` may be zero and `to` absent.
    Data = 0x02,
}

impl TxType {
    /// Convert from the wire tag.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(Self::Transfer),
            0x02 => Some(Self::Data),
            _ => None,
        }
    }
}

/// A signed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Transaction type.
    pub tx_type: TxType,
    /// Sequence number for replay protection.
    pub nonce: u64,
    /// Sender address (the sender's Ed25519 public key).
    pub sender: Address,
    /// Recipient, absent for pure data transactions.
    pub to: Option<Address>,
    /// Amount moved from sender to recipient.
    pub value: u64,
    /// Maximum gas this transaction may consume.
    pub gas_limit: u64,
    /// Opaque payload.
    pub data: Vec<u8>,
    /// Ed25519 public key of the sender.
    pub public_key: [u8; 32],
    /// Ed25519 signature over [`Transaction::signing_payload`].
    pub signature: [u8; 64],
}

impl Transaction {
    /// The bytes covered by the signature:
    /// `tx_type || nonce || sender || to_flag [|| to] || value || gas_limit || data_len || data`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + 8 + 32 + 33 + 8 + 8 + 8 + self.data.len());
        buf.push(self.tx_type as u8);
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&self.sender);
        match &self.to {
            None => buf.push(0),
            Some(to) => {
                buf.push(1);
                buf.extend_from_slice(to);
            }
        }
        buf.extend_from_slice(&self.value.to_le_bytes());
        buf.extend_from_slice(&self.gas_limit.to_le_bytes());
        buf.extend_from_slice(&(self.data.len() as u64).to_le_bytes());
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Transaction hash: BLAKE3 over the signing payload and the signature.
    pub fn hash(&self) -> Hash {
        let mut buf = self.signing_payload();
        buf.extend_from_slice(&self.signature);
        hash_blake3(&buf)
    }

    /// Returns the length of the data payload in bytes.
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}
