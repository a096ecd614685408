//! Encoded-payload seam.
//!
//! Hooks that receive wire-form payloads get bytes from a [`PayloadEncoder`].
//! The node uses [`CanonicalEncoder`]; tests substitute counting or failing
//! encoders.

use strata_primitives::{codec, Block, CodecError, Transaction};

/// Deterministic serialization of the values handed to encoded-payload hooks.
pub trait PayloadEncoder: Send + Sync {
    fn encode_block(&self, block: &Block) -> Result<Vec<u8>, CodecError>;

    /// Transaction encodings are versioned so plugins can detect the format.
    fn encode_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, CodecError>;
}

/// The canonical Strata wire format from `strata_primitives::codec`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalEncoder;

impl PayloadEncoder for CanonicalEncoder {
    fn encode_block(&self, block: &Block) -> Result<Vec<u8>, CodecError> {
        codec::encode_block(block)
    }

    fn encode_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, CodecError> {
        codec::encode_transaction(tx)
    }
}
