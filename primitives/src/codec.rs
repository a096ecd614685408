//! Canonical, deterministic serialization for blocks and transactions.
//!
//! This is the stable wire form handed to plugins that receive encoded
//! payloads. All numeric values are little-endian.
//!
//! Encoding format:
//! - Fixed-size fields (Hash, Address, u64, u8) are written directly
//! - Variable-length fields (Vec<u8>) are length-prefixed (u32 LE)
//! - Repeated fields are count-prefixed (u32 LE) then concatenated
//! - Optional Address: 1-byte flag (0=None, 1=Some) followed by 32 bytes if Some
//!
//! Transactions are self-describing: the first byte is
//! [`TX_ENCODING_VERSION`], the second the [`TxType`] tag. Blocks start with
//! [`BLOCK_ENCODING_VERSION`] and embed each transaction's full encoding as a
//! length-prefixed field.

use alloc::vec::Vec;
use crate::block::{Block, BlockHeader, Transaction, TxType};
use crate::error::CodecError;
use crate::types::{Address, Hash, MAX_CHAIN_ID_LEN, MAX_EXTRA_DATA_LEN, MAX_TX_DATA_LEN};

/// Version byte leading every encoded transaction.
pub const TX_ENCODING_VERSION: u8 = 1;

/// Version byte leading every encoded block.
pub const BLOCK_ENCODING_VERSION: u8 = 1;

/// A cursor for reading bytes during decoding.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn read_hash(&mut self) -> Result<Hash, CodecError> {
        self.read_array::<32>()
    }

    fn read_optional_address(&mut self) -> Result<Option<Address>, CodecError> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(self.read_array::<32>()?)),
            flag => Err(CodecError::InvalidFlag(flag)),
        }
    }

    fn read_var_bytes(&mut self, field: &'static str, max: usize) -> Result<Vec<u8>, CodecError> {
        let len = self.read_u32()? as usize;
        if len > max {
            return Err(CodecError::FieldTooLarge { field, len, max });
        }
        Ok(self.read_bytes(len)?.to_vec())
    }

    fn read_version(&mut self, expected: u8) -> Result<(), CodecError> {
        let got = self.read_u8()?;
        if got != expected {
            return Err(CodecError::UnsupportedVersion { expected, got });
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

// ── Encoding helpers ──

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_hash(buf: &mut Vec<u8>, h: &Hash) {
    buf.extend_from_slice(h);
}

fn write_optional_address(buf: &mut Vec<u8>, a: &Option<Address>) {
    match a {
        None => buf.push(0),
        Some(addr) => {
            buf.push(1);
            buf.extend_from_slice(addr);
        }
    }
}

fn write_len(buf: &mut Vec<u8>, field: &'static str, len: usize) -> Result<(), CodecError> {
    let len32 = u32::try_from(len).map_err(|_| CodecError::FieldTooLarge {
        field,
        len,
        max: u32::MAX as usize,
    })?;
    write_u32(buf, len32);
    Ok(())
}

fn write_var_bytes(
    buf: &mut Vec<u8>,
    field: &'static str,
    data: &[u8],
    max: usize,
) -> Result<(), CodecError> {
    if data.len() > max {
        return Err(CodecError::FieldTooLarge {
            field,
            len: data.len(),
            max,
        });
    }
    write_len(buf, field, data.len())?;
    buf.extend_from_slice(data);
    Ok(())
}

// ── Transaction encoding ──

/// Encode a `Transaction` to its versioned, self-describing wire form.
pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(1 + 1 + 8 + 32 + 33 + 8 + 8 + 4 + tx.data.len() + 32 + 64);
    encode_transaction_into(&mut buf, tx)?;
    Ok(buf)
}

fn encode_transaction_into(buf: &mut Vec<u8>, tx: &Transaction) -> Result<(), CodecError> {
    buf.push(TX_ENCODING_VERSION);
    buf.push(tx.tx_type as u8);
    write_u64(buf, tx.nonce);
    buf.extend_from_slice(&tx.sender);
    write_optional_address(buf, &tx.to);
    write_u64(buf, tx.value);
    write_u64(buf, tx.gas_limit);
    write_var_bytes(buf, "data", &tx.data, MAX_TX_DATA_LEN)?;
    buf.extend_from_slice(&tx.public_key);
    buf.extend_from_slice(&tx.signature);
    Ok(())
}

/// Decode a `Transaction` from bytes produced by [`encode_transaction`].
pub fn decode_transaction(data: &[u8]) -> Result<Transaction, CodecError> {
    let mut r = Reader::new(data);
    let tx = read_transaction(&mut r)?;
    r.finish()?;
    Ok(tx)
}

fn read_transaction(r: &mut Reader<'_>) -> Result<Transaction, CodecError> {
    r.read_version(TX_ENCODING_VERSION)?;
    let tag = r.read_u8()?;
    let tx_type = TxType::from_u8(tag).ok_or(CodecError::UnknownTxType(tag))?;

    Ok(Transaction {
        tx_type,
        nonce: r.read_u64()?,
        sender: r.read_array::<32>()?,
        to: r.read_optional_address()?,
        value: r.read_u64()?,
        gas_limit: r.read_u64()?,
        data: r.read_var_bytes("data", MAX_TX_DATA_LEN)?,
        public_key: r.read_array::<32>()?,
        signature: r.read_array::<64>()?,
    })
}

// ── Header encoding ──

/// Encode a `BlockHeader` (no version byte; headers only travel inside blocks).
pub fn encode_header(header: &BlockHeader) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(8 * 3 + 32 * 4 + 8 + header.chain_id.len() + header.extra_data.len());
    encode_header_into(&mut buf, header)?;
    Ok(buf)
}

fn encode_header_into(buf: &mut Vec<u8>, header: &BlockHeader) -> Result<(), CodecError> {
    write_u64(buf, header.height);
    write_hash(buf, &header.parent_hash);
    write_hash(buf, &header.state_root);
    write_hash(buf, &header.tx_root);
    buf.extend_from_slice(&header.proposer_id);
    write_u64(buf, header.block_time);
    write_u64(buf, header.gas_limit);
    write_var_bytes(buf, "chain_id", &header.chain_id, MAX_CHAIN_ID_LEN)?;
    write_var_bytes(buf, "extra_data", &header.extra_data, MAX_EXTRA_DATA_LEN)?;
    Ok(())
}

fn read_header(r: &mut Reader<'_>) -> Result<BlockHeader, CodecError> {
    Ok(BlockHeader {
        height: r.read_u64()?,
        parent_hash: r.read_hash()?,
        state_root: r.read_hash()?,
        tx_root: r.read_hash()?,
        proposer_id: r.read_array::<32>()?,
        block_time: r.read_u64()?,
        gas_limit: r.read_u64()?,
        chain_id: r.read_var_bytes("chain_id", MAX_CHAIN_ID_LEN)?,
        extra_data: r.read_var_bytes("extra_data", MAX_EXTRA_DATA_LEN)?,
    })
}

// ── Block encoding ──

/// Encode a `Block` to deterministic bytes.
///
/// Fails if any header or transaction field exceeds its wire limit; nothing
/// is returned in that case, not even a partial encoding.
pub fn encode_block(block: &Block) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(256 + block.transactions.len() * 256);

    buf.push(BLOCK_ENCODING_VERSION);
    encode_header_into(&mut buf, &block.header)?;

    write_len(&mut buf, "transactions", block.transactions.len())?;
    let mut tx_buf = Vec::new();
    for tx in &block.transactions {
        tx_buf.clear();
        encode_transaction_into(&mut tx_buf, tx)?;
        write_len(&mut buf, "transaction", tx_buf.len())?;
        buf.extend_from_slice(&tx_buf);
    }

    Ok(buf)
}

/// Decode a `Block` from bytes produced by [`encode_block`].
pub fn decode_block(data: &[u8]) -> Result<Block, CodecError> {
    let mut r = Reader::new(data);
    r.read_version(BLOCK_ENCODING_VERSION)?;
    let header = read_header(&mut r)?;

    let tx_count = r.read_u32()? as usize;
    // Each transaction needs at least its 4-byte length prefix.
    let mut transactions = Vec::with_capacity(tx_count.min(r.remaining() / 4));
    for _ in 0..tx_count {
        let len = r.read_u32()? as usize;
        let raw = r.read_bytes(len)?;
        transactions.push(decode_transaction(raw)?);
    }
    r.finish()?;

    Ok(Block {
        header,
        transactions,
    })
}
