//! Core type aliases and limits shared by every Strata crate.

/// 32-byte hash used for block hashes, transaction hashes and roots.
pub type Hash = [u8; 32];

/// 32-byte address identifying accounts and block proposers.
pub type Address = [u8; 32];

/// Block height (monotonically increasing along a chain).
pub type BlockHeight = u64;

/// Maximum length of a block header `chain_id`.
pub const MAX_CHAIN_ID_LEN: usize = 64;

/// Maximum length of a block header `extra_data` field.
pub const MAX_EXTRA_DATA_LEN: usize = 32;

/// Maximum length of a transaction `data` payload.
pub const MAX_TX_DATA_LEN: usize = 128 * 1024; // 128 KiB

/// A zero-valued hash (32 zero bytes).
pub const ZERO_HASH: Hash = [0u8; 32];

/// A zero-valued address (32 zero bytes).
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Convert a `Hash` to a hex string for display purposes.
pub fn hash_to_hex(hash: &Hash) -> alloc::string::String {
    let mut s = alloc::string::String::with_capacity(66);
    s.push_str("0x");
    for byte in hash {
        use core::fmt::Write;
        let _ = write!(s, "{:02x}", byte);
    }
    s
}

/// Short form of a hash for log lines: `0x` plus the first four bytes.
pub fn short_hex(hash: &Hash) -> alloc::string::String {
    let mut s = hash_to_hex(hash);
    s.truncate(10);
    s
}
