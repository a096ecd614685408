//! `strata-primitives` — foundational types for Strata block processing.
//!
//! This crate provides the domain model (blocks, transactions, receipts,
//! logs), the canonical codec used for encoded hook payloads, hashing and
//! signature helpers, the gas schedule, and the shared error types.
//!
//! Supports `#![no_std]` (use `default-features = false`).

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod types;
pub mod error;
pub mod block;
pub mod receipt;
pub mod gas;
pub mod crypto;
pub mod codec;

// Re-export commonly used types at the crate root for convenience.
pub use types::{Address, BlockHeight, Hash, ZERO_ADDRESS, ZERO_HASH};
pub use error::{CodecError, ExecError, ExecResult};
pub use block::{Block, BlockHeader, Transaction, TxType};
pub use receipt::{Log, Receipt};
