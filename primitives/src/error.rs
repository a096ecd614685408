//! Error types for the Strata primitives.
//!
//! `CodecError` covers the canonical wire format; `ExecError` covers
//! transaction and block execution failures reported by the engine.

use alloc::string::String;
use core::fmt;

/// Canonical codec failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A variable-length field exceeds its wire limit.
    FieldTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Input ended before the value was fully decoded.
    UnexpectedEof,

    /// Leading version byte is not one this codec understands.
    UnsupportedVersion { expected: u8, got: u8 },

    /// Transaction type tag is not a known `TxType`.
    UnknownTxType(u8),

    /// A flag byte held something other than 0 or 1.
    InvalidFlag(u8),

    /// Bytes remained after a complete value was decoded.
    TrailingBytes(usize),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldTooLarge { field, len, max } => {
                write!(f, "field `{}` too large: {} bytes (max {})", field, len, max)
            }
            Self::UnexpectedEof => write!(f, "unexpected end of data"),
            Self::UnsupportedVersion { expected, got } => {
                write!(f, "unsupported encoding version: expected {}, got {}", expected, got)
            }
            Self::UnknownTxType(tag) => write!(f, "unknown transaction type: 0x{:02x}", tag),
            Self::InvalidFlag(b) => write!(f, "invalid flag byte: {}", b),
            Self::TrailingBytes(n) => write!(f, "{} trailing bytes after value", n),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

/// Execution error raised while processing a transaction or block.
///
/// Any `ExecError` aborts the block being processed; the engine reports
/// it to the `BlockProcessingError` hook before returning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// Block failed structural validation.
    InvalidBlock(String),

    /// Signature did not verify against the transaction's public key.
    InvalidSignature,

    /// Sender's public key does not derive the sender address.
    SenderMismatch,

    /// Transaction nonce does not match the sender account.
    NonceMismatch { expected: u64, got: u64 },

    /// Sender cannot cover the transferred value.
    InsufficientBalance { have: u64, need: u64 },

    /// Transaction gas limit below its intrinsic cost.
    IntrinsicGas { limit: u64, required: u64 },

    /// Block gas limit exceeded.
    OutOfGas { limit: u64, used: u64 },

    /// Arithmetic overflow in a balance or gas counter.
    Overflow(&'static str),

    /// Payload could not be encoded or decoded.
    Codec(CodecError),
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBlock(msg) => write!(f, "invalid block: {}", msg),
            Self::InvalidSignature => write!(f, "invalid transaction signature"),
            Self::SenderMismatch => write!(f, "public key does not match sender"),
            Self::NonceMismatch { expected, got } => {
                write!(f, "nonce mismatch: expected {}, got {}", expected, got)
            }
            Self::InsufficientBalance { have, need } => {
                write!(f, "insufficient balance: have {}, need {}", have, need)
            }
            Self::IntrinsicGas { limit, required } => {
                write!(f, "intrinsic gas too low: limit={}, required={}", limit, required)
            }
            Self::OutOfGas { limit, used } => {
                write!(f, "out of gas: limit={}, used={}", limit, used)
            }
            Self::Overflow(what) => write!(f, "overflow in {}", what),
            Self::Codec(err) => write!(f, "codec error: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ExecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CodecError> for ExecError {
    fn from(err: CodecError) -> Self {
        Self::Codec(err)
    }
}

/// Convenience result type for execution.
pub type ExecResult<T> = core::result::Result<T, ExecError>;
