//! `strata-engine` — the Strata block-processing pipeline.
//!
//! The engine decides *when* each lifecycle hook fires:
//!
//! - [`validation`] — block validation before execution
//! - [`transaction`] — signature checks, the in-memory [`Ledger`] and transfer execution
//! - [`executor::BlockProcessor`] — executes one block and fires the processing hooks
//! - [`chain::Blockchain`] — block index with longest-chain fork choice; fires
//!   `NewHead`, `NewSideBlock` and `Reorg`
//!
//! Hooks are delivered through a shared [`strata_hooks::HookDispatcher`]; a
//! disabled dispatcher makes every hook a logged no-op without changing
//! processing results.

pub mod config;
pub mod validation;
pub mod transaction;
pub mod executor;
pub mod chain;

pub use chain::{Blockchain, ChainError, ImportOutcome};
pub use config::ChainConfig;
pub use executor::{BlockProcessor, ProcessedBlock};
pub use transaction::{Account, Ledger, TransferExecutor};
