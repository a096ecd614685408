//! Shared test helpers for engine integration tests.
//!
//! Provides deterministic keypairs, signed transactions, block builders,
//! a recording plugin that journals every hook it receives, and a log
//! capture for asserting on engine events.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use strata_engine::{Blockchain, ChainConfig, Ledger};
use strata_hooks::{HookCallback, HookDispatcher, Plugin, PluginRegistry};
use strata_primitives::{
    codec, crypto::sign_ed25519, Address, Block, BlockHeader, Transaction, TxType, ZERO_ADDRESS,
    ZERO_HASH,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const CHAIN_ID: &str = "strata-test";

// ── Deterministic keypairs ──

/// Ed25519 key whose secret is `[seed; 32]`.
pub fn deterministic_keypair(seed: u8) -> (ed25519_dalek::VerifyingKey, ed25519_dalek::SigningKey) {
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&[seed; 32]);
    let verifying_key = signing_key.verifying_key();
    (verifying_key, signing_key)
}

pub fn alice() -> (Address, ed25519_dalek::SigningKey) {
    let (vk, sk) = deterministic_keypair(1);
    (*vk.as_bytes(), sk)
}

pub fn bob() -> (Address, ed25519_dalek::SigningKey) {
    let (vk, sk) = deterministic_keypair(2);
    (*vk.as_bytes(), sk)
}

pub fn charlie() -> (Address, ed25519_dalek::SigningKey) {
    let (vk, sk) = deterministic_keypair(3);
    (*vk.as_bytes(), sk)
}

// ── Transactions and blocks ──

pub fn transfer(
    sk: &ed25519_dalek::SigningKey,
    nonce: u64,
    to: &Address,
    value: u64,
) -> Transaction {
    let sender = *sk.verifying_key().as_bytes();
    let mut tx = Transaction {
        tx_type: TxType::Transfer,
        nonce,
        sender,
        to: Some(*to),
        value,
        gas_limit: 50_000,
        data: Vec::new(),
        public_key: sender,
        signature: [0u8; 64],
    };
    tx.signature = sign_ed25519(&tx.signing_payload(), sk);
    tx
}

pub fn config() -> ChainConfig {
    ChainConfig {
        chain_id: CHAIN_ID.to_string(),
        ..ChainConfig::default()
    }
}

pub fn genesis() -> Block {
    let mut block = Block {
        header: BlockHeader {
            height: 0,
            parent_hash: ZERO_HASH,
            state_root: ZERO_HASH,
            tx_root: ZERO_HASH,
            proposer_id: ZERO_ADDRESS,
            block_time: 1_700_000_000,
            gas_limit: 10_000_000,
            chain_id: CHAIN_ID.as_bytes().to_vec(),
            extra_data: Vec::new(),
        },
        transactions: Vec::new(),
    };
    block.header.tx_root = block.compute_tx_root();
    block
}

/// Child of `parent` carrying `transactions`; `fork` tags sibling branches
/// so their hashes differ.
pub fn child(parent: &Block, transactions: Vec<Transaction>, fork: u8) -> Block {
    let mut block = Block {
        header: BlockHeader {
            height: parent.height() + 1,
            parent_hash: parent.hash(),
            block_time: parent.header.block_time + 1,
            extra_data: vec![fork],
            ..parent.header.clone()
        },
        transactions,
    };
    block.header.tx_root = block.compute_tx_root();
    block
}

pub fn funded_ledger() -> Ledger {
    let (alice, _) = alice();
    let (bob, _) = bob();
    Ledger::with_balances([(alice, 1_000_000), (bob, 1_000_000)])
}

pub fn chain_with(dispatcher: HookDispatcher) -> Blockchain {
    Blockchain::new(config(), genesis(), funded_ledger(), Arc::new(dispatcher))
        .expect("valid genesis")
}

// ── Recording plugin ──

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Plugin that journals every hook as a compact line.
pub struct Recorder {
    journal: Journal,
}

impl Recorder {
    pub fn new() -> (Self, Journal) {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                journal: journal.clone(),
            },
            journal,
        )
    }

    fn push(journal: &Journal, line: String) {
        journal.lock().unwrap().push(line);
    }
}

fn heights(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| b.height().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn hooks(&self) -> Vec<(String, HookCallback)> {
        let j = || self.journal.clone();
        let (j1, j2, j3, j4, j5, j6, j7, j8) = (j(), j(), j(), j(), j(), j(), j(), j());
        vec![
            (
                "PreProcessBlock".into(),
                HookCallback::encoded_block(move |bytes| {
                    let block = codec::decode_block(bytes).unwrap();
                    Self::push(&j1, format!("PreProcessBlock:{}", block.height()));
                }),
            ),
            (
                "PreProcessTransaction".into(),
                HookCallback::encoded_transaction(move |tx, block, index| {
                    let tx = codec::decode_transaction(tx).unwrap();
                    let block = codec::decode_block(block).unwrap();
                    assert_eq!(block.transactions[index as usize], tx);
                    Self::push(&j2, format!("PreProcessTransaction:{}:{}", block.height(), index));
                }),
            ),
            (
                "BlockProcessingError".into(),
                HookCallback::processing_error(move |_, block, err| {
                    Self::push(&j3, format!("BlockProcessingError:{}:{}", block.height(), err));
                }),
            ),
            (
                "PostProcessTransaction".into(),
                HookCallback::transaction_receipt(move |_, block, index, receipt| {
                    Self::push(
                        &j4,
                        format!("PostProcessTransaction:{}:{}:{}", block.height(), index, receipt.success),
                    );
                }),
            ),
            (
                "PostProcessBlock".into(),
                HookCallback::block(move |block| {
                    Self::push(&j5, format!("PostProcessBlock:{}", block.height()));
                }),
            ),
            (
                "NewHead".into(),
                HookCallback::chain_event(move |block, hash, logs| {
                    assert_eq!(block.hash(), hash);
                    Self::push(&j6, format!("NewHead:{}:logs={}", block.height(), logs.len()));
                }),
            ),
            (
                "NewSideBlock".into(),
                HookCallback::chain_event(move |block, _, _| {
                    Self::push(&j7, format!("NewSideBlock:{}", block.height()));
                }),
            ),
            (
                "Reorg".into(),
                HookCallback::reorg(move |common, old, new| {
                    Self::push(
                        &j8,
                        format!("Reorg:{}:old=[{}]:new=[{}]", common.height(), heights(old), heights(new)),
                    );
                }),
            ),
        ]
    }
}

/// Dispatcher over a registry holding only a [`Recorder`].
pub fn recording_dispatcher() -> (HookDispatcher, Journal) {
    let (recorder, journal) = Recorder::new();
    let registry = PluginRegistry::builder().load(&recorder).build();
    (HookDispatcher::new(Arc::new(registry)), journal)
}

pub fn take(journal: &Journal) -> Vec<String> {
    std::mem::take(&mut *journal.lock().unwrap())
}

// ── Log capture ──

/// One emitted tracing event: level, message and the remaining fields.
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Default)]
struct LineVisitor(LogLine);

impl Default for LogLine {
    fn default() -> Self {
        Self {
            level: Level::TRACE,
            message: String::new(),
            fields: BTreeMap::new(),
        }
    }
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.0.message = value;
        } else {
            self.0.fields.insert(field.name().to_string(), value);
        }
    }
}

#[derive(Clone, Default)]
struct LineRecorder(Arc<Mutex<Vec<LogLine>>>);

impl<S: Subscriber> Layer<S> for LineRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        visitor.0.level = *event.metadata().level();
        self.0.lock().unwrap().push(visitor.0);
    }
}

/// Run `f` with a recording subscriber installed on this thread.
pub fn with_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<LogLine>) {
    let recorder = LineRecorder::default();
    let subscriber = tracing_subscriber::registry().with(recorder.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    let lines = recorder.0.lock().unwrap().clone();
    (result, lines)
}

/// Log lines at exactly `level`.
pub fn at_level(lines: &[LogLine], level: Level) -> Vec<&LogLine> {
    lines.iter().filter(|l| l.level == level).collect()
}
