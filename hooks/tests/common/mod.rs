//! Shared test helpers for hook dispatch integration tests.
//!
//! Provides sample blocks and transactions, instrumented payload encoders,
//! and a tracing layer that captures emitted events for assertions.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use strata_hooks::{CanonicalEncoder, PayloadEncoder};
use strata_primitives::{
    types::MAX_TX_DATA_LEN, Block, BlockHeader, CodecError, Transaction, TxType, ZERO_ADDRESS,
    ZERO_HASH,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

// ── Sample data ──

pub fn sample_tx(nonce: u64) -> Transaction {
    Transaction {
        tx_type: TxType::Transfer,
        nonce,
        sender: [1u8; 32],
        to: Some([2u8; 32]),
        value: 100 + nonce,
        gas_limit: 50_000,
        data: Vec::new(),
        public_key: [1u8; 32],
        signature: [9u8; 64],
    }
}

/// A transaction whose data exceeds the codec limit, so encoding it fails.
pub fn oversized_tx() -> Transaction {
    Transaction {
        tx_type: TxType::Data,
        data: vec![0xAB; MAX_TX_DATA_LEN + 1],
        ..sample_tx(0)
    }
}

pub fn sample_block(height: u64, tx_count: u64) -> Block {
    Block {
        header: BlockHeader {
            height,
            parent_hash: [height as u8; 32],
            state_root: ZERO_HASH,
            tx_root: ZERO_HASH,
            proposer_id: ZERO_ADDRESS,
            block_time: 1_700_000_000 + height,
            gas_limit: 10_000_000,
            chain_id: b"strata-test".to_vec(),
            extra_data: Vec::new(),
        },
        transactions: (0..tx_count).map(sample_tx).collect(),
    }
}

/// Shared ordered record of callback activity.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

// ── Encoders ──

/// Canonical encoder that counts how often each payload kind is encoded.
#[derive(Debug, Default)]
pub struct CountingEncoder {
    pub blocks: AtomicUsize,
    pub transactions: AtomicUsize,
}

impl CountingEncoder {
    pub fn block_calls(&self) -> usize {
        self.blocks.load(Ordering::SeqCst)
    }

    pub fn transaction_calls(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }
}

impl PayloadEncoder for CountingEncoder {
    fn encode_block(&self, block: &Block) -> Result<Vec<u8>, CodecError> {
        self.blocks.fetch_add(1, Ordering::SeqCst);
        CanonicalEncoder.encode_block(block)
    }

    fn encode_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, CodecError> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        CanonicalEncoder.encode_transaction(tx)
    }
}

/// Encoder that rejects every payload.
#[derive(Debug, Default)]
pub struct FailingEncoder;

impl PayloadEncoder for FailingEncoder {
    fn encode_block(&self, _block: &Block) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::UnexpectedEof)
    }

    fn encode_transaction(&self, _tx: &Transaction) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::UnexpectedEof)
    }
}

/// Encoder that handles transactions but rejects every block.
#[derive(Debug, Default)]
pub struct BlockOnlyFailure;

impl PayloadEncoder for BlockOnlyFailure {
    fn encode_block(&self, _block: &Block) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::UnexpectedEof)
    }

    fn encode_transaction(&self, tx: &Transaction) -> Result<Vec<u8>, CodecError> {
        CanonicalEncoder.encode_transaction(tx)
    }
}

// ── Log capture ──

#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }
}

impl EventVisitor {
    fn store(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

/// Tracing layer that records every event it sees.
#[derive(Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

/// Run `f` with a capturing subscriber installed on this thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedEvent>) {
    let layer = CaptureLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, layer.events())
}

/// Events at `level` or more severe.
pub fn at_least(events: &[CapturedEvent], level: Level) -> Vec<CapturedEvent> {
    events.iter().filter(|e| e.level <= level).cloned().collect()
}
