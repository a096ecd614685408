//! End-to-end hook lifecycle through the block pipeline:
//! Blockchain::insert → BlockProcessor → HookDispatcher → plugin callbacks.

mod common;

use std::sync::Arc;

use strata_engine::{ChainError, ImportOutcome};
use strata_hooks::{HookCallback, HookDispatcher, PluginRegistry};
use strata_primitives::types::{MAX_EXTRA_DATA_LEN, MAX_TX_DATA_LEN};
use strata_primitives::{ExecError, ZERO_HASH};
use tracing::Level;

use common::*;

fn chain_events(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| l.starts_with("NewHead") || l.starts_with("NewSideBlock") || l.starts_with("Reorg"))
        .cloned()
        .collect()
}

// ── Processing hooks ──

#[test]
fn test_valid_block_hook_order() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);
    let (_, alice_sk) = alice();
    let (bob_addr, _) = bob();

    let b1 = child(
        &genesis(),
        vec![transfer(&alice_sk, 0, &bob_addr, 10), transfer(&alice_sk, 1, &bob_addr, 20)],
        0,
    );
    assert_eq!(chain.insert(b1).unwrap(), ImportOutcome::NewHead);

    assert_eq!(
        take(&journal),
        vec![
            "PreProcessBlock:1",
            "PreProcessTransaction:1:0",
            "PostProcessTransaction:1:0:true",
            "PreProcessTransaction:1:1",
            "PostProcessTransaction:1:1:true",
            "PostProcessBlock:1",
            "NewHead:1:logs=2",
        ]
    );
}

#[test]
fn test_failing_transaction_fires_error_hook_and_aborts() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);
    let (alice_addr, alice_sk) = alice();
    let (bob_addr, _) = bob();

    let b1 = child(
        &genesis(),
        vec![transfer(&alice_sk, 0, &bob_addr, 10), transfer(&alice_sk, 5, &bob_addr, 20)],
        0,
    );
    let (result, logs) = with_logs(|| chain.insert(b1.clone()));
    let err = result.unwrap_err();

    assert!(matches!(
        err,
        ChainError::Rejected(ExecError::NonceMismatch { expected: 1, got: 5 })
    ));
    let warnings = at_level(&logs, Level::WARN);
    assert!(
        warnings.iter().any(|l| l.message == "transaction failed, abandoning block"
            && l.fields.get("tx_index").map(String::as_str) == Some("1")),
        "missing abandon warning: {warnings:?}"
    );
    assert_eq!(
        take(&journal),
        vec![
            "PreProcessBlock:1",
            "PreProcessTransaction:1:0",
            "PostProcessTransaction:1:0:true",
            "PreProcessTransaction:1:1",
            "BlockProcessingError:1:nonce mismatch: expected 1, got 5",
        ]
    );

    // Nothing from the abandoned block survives.
    assert!(!chain.contains(&b1.hash()));
    assert_eq!(chain.head_hash(), genesis().hash());
    let state = chain.head_state().unwrap();
    assert_eq!(state.balance(&alice_addr), 1_000_000);
    assert_eq!(state.nonce(&alice_addr), 0);
}

#[test]
fn test_invalid_block_fires_no_hooks() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);

    let mut bad = child(&genesis(), Vec::new(), 0);
    bad.header.tx_root = ZERO_HASH;

    assert!(matches!(
        chain.insert(bad),
        Err(ChainError::Rejected(ExecError::InvalidBlock(_)))
    ));
    assert!(take(&journal).is_empty());
}

#[test]
fn test_block_over_wire_limits_rejected_before_hooks() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);
    let (_, alice_sk) = alice();
    let (bob_addr, _) = bob();

    let mut wide_header = child(&genesis(), vec![transfer(&alice_sk, 0, &bob_addr, 10)], 0);
    wide_header.header.extra_data = vec![7; MAX_EXTRA_DATA_LEN + 1];

    let mut big_tx = transfer(&alice_sk, 0, &bob_addr, 10);
    big_tx.data = vec![0; MAX_TX_DATA_LEN + 1];
    let wide_body = child(&genesis(), vec![big_tx], 0);

    for block in [wide_header, wide_body] {
        assert!(matches!(
            chain.insert(block),
            Err(ChainError::Rejected(ExecError::InvalidBlock(_)))
        ));
    }
    assert!(take(&journal).is_empty());
    assert_eq!(chain.head_hash(), genesis().hash());
}

#[test]
fn test_unknown_parent_fires_no_hooks() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);

    let orphan = child(&child(&genesis(), Vec::new(), 0), Vec::new(), 0);

    assert!(matches!(chain.insert(orphan), Err(ChainError::UnknownParent { .. })));
    assert!(take(&journal).is_empty());
}

// ── Chain events ──

#[test]
fn test_side_block_notification() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);
    let g = genesis();

    let a1 = child(&g, Vec::new(), 0);
    let b1 = child(&g, Vec::new(), 1);
    chain.insert(a1.clone()).unwrap();
    assert_eq!(chain.insert(b1).unwrap(), ImportOutcome::SideBlock);

    assert_eq!(
        chain_events(&take(&journal)),
        vec!["NewHead:1:logs=0", "NewSideBlock:1"]
    );
    assert_eq!(chain.head_hash(), a1.hash());
}

#[test]
fn test_reorg_delivers_segments_newest_first() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);
    let g = genesis();

    let a1 = child(&g, Vec::new(), 0);
    let a2 = child(&a1, Vec::new(), 0);
    let b1 = child(&g, Vec::new(), 1);
    let b2 = child(&b1, Vec::new(), 1);
    let b3 = child(&b2, Vec::new(), 1);

    for block in [a1, a2, b1, b2] {
        chain.insert(block).unwrap();
    }
    let outcome = chain.insert(b3.clone()).unwrap();

    assert_eq!(
        outcome,
        ImportOutcome::Reorg {
            common_ancestor: g.hash(),
            dropped: 2,
            adopted: 3,
        }
    );
    assert_eq!(
        chain_events(&take(&journal)),
        vec![
            "NewHead:1:logs=0",
            "NewHead:2:logs=0",
            "NewSideBlock:1",
            "NewSideBlock:2",
            "Reorg:0:old=[2,1]:new=[3,2,1]",
            "NewHead:3:logs=0",
        ]
    );
    assert_eq!(chain.head_hash(), b3.hash());
}

#[test]
fn test_reorg_switches_state_to_new_branch() {
    let (dispatcher, _journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);
    let g = genesis();
    let (alice_addr, alice_sk) = alice();
    let (_, bob_sk) = bob();
    let (charlie_addr, _) = charlie();

    let a1 = child(&g, vec![transfer(&alice_sk, 0, &charlie_addr, 100)], 0);
    let b1 = child(&g, vec![transfer(&bob_sk, 0, &charlie_addr, 7)], 1);
    let b2 = child(&b1, Vec::new(), 1);

    chain.insert(a1).unwrap();
    assert_eq!(chain.head_state().unwrap().balance(&charlie_addr), 100);

    chain.insert(b1).unwrap();
    chain.insert(b2).unwrap();

    let state = chain.head_state().unwrap();
    assert_eq!(state.balance(&charlie_addr), 7);
    assert_eq!(state.balance(&alice_addr), 1_000_000);
    assert_eq!(state.nonce(&alice_addr), 0);
}

#[test]
fn test_reorg_on_deeper_fork_point() {
    let (dispatcher, journal) = recording_dispatcher();
    let mut chain = chain_with(dispatcher);

    let c1 = child(&genesis(), Vec::new(), 0);
    let a2 = child(&c1, Vec::new(), 0);
    let b2 = child(&c1, Vec::new(), 1);
    let b3 = child(&b2, Vec::new(), 1);

    for block in [c1.clone(), a2, b2] {
        chain.insert(block).unwrap();
    }
    take(&journal);

    let outcome = chain.insert(b3).unwrap();
    assert!(matches!(outcome, ImportOutcome::Reorg { common_ancestor, .. } if common_ancestor == c1.hash()));
    assert_eq!(
        chain_events(&take(&journal)),
        vec!["Reorg:1:old=[2]:new=[3,2]", "NewHead:3:logs=0"]
    );
}

// ── Dispatcher configuration ──

#[test]
fn test_disabled_dispatcher_does_not_change_results() {
    let (recording, _journal) = recording_dispatcher();
    let mut with_hooks = chain_with(recording);
    let mut without_hooks = chain_with(HookDispatcher::disabled());
    let (_, alice_sk) = alice();
    let (bob_addr, _) = bob();

    let b1 = child(&genesis(), vec![transfer(&alice_sk, 0, &bob_addr, 10)], 0);
    with_hooks.insert(b1.clone()).unwrap();
    without_hooks.insert(b1.clone()).unwrap();

    assert_eq!(with_hooks.head_hash(), without_hooks.head_hash());
    assert_eq!(with_hooks.head_state(), without_hooks.head_state());
    assert_eq!(with_hooks.receipts(&b1.hash()), without_hooks.receipts(&b1.hash()));
}

#[test]
fn test_panicking_plugin_does_not_block_import() {
    let (recorder, journal) = Recorder::new();
    let registry = PluginRegistry::builder()
        .register("faulty", "PostProcessBlock", HookCallback::block(|_| panic!("indexer crashed")))
        .load(&recorder)
        .build();
    let dispatcher = Arc::new(HookDispatcher::new(Arc::new(registry)));
    let mut chain = strata_engine::Blockchain::new(
        config(),
        genesis(),
        funded_ledger(),
        dispatcher.clone(),
    )
    .unwrap();

    let b1 = child(&genesis(), Vec::new(), 0);
    assert_eq!(chain.insert(b1.clone()).unwrap(), ImportOutcome::NewHead);

    assert_eq!(chain.head_hash(), b1.hash());
    assert!(take(&journal).contains(&"PostProcessBlock:1".to_string()));
    assert_eq!(dispatcher.stats().callback_panics, 1);
}
