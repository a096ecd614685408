//! Transaction verification and execution against the in-memory ledger.
//!
//! A transaction is checked in this order:
//! 1. Sender address equals the public key
//! 2. Ed25519 signature over [`Transaction::signing_payload`]
//! 3. Intrinsic gas fits the transaction gas limit
//! 4. Nonce equals the sender account nonce
//! 5. Payload rules (transfer funds, data carries no value)
//!
//! Nothing is written to the ledger until every check has passed, so a
//! failed transaction leaves the ledger untouched.

use std::collections::BTreeMap;

use strata_primitives::{
    crypto::{hash_blake3, verify_ed25519},
    gas::{intrinsic_gas, G_LOG},
    Address, BlockHeight, ExecError, ExecResult, Hash, Log, Transaction, TxType, ZERO_HASH,
};

/// Topic tag of the log emitted by every successful transfer.
const TRANSFER_TOPIC_TAG: &[u8] = b"strata/Transfer";

/// First topic of transfer logs.
pub fn transfer_topic() -> Hash {
    hash_blake3(TRANSFER_TOPIC_TAG)
}

// ── Ledger ──

/// Balance and nonce of one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Account {
    pub balance: u64,
    pub nonce: u64,
}

/// In-memory account state.
///
/// Cloned per block so a failing block can simply drop its working copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    accounts: BTreeMap<Address, Account>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with the given opening balances.
    pub fn with_balances(balances: impl IntoIterator<Item = (Address, u64)>) -> Self {
        let accounts = balances
            .into_iter()
            .map(|(addr, balance)| (addr, Account { balance, nonce: 0 }))
            .collect();
        Self { accounts }
    }

    /// Account state; unknown accounts are empty.
    pub fn account(&self, addr: &Address) -> Account {
        self.accounts.get(addr).copied().unwrap_or_default()
    }

    pub fn balance(&self, addr: &Address) -> u64 {
        self.account(addr).balance
    }

    pub fn nonce(&self, addr: &Address) -> u64 {
        self.account(addr).nonce
    }

    /// Number of accounts with state.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Add `amount` to an account balance.
    pub fn credit(&mut self, addr: &Address, amount: u64) -> ExecResult<()> {
        let account = self.accounts.entry(*addr).or_default();
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(ExecError::Overflow("balance"))?;
        Ok(())
    }

    /// Commitment over all accounts: BLAKE3 of `address || balance || nonce`
    /// in address order. An empty ledger commits to `ZERO_HASH`.
    pub fn state_root(&self) -> Hash {
        if self.accounts.is_empty() {
            return ZERO_HASH;
        }
        let mut buf = Vec::with_capacity(self.accounts.len() * (32 + 8 + 8));
        for (addr, account) in &self.accounts {
            buf.extend_from_slice(addr);
            buf.extend_from_slice(&account.balance.to_le_bytes());
            buf.extend_from_slice(&account.nonce.to_le_bytes());
        }
        hash_blake3(&buf)
    }

    fn set(&mut self, addr: Address, account: Account) {
        self.accounts.insert(addr, account);
    }
}

// ── Verification ──

/// Stateless transaction checks. Returns the intrinsic gas on success.
pub fn verify_transaction(tx: &Transaction) -> ExecResult<u64> {
    if tx.sender != tx.public_key {
        return Err(ExecError::SenderMismatch);
    }

    if !verify_ed25519(&tx.signing_payload(), &tx.signature, &tx.public_key) {
        return Err(ExecError::InvalidSignature);
    }

    let required = intrinsic_gas(tx);
    if tx.gas_limit < required {
        return Err(ExecError::IntrinsicGas {
            limit: tx.gas_limit,
            required,
        });
    }

    Ok(required)
}

// ── Execution ──

/// Position of a transaction within the block being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub block_height: BlockHeight,
    pub tx_index: u32,
    /// Block-wide index the first emitted log receives.
    pub next_log_index: u32,
}

/// Result of one successfully executed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub gas_used: u64,
    pub logs: Vec<Log>,
}

/// Applies transfer and data transactions to a [`Ledger`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferExecutor;

impl TransferExecutor {
    /// Verify and apply `tx`. On error the ledger is unchanged.
    pub fn execute(
        &self,
        ledger: &mut Ledger,
        tx: &Transaction,
        ctx: TxContext,
    ) -> ExecResult<TxOutcome> {
        let intrinsic = verify_transaction(tx)?;

        let sender = ledger.account(&tx.sender);
        if tx.nonce != sender.nonce {
            return Err(ExecError::NonceMismatch {
                expected: sender.nonce,
                got: tx.nonce,
            });
        }
        let next_nonce = sender.nonce.checked_add(1).ok_or(ExecError::Overflow("nonce"))?;

        match tx.tx_type {
            TxType::Transfer => self.transfer(ledger, tx, sender, next_nonce, intrinsic, ctx),
            TxType::Data => {
                if tx.value != 0 {
                    return Err(ExecError::InvalidBlock(
                        "data transaction cannot carry value".into(),
                    ));
                }
                ledger.set(
                    tx.sender,
                    Account {
                        nonce: next_nonce,
                        ..sender
                    },
                );
                Ok(TxOutcome {
                    gas_used: intrinsic,
                    logs: Vec::new(),
                })
            }
        }
    }

    fn transfer(
        &self,
        ledger: &mut Ledger,
        tx: &Transaction,
        sender: Account,
        next_nonce: u64,
        intrinsic: u64,
        ctx: TxContext,
    ) -> ExecResult<TxOutcome> {
        let to = tx
            .to
            .ok_or_else(|| ExecError::InvalidBlock("transfer without recipient".into()))?;

        let gas_used = intrinsic.checked_add(G_LOG).ok_or(ExecError::Overflow("gas"))?;
        if gas_used > tx.gas_limit {
            return Err(ExecError::OutOfGas {
                limit: tx.gas_limit,
                used: gas_used,
            });
        }

        if sender.balance < tx.value {
            return Err(ExecError::InsufficientBalance {
                have: sender.balance,
                need: tx.value,
            });
        }

        let debited = Account {
            balance: sender.balance - tx.value,
            nonce: next_nonce,
        };
        let recipient = if to == tx.sender {
            debited
        } else {
            ledger.account(&to)
        };
        let credited = recipient
            .balance
            .checked_add(tx.value)
            .ok_or(ExecError::Overflow("recipient balance"))?;

        ledger.set(tx.sender, debited);
        ledger.set(
            to,
            Account {
                balance: credited,
                ..recipient
            },
        );

        let log = Log {
            address: tx.sender,
            topics: vec![transfer_topic(), to],
            data: tx.value.to_le_bytes().to_vec(),
            block_height: ctx.block_height,
            tx_index: ctx.tx_index,
            log_index: ctx.next_log_index,
        };

        Ok(TxOutcome {
            gas_used,
            logs: vec![log],
        })
    }
}
