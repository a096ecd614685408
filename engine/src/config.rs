//! Chain configuration.

use serde::Deserialize;

/// Chain-wide parameters checked during block validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Chain identifier every block header must carry.
    /// Default: "strata-devnet".
    pub chain_id: String,

    /// Maximum number of transactions in one block.
    /// Default: 10,000.
    pub max_txs_per_block: usize,
}

impl ChainConfig {
    pub fn chain_id_bytes(&self) -> &[u8] {
        self.chain_id.as_bytes()
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: "strata-devnet".to_string(),
            max_txs_per_block: 10_000,
        }
    }
}
