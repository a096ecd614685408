//! The closed set of lifecycle hook names.

use std::fmt;
use std::str::FromStr;

use crate::callback::CallbackShape;

/// A lifecycle point at which registered callbacks are notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookName {
    PreProcessBlock,
    PreProcessTransaction,
    BlockProcessingError,
    PostProcessTransaction,
    PostProcessBlock,
    NewHead,
    NewSideBlock,
    Reorg,
}

impl HookName {
    /// Every hook, in pipeline order.
    pub const ALL: [HookName; 8] = [
        HookName::PreProcessBlock,
        HookName::PreProcessTransaction,
        HookName::BlockProcessingError,
        HookName::PostProcessTransaction,
        HookName::PostProcessBlock,
        HookName::NewHead,
        HookName::NewSideBlock,
        HookName::Reorg,
    ];

    /// The registry key plugins register under.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreProcessBlock => "PreProcessBlock",
            Self::PreProcessTransaction => "PreProcessTransaction",
            Self::BlockProcessingError => "BlockProcessingError",
            Self::PostProcessTransaction => "PostProcessTransaction",
            Self::PostProcessBlock => "PostProcessBlock",
            Self::NewHead => "NewHead",
            Self::NewSideBlock => "NewSideBlock",
            Self::Reorg => "Reorg",
        }
    }

    /// The callback shape this hook delivers.
    ///
    /// `NewHead` and `NewSideBlock` share a shape; the registry key keeps
    /// them apart.
    pub const fn expected_shape(self) -> CallbackShape {
        match self {
            Self::PreProcessBlock => CallbackShape::EncodedBlock,
            Self::PreProcessTransaction => CallbackShape::EncodedTransaction,
            Self::BlockProcessingError => CallbackShape::ProcessingError,
            Self::PostProcessTransaction => CallbackShape::TransactionReceipt,
            Self::PostProcessBlock => CallbackShape::Block,
            Self::NewHead | Self::NewSideBlock => CallbackShape::ChainEvent,
            Self::Reorg => CallbackShape::Reorg,
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a string that names no known hook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hook name: {0}")]
pub struct UnknownHookName(pub String);

impl FromStr for HookName {
    type Err = UnknownHookName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookName::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| UnknownHookName(s.to_string()))
    }
}
