//! Block record types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a task is blocked.
///
/// Serialized as a bare string: the two closed tags, or any
/// application-supplied text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockReason {
    /// An upstream task failed or was blocked.
    DependencyFailed,
    /// An operator placed a hold.
    ManualHold,
    /// Application-supplied reason.
    Custom(String),
}

impl From<String> for BlockReason {
    fn from(value: String) -> Self {
        match value.as_str() {
            "dependency-failed" => Self::DependencyFailed,
            "manual-hold" => Self::ManualHold,
            _ => Self::Custom(value),
        }
    }
}

impl From<&str> for BlockReason {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<BlockReason> for String {
    fn from(value: BlockReason) -> Self {
        value.to_string()
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DependencyFailed => f.write_str("dependency-failed"),
            Self::ManualHold => f.write_str("manual-hold"),
            Self::Custom(reason) => f.write_str(reason),
        }
    }
}

/// A single task's block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Why the task is blocked.
    pub reason: BlockReason,
    /// When the block was applied.
    pub blocked_at: DateTime<Utc>,
    /// Whether the record was created by an operator hold.
    #[serde(default)]
    pub manual: bool,
    /// The task whose block cascaded onto this one; absent for direct blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl BlockRecord {
    pub(crate) fn direct(reason: BlockReason, at: DateTime<Utc>) -> Self {
        Self { reason, blocked_at: at, manual: false, source: None }
    }

    pub(crate) fn cascaded(source: &str, at: DateTime<Utc>) -> Self {
        Self {
            reason: BlockReason::DependencyFailed,
            blocked_at: at,
            manual: false,
            source: Some(source.to_string()),
        }
    }

    pub(crate) fn manual(at: DateTime<Utc>) -> Self {
        Self { reason: BlockReason::ManualHold, blocked_at: at, manual: true, source: None }
    }
}
