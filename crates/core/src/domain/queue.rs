// Queue Domain Model

use serde::{Deserialize, Serialize};

/// Priority bucket a command is dispatched to.
///
/// Each class is served by its own admission queue with an independent
/// concurrency cap, so a saturated bulk queue never delays device management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueClass {
    /// Device discovery, connect/disconnect and cheap property reads
    Fast,
    /// Single shell commands, log streaming, everything unclassified
    Normal,
    /// Listings, package queries, file transfers
    Bulk,
}

impl QueueClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueClass::Fast => "fast",
            QueueClass::Normal => "normal",
            QueueClass::Bulk => "bulk",
        }
    }
}

impl std::fmt::Display for QueueClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub name: String,
    pub max_concurrency: usize,
}

impl QueueConfig {
    pub fn new(name: impl Into<String>, max_concurrency: usize) -> Self {
        Self {
            name: name.into(),
            max_concurrency,
        }
    }
}

/// Point-in-time snapshot of one queue's bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub name: String,
    pub pending: usize,
    pub in_flight: usize,
    pub max_concurrency: usize,
}

/// Snapshot of all three queues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuesStatus {
    pub fast: QueueStatus,
    pub normal: QueueStatus,
    pub bulk: QueueStatus,
}
