use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How long a search collects responses when the caller does not say
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);
/// Upper bound on any search's wait window
pub const MAX_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("query address is required")]
    EmptyAddress,
}

/// Snapshots are searched for by the account address that owns them
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotQuery {
    address: String,
}

impl SnapshotQuery {
    pub fn new(address: impl Into<String>) -> Result<Self, QueryError> {
        let address = address.into().trim().to_string();
        if address.is_empty() {
            return Err(QueryError::EmptyAddress);
        }
        Ok(Self { address })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Only ask peers that live on this node
    pub local: bool,
    /// Stop after this many results, anything `<= 0` means no limit
    pub limit: i64,
    pub wait: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            local: false,
            limit: -1,
            wait: DEFAULT_WAIT,
        }
    }
}

impl QueryOptions {
    pub fn with_wait_secs(mut self, secs: u64) -> Self {
        self.wait = Duration::from_secs(secs);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    pub fn max_results(&self) -> Option<usize> {
        (self.limit > 0).then_some(self.limit as usize)
    }

    /// The wait window, never longer than `max`
    pub fn clamped_wait(&self, max: Duration) -> Duration {
        self.wait.min(max)
    }
}

/// A thread snapshot as advertised by a peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub id: String,
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// One response to a snapshot search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: String,
    pub date: DateTime<Utc>,
    /// Whether the answer came from this node
    pub local: bool,
    pub peer: String,
    pub value: ThreadSnapshot,
}

/// A failure reported by a single peer. It never ends a search on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerError {
    pub peer: String,
    pub message: String,
}

impl PeerError {
    pub fn new(peer: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            peer: peer.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for PeerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.peer, self.message)
    }
}

impl std::error::Error for PeerError {}
