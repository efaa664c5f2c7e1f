use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::engine::SearchError;
use super::fanout::SnapshotPeer;
use super::query::{QueryOptions, QueryResult, SnapshotQuery, ThreadSnapshot};

#[derive(Debug, Clone)]
struct StoredSnapshot {
    date: DateTime<Utc>,
    snapshot: ThreadSnapshot,
}

/// Snapshots this node holds itself, indexed by account address.
///
/// Answers searches like any other peer, flagged as local.
#[derive(Debug, Clone)]
pub struct LocalSnapshots {
    peer_id: String,
    snapshots: Arc<RwLock<HashMap<String, Vec<StoredSnapshot>>>>,
}

impl LocalSnapshots {
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            snapshots: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a snapshot for an address, replacing any earlier one for the
    ///  same thread
    pub fn insert(&self, address: &str, snapshot: ThreadSnapshot) {
        let mut snapshots = self.snapshots.write();
        let stored = snapshots.entry(address.to_string()).or_default();
        stored.retain(|s| s.snapshot.id != snapshot.id);
        stored.push(StoredSnapshot {
            date: Utc::now(),
            snapshot,
        });
    }

    pub fn remove(&self, address: &str, thread_id: &str) -> bool {
        let mut snapshots = self.snapshots.write();
        let Some(stored) = snapshots.get_mut(address) else {
            return false;
        };
        let before = stored.len();
        stored.retain(|s| s.snapshot.id != thread_id);
        before != stored.len()
    }
}

#[async_trait]
impl SnapshotPeer for LocalSnapshots {
    fn id(&self) -> String {
        self.peer_id.clone()
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn snapshots(
        &self,
        query: &SnapshotQuery,
        _options: &QueryOptions,
    ) -> Result<Vec<QueryResult>, SearchError> {
        let snapshots = self.snapshots.read();
        let results = snapshots
            .get(query.address())
            .map(|stored| {
                stored
                    .iter()
                    .map(|s| QueryResult {
                        id: s.snapshot.id.clone(),
                        date: s.date,
                        local: true,
                        peer: self.peer_id.clone(),
                        value: s.snapshot.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::thread_snapshot;

    async fn stored(local: &LocalSnapshots, address: &str) -> Vec<ThreadSnapshot> {
        let query = SnapshotQuery::new(address).unwrap();
        local
            .snapshots(&query, &QueryOptions::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.value)
            .collect()
    }

    #[tokio::test]
    async fn test_insert_replaces_same_thread() {
        let local = LocalSnapshots::new("self");
        let mut snapshot = thread_snapshot("t1");
        local.insert("addr", snapshot.clone());
        snapshot.name = "renamed".into();
        local.insert("addr", snapshot);

        let listed = stored(&local, "addr").await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "renamed");
    }

    #[tokio::test]
    async fn test_remove() {
        let local = LocalSnapshots::new("self");
        local.insert("addr", thread_snapshot("t1"));
        assert!(local.remove("addr", "t1"));
        assert!(!local.remove("addr", "t1"));
        assert!(!local.remove("other", "t1"));
        assert!(stored(&local, "addr").await.is_empty());
    }

    #[tokio::test]
    async fn test_answers_by_address() {
        let local = LocalSnapshots::new("self");
        local.insert("addr", thread_snapshot("t1"));
        local.insert("other", thread_snapshot("t2"));

        let query = SnapshotQuery::new("addr").unwrap();
        let results = local
            .snapshots(&query, &QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].peer, "self");
        assert_eq!(results[0].value.id, "t1");
    }
}
