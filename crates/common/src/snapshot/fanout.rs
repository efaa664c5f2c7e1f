use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};

use super::engine::{SearchError, SnapshotSearch};
use super::query::{PeerError, QueryOptions, QueryResult, SnapshotQuery};
use super::session::ResponseSink;

/// A single peer that can be asked for snapshots
#[async_trait]
pub trait SnapshotPeer: Send + Sync + std::fmt::Debug + 'static {
    fn id(&self) -> String;

    /// Peers living on this node, the only ones asked for `local` searches
    fn is_local(&self) -> bool {
        false
    }

    async fn snapshots(
        &self,
        query: &SnapshotQuery,
        options: &QueryOptions,
    ) -> Result<Vec<QueryResult>, SearchError>;
}

/// Asks every known peer at once and forwards answers in the order peers
///  respond.
#[derive(Debug, Clone, Default)]
pub struct PeerFanout {
    peers: Vec<Arc<dyn SnapshotPeer>>,
}

impl PeerFanout {
    pub fn new(peers: Vec<Arc<dyn SnapshotPeer>>) -> Self {
        Self { peers }
    }

    pub fn with_peer(mut self, peer: Arc<dyn SnapshotPeer>) -> Self {
        self.peers.push(peer);
        self
    }
}

#[async_trait]
impl SnapshotSearch for PeerFanout {
    async fn search(
        &self,
        query: &SnapshotQuery,
        options: &QueryOptions,
        sink: &ResponseSink,
    ) -> Result<(), SearchError> {
        let mut pending: FuturesUnordered<_> = self
            .peers
            .iter()
            .filter(|peer| !options.local || peer.is_local())
            .map(|peer| async move { (peer.id(), peer.snapshots(query, options).await) })
            .collect();

        tracing::debug!(peers = pending.len(), "fanning out snapshot search");

        while let Some((peer, outcome)) = pending.next().await {
            match outcome {
                Ok(results) => {
                    for result in results {
                        if !sink.push_result(result) {
                            return Ok(());
                        }
                    }
                }
                Err(e) => sink.push_error(PeerError::new(peer, e)),
            }
        }
        Ok(())
    }
}
