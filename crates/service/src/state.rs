use std::sync::Arc;

use common::crypto::{PublicKey, SecretKey};
use common::ingest::PinService;
use common::snapshot::{LocalSnapshots, PeerFanout, SnapshotEngine, SnapshotPeer};
use common::store::{BlobsStore, BlobsStoreError};

use super::config::Config;
use super::peers::{HttpSnapshotPeer, PeerClientError};

/// Main service state, shared by every handler
#[derive(Clone, Debug)]
pub struct State {
    node_secret: SecretKey,
    protocol: Arc<str>,
    account_address: Arc<str>,
    pins: PinService<BlobsStore>,
    snapshots: SnapshotEngine,
    local_snapshots: LocalSnapshots,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        // 1. Setup node secret
        let node_secret = config
            .node_secret
            .clone()
            .unwrap_or_else(SecretKey::generate);

        // 2. Setup blobs store
        tracing::debug!("ServiceState::from_config - loading blobs store");
        let blobs = match config.node_blobs_store_path {
            Some(ref path) => {
                if !path.exists() {
                    return Err(StateSetupError::BlobsStorePathDoesNotExist);
                }
                BlobsStore::fs(path).await?
            }
            None => BlobsStore::memory().await?,
        };
        tracing::debug!("ServiceState::from_config - blobs store loaded successfully");

        let account_address = config
            .account_address
            .clone()
            .unwrap_or_else(|| node_secret.public().to_hex());

        // 3. Setup remote peers
        let mut peers: Vec<Arc<dyn SnapshotPeer>> = Vec::with_capacity(config.peers.len());
        for remote in &config.peers {
            peers.push(Arc::new(HttpSnapshotPeer::new(remote)?));
        }

        let state = Self::new(node_secret, &config.protocol, &account_address, blobs)
            .with_peers(peers)
            .with_max_wait(config.snapshot_max_wait);

        tracing::info!("Node id: {}", state.node_id().to_hex());
        tracing::info!("Account address: {}", state.account_address());
        tracing::info!("Snapshot peers: {}", config.peers.len());
        Ok(state)
    }

    /// Assemble state around an already opened store. Snapshot search asks
    ///  the node's own index only, until peers are added.
    pub fn new(
        node_secret: SecretKey,
        protocol: &str,
        account_address: &str,
        blobs: BlobsStore,
    ) -> Self {
        let local_snapshots = LocalSnapshots::new(node_secret.public().to_hex());
        let fanout = PeerFanout::default().with_peer(Arc::new(local_snapshots.clone()));
        Self {
            node_secret,
            protocol: protocol.into(),
            account_address: account_address.into(),
            pins: PinService::new(blobs),
            snapshots: SnapshotEngine::new(Arc::new(fanout)),
            local_snapshots,
        }
    }

    /// Fan searches out to `peers` as well as the node's own index.
    pub fn with_peers(mut self, peers: Vec<Arc<dyn SnapshotPeer>>) -> Self {
        let local: Arc<dyn SnapshotPeer> = Arc::new(self.local_snapshots.clone());
        let fanout = PeerFanout::new(std::iter::once(local).chain(peers).collect());
        let max_wait = self.snapshots.max_wait();
        self.snapshots = SnapshotEngine::new(Arc::new(fanout)).with_max_wait(max_wait);
        self
    }

    pub fn with_max_wait(mut self, max_wait: std::time::Duration) -> Self {
        self.snapshots = self.snapshots.with_max_wait(max_wait);
        self
    }

    pub fn node_secret(&self) -> &SecretKey {
        &self.node_secret
    }

    pub fn node_id(&self) -> PublicKey {
        self.node_secret.public()
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn account_address(&self) -> &str {
        &self.account_address
    }

    pub fn pins(&self) -> &PinService<BlobsStore> {
        &self.pins
    }

    pub fn snapshots(&self) -> &SnapshotEngine {
        &self.snapshots
    }

    pub fn local_snapshots(&self) -> &LocalSnapshots {
        &self.local_snapshots
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("Blobs store path does not exist")]
    BlobsStorePathDoesNotExist,
    #[error("Blobs store error: {0}")]
    BlobsStore(#[from] BlobsStoreError),
    #[error("Peer client error: {0}")]
    PeerClient(#[from] PeerClientError),
}
