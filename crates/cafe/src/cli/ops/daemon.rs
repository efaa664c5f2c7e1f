use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use url::Url;

use service::{spawn_service, Config};

use crate::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Override the blob store directory (default: blobs/ in the cafe directory)
    #[arg(long)]
    pub blobs: Option<PathBuf>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Extra node to search for snapshots, added to the configured peers
    #[arg(long = "peer")]
    pub peers: Vec<Url>,

    /// Default log level, RUST_LOG still takes precedence
    #[arg(long, default_value_t = tracing::Level::INFO)]
    pub log_level: tracing::Level,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.cafe)
        let state = AppState::load(ctx.config_path.clone())?;
        let secret_key = state.load_key()?;

        let api_port = self.api_port.unwrap_or(state.config.api_port);
        let mut peers = state.config.peers.clone();
        peers.extend(self.peers.iter().cloned());

        let config = Config {
            api_listen_addr: Some(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
                api_port,
            )),
            node_secret: Some(secret_key),
            node_blobs_store_path: Some(self.blobs.clone().unwrap_or(state.blobs_path)),
            account_address: state.config.account_address.clone(),
            protocol: state.config.protocol.clone(),
            snapshot_max_wait: Duration::from_secs(state.config.snapshot_max_wait_secs),
            peers,
            log_level: self.log_level,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
