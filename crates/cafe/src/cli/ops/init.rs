use clap::Args;
use url::Url;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// API server listen port
    #[arg(long, default_value_t = service::config::DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Account whose snapshots are searched for (defaults to the node key)
    #[arg(long)]
    pub account_address: Option<String>,

    /// Another node to search for snapshots, may be repeated
    #[arg(long = "peer")]
    pub peers: Vec<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            api_port: self.api_port,
            account_address: self.account_address.clone(),
            peers: self.peers.clone(),
            ..Default::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let node_id = state.load_key()?.public().to_hex();

        let output = format!(
            "Initialized cafe directory at: {}\n\
             - Key: {}\n\
             - Node id: {}\n\
             - Blobs: {}\n\
             - Config: {}\n\
             - API port: {}\n\
             - Peers: {}",
            state.cafe_dir.display(),
            state.key_path.display(),
            node_id,
            state.blobs_path.display(),
            state.config_path.display(),
            state.config.api_port,
            state.config.peers.len(),
        );

        Ok(output)
    }
}
