use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use common::prelude::SecretKey;
use common::snapshot::MAX_WAIT;
use url::Url;

/// Audience tokens must be minted for to be accepted by this node
pub const DEFAULT_PROTOCOL: &str = "/cafe/1.0.0";
pub const DEFAULT_API_PORT: u16 = 40601;

#[derive(Debug)]
pub struct Config {
    /// address for the API server to listen on.
    ///  if not set then 0.0.0.0:40601 will be used
    pub api_listen_addr: Option<SocketAddr>,
    /// the node's identity key, which also verifies bearer tokens.
    ///  if not set then a new secret will be generated
    pub node_secret: Option<SecretKey>,
    /// the path to our blobs store, if not set then
    ///  an in-memory store will be used
    pub node_blobs_store_path: Option<PathBuf>,
    /// account whose snapshots the search endpoint looks up.
    ///  defaults to the node's public key
    pub account_address: Option<String>,
    /// token audience, tokens minted for anything else are refused
    pub protocol: String,
    /// ceiling on how long a snapshot search may wait for peers
    pub snapshot_max_wait: Duration,
    /// other nodes asked for snapshots alongside our own index
    pub peers: Vec<Url>,

    // misc
    pub log_level: tracing::Level,
    /// directory for daily rolling log files, stdout only if not set
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn api_listen_addr(&self) -> SocketAddr {
        self.api_listen_addr.unwrap_or_else(|| {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), DEFAULT_API_PORT)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_listen_addr: None,
            node_secret: None,
            node_blobs_store_path: None,
            account_address: None,
            protocol: DEFAULT_PROTOCOL.to_string(),
            snapshot_max_wait: MAX_WAIT,
            peers: Vec::new(),
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
