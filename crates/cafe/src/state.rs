use std::{fs, path::PathBuf};

use common::prelude::SecretKey;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "cafe";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the API server
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Account whose snapshots are searched for, the node key if unset
    #[serde(default)]
    pub account_address: Option<String>,
    /// Audience bearer tokens must carry
    #[serde(default = "default_protocol")]
    pub protocol: String,
    /// Ceiling on snapshot search wait windows
    #[serde(default = "default_snapshot_max_wait_secs")]
    pub snapshot_max_wait_secs: u64,
    /// Other cafe nodes asked for snapshots, by API base URL
    #[serde(default)]
    pub peers: Vec<Url>,
}

fn default_api_port() -> u16 {
    service::config::DEFAULT_API_PORT
}

fn default_protocol() -> String {
    service::config::DEFAULT_PROTOCOL.to_string()
}

fn default_snapshot_max_wait_secs() -> u64 {
    common::snapshot::MAX_WAIT.as_secs()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            account_address: None,
            protocol: default_protocol(),
            snapshot_max_wait_secs: default_snapshot_max_wait_secs(),
            peers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the cafe directory (~/.cafe)
    pub cafe_dir: PathBuf,
    /// Path to the node key PEM file
    pub key_path: PathBuf,
    /// Path to the blobs directory
    pub blobs_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the cafe directory path (custom or default ~/.cafe)
    pub fn cafe_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new cafe state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let cafe_dir = Self::cafe_dir(custom_path)?;

        if cafe_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&cafe_dir)?;

        let blobs_path = cafe_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;

        // Generate and save key
        let key = SecretKey::generate();
        let key_path = cafe_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let config = config.unwrap_or_default();
        let config_path = cafe_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            cafe_dir,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the cafe directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let cafe_dir = Self::cafe_dir(custom_path)?;

        if !cafe_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = cafe_dir.join(KEY_FILE_NAME);
        let blobs_path = cafe_dir.join(BLOBS_DIR_NAME);
        let config_path = cafe_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !blobs_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", BLOBS_DIR_NAME)));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            cafe_dir,
            key_path,
            blobs_path,
            config_path,
            config,
        })
    }

    /// Load the secret key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("cafe directory not initialized. Run 'cafe init' first")]
    NotInitialized,

    #[error("cafe directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
