//! Cafe service: the HTTP face of a pinning node.
//!
//! - State (node identity, pin service, snapshot search)
//! - HTTP handlers (health checks, authenticated pinning, snapshot search)
//! - Remote peers searched over HTTP
//! - Process wiring (logging, signals, graceful shutdown)

pub mod config;
pub mod http;
pub mod peers;
pub mod process;
pub mod state;

pub use config::Config;
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use state::{State as ServiceState, StateSetupError};
