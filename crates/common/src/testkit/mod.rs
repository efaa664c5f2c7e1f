//! Test helpers shared by unit and integration tests
//!
//! Enabled under `cfg(test)` and by the `testkit` feature, which the crate
//! turns on for its own integration tests and which the service crate
//! enables as a dev-dependency.
//!
//! # Example
//!
//! ```rust,ignore
//! use common::crypto::SecretKey;
//! use common::testkit::{ArchiveBuilder, TokenMinter};
//!
//! let node = SecretKey::generate();
//! let token = TokenMinter::new(&node, "/cafe/1.0.0").access();
//! let body = ArchiveBuilder::new().file("a.txt", b"alpha").gzip();
//! ```
mod archive;
mod snapshots;
mod store;
mod tokens;

pub use archive::ArchiveBuilder;
pub use snapshots::{
    snapshot_result, thread_snapshot, HangingPeer, ScriptedPeer, ScriptedSearch,
};
pub use store::FailingStore;
pub use tokens::TokenMinter;
