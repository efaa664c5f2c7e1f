/**
 * Bearer token verification against the
 *  node's identity key.
 */
pub mod auth;
/**
 * Cryptographic types and operations.
 *  - Public and Private key implementations
 *  - PEM and PKCS#8 encodings
 */
pub mod crypto;
/**
 * Upload ingestion: raw blobs and gzipped
 *  tarballs in, one pinned link out.
 */
pub mod ingest;
/**
 * Internal wrapper around IPLD, renamed to
 *  something a little more down-to-earth.
 * Handles translation between CIDs and the
 *  iroh-blobs hashes content is stored by.
 */
pub mod linked_data;
/**
 * Network-wide snapshot search with bounded
 *  wait windows and cancellable sessions.
 */
pub mod snapshot;
/**
 * Storage layer implementation.
 *  Just a light wrapper around the Iroh-Blobs
 *  store behind a small `BlockStore` trait.
 */
pub mod store;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub mod prelude {
    pub use crate::auth::{validate, Claims, KeyResolver, TokenError};
    pub use crate::crypto::{PublicKey, SecretKey};
    pub use crate::ingest::{PinContentType, PinError, PinService};
    pub use crate::linked_data::{multibase, Cid, CidError, Link};
    pub use crate::snapshot::{
        LocalSnapshots, PeerFanout, QueryOptions, SearchSession, SessionEvent, SnapshotEngine,
    };
    pub use crate::store::{BlobsStore, BlockStore};
    pub use crate::version::build_info;
}
