//! Block storage
//!
//! The pin path only ever needs a handful of operations from the object
//! store: put a blob (pinned), read it back, check it is present, and pin
//! a finished directory root. [`BlockStore`] names those, and
//! [`BlobsStore`] provides them over a local iroh-blobs store.

use async_trait::async_trait;
use bytes::Bytes;

use crate::ingest::Directory;
use crate::linked_data::{CodecError, Hash, Link};

mod blobs_store;

pub use blobs_store::{BlobsStore, BlobsStoreError};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("blobs store error: {0}")]
    Blobs(#[from] BlobsStoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("directory child {0} is not in the store")]
    MissingChild(Link),
    #[error("store error: {0}")]
    Default(#[from] anyhow::Error),
}

#[async_trait]
pub trait BlockStore: Send + Sync + std::fmt::Debug + Clone + 'static {
    /// Store a blob and pin it, returning its content hash
    async fn put(&self, data: Bytes) -> Result<Hash, StoreError>;

    async fn get(&self, hash: &Hash) -> Result<Bytes, StoreError>;

    /// Whether the blob is fully present in the store
    async fn stat(&self, hash: &Hash) -> Result<bool, StoreError>;

    /// Pin a finalized directory root.
    ///
    /// Children are expected to be pinned already; every child not named in
    ///  `exclude` is checked for presence before the root is written.
    async fn pin_directory(&self, root: &Directory, exclude: &[Link]) -> Result<Link, StoreError>;
}
