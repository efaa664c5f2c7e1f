use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;

use crate::ingest::Directory;
use crate::linked_data::{Hash, Link};
use crate::store::{BlockStore, StoreError};

/// A block store that refuses everything
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

#[async_trait]
impl BlockStore for FailingStore {
    async fn put(&self, _data: Bytes) -> Result<Hash, StoreError> {
        Err(anyhow!("store offline").into())
    }

    async fn get(&self, _hash: &Hash) -> Result<Bytes, StoreError> {
        Err(anyhow!("store offline").into())
    }

    async fn stat(&self, _hash: &Hash) -> Result<bool, StoreError> {
        Err(anyhow!("store offline").into())
    }

    async fn pin_directory(
        &self,
        _root: &Directory,
        _exclude: &[Link],
    ) -> Result<Link, StoreError> {
        Err(anyhow!("store offline").into())
    }
}
