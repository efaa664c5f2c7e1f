use std::future::IntoFuture;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use bytes::Bytes;
use iroh_blobs::{
    api::{
        blobs::{BlobStatus, Blobs},
        RequestError,
    },
    store::{fs::FsStore, mem::MemStore},
    BlobsProtocol, Hash,
};

use crate::ingest::Directory;
use crate::linked_data::{BlockEncoded, CodecError, DagCborCodec, Link, LD_CBOR_CODEC};

use super::{BlockStore, StoreError};

/// Client over a local iroh-blob store.
/// Every blob added through it is tagged, so nothing the
///  pin path writes is eligible for garbage collection.
#[derive(Clone, Debug)]
pub struct BlobsStore {
    pub inner: Arc<BlobsProtocol>,
}

impl Deref for BlobsStore {
    type Target = Arc<BlobsProtocol>;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlobsStoreError {
    #[error("blobs store error: {0}")]
    Default(#[from] anyhow::Error),
    #[error("blob store i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("request error: {0}")]
    Request(#[from] RequestError),
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),
}

impl BlobsStore {
    /// Load a blob store from the given path
    pub async fn fs(path: &Path) -> Result<Self, BlobsStoreError> {
        tracing::debug!("BlobsStore::fs loading store at {:?}", path);
        let store = FsStore::load(path).await?;
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Load a memory blobs store
    pub async fn memory() -> Result<Self, BlobsStoreError> {
        let store = MemStore::new();
        let blobs = BlobsProtocol::new(&store, None);
        Ok(Self {
            inner: Arc::new(blobs),
        })
    }

    /// Get a handle to the underlying blobs client against
    ///  the store
    pub fn blobs(&self) -> &Blobs {
        self.inner.store().blobs()
    }

    /// Get a blob as bytes
    pub async fn get_bytes(&self, hash: &Hash) -> Result<Bytes, BlobsStoreError> {
        let bytes = self
            .blobs()
            .get_bytes(*hash)
            .await
            .map_err(|e| BlobsStoreError::Default(anyhow!(e)))?;
        Ok(bytes)
    }

    /// Get a blob as a block encoded
    pub async fn get_cbor<T: BlockEncoded<DagCborCodec>>(
        &self,
        hash: &Hash,
    ) -> Result<T, BlobsStoreError> {
        let bytes = self.get_bytes(hash).await?;
        Ok(T::decode(&bytes)?)
    }

    /// Store bytes as a tagged blob
    pub async fn put_bytes(&self, data: impl Into<Bytes>) -> Result<Hash, BlobsStoreError> {
        let data: Bytes = data.into();
        let hash = self.blobs().add_bytes(data).into_future().await?.hash;
        Ok(hash)
    }

    /// Whether a blob is complete in the store
    pub async fn is_complete(&self, hash: &Hash) -> Result<bool, BlobsStoreError> {
        let stat = self
            .blobs()
            .status(*hash)
            .await
            .map_err(|err| BlobsStoreError::Default(anyhow!(err)))?;
        Ok(matches!(stat, BlobStatus::Complete { .. }))
    }
}

#[async_trait]
impl BlockStore for BlobsStore {
    async fn put(&self, data: Bytes) -> Result<Hash, StoreError> {
        let len = data.len();
        let hash = self.put_bytes(data).await?;
        tracing::debug!(%hash, len, "pinned blob");
        Ok(hash)
    }

    async fn get(&self, hash: &Hash) -> Result<Bytes, StoreError> {
        Ok(self.get_bytes(hash).await?)
    }

    async fn stat(&self, hash: &Hash) -> Result<bool, StoreError> {
        Ok(self.is_complete(hash).await?)
    }

    async fn pin_directory(&self, root: &Directory, exclude: &[Link]) -> Result<Link, StoreError> {
        for (_, child) in root.iter() {
            if exclude.contains(&child.link) {
                continue;
            }
            if !self.is_complete(&child.link.hash()).await? {
                return Err(StoreError::MissingChild(child.link));
            }
        }

        let encoded = root.encode()?;
        let hash = self.put_bytes(encoded).await?;
        let link = Link::new(LD_CBOR_CODEC, hash);
        tracing::debug!(%link, entries = root.len(), "pinned directory root");
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::DirectoryBuilder;
    use crate::linked_data::LD_RAW_CODEC;
    use tempfile::TempDir;

    async fn setup_test_store() -> (BlobsStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let blob_path = temp_dir.path().join("blobs");
        let blobs = BlobsStore::fs(&blob_path).await.unwrap();
        (blobs, temp_dir)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (store, _temp) = setup_test_store().await;

        let data = Bytes::from_static(b"Hello, BlobsStore!");
        let hash = store.put(data.clone()).await.unwrap();

        let retrieved = BlockStore::get(&store, &hash).await.unwrap();
        assert_eq!(retrieved, data);
    }

    #[tokio::test]
    async fn test_put_is_content_addressed() {
        let store = BlobsStore::memory().await.unwrap();

        let a = store.put(Bytes::from_static(b"same")).await.unwrap();
        let b = store.put(Bytes::from_static(b"same")).await.unwrap();
        let c = store.put(Bytes::from_static(b"different")).await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Hash::new(b"same"));
    }

    #[tokio::test]
    async fn test_stat() {
        let (store, _temp) = setup_test_store().await;

        let hash = store
            .put(Bytes::from_static(b"Test data for stat"))
            .await
            .unwrap();
        assert!(BlockStore::stat(&store, &hash).await.unwrap());

        let fake_hash = Hash::from_bytes([0u8; 32]);
        assert!(!BlockStore::stat(&store, &fake_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let store = BlobsStore::memory().await.unwrap();
        let fake_hash = Hash::from_bytes([99u8; 32]);
        assert!(BlockStore::get(&store, &fake_hash).await.is_err());
    }

    #[tokio::test]
    async fn test_pin_directory_round_trip() {
        let store = BlobsStore::memory().await.unwrap();

        let mut builder = DirectoryBuilder::new(store.clone());
        builder
            .add_file("a.txt", Bytes::from_static(b"alpha"))
            .await
            .unwrap();
        builder
            .add_file("b.txt", Bytes::from_static(b"beta"))
            .await
            .unwrap();
        let dir = builder.finalize();

        let link = store.pin_directory(&dir, &[]).await.unwrap();
        assert_eq!(link.codec(), LD_CBOR_CODEC);
        assert!(BlockStore::stat(&store, &link.hash()).await.unwrap());

        let loaded: Directory = store.get_cbor(&link.hash()).await.unwrap();
        assert_eq!(loaded, dir);
    }

    #[tokio::test]
    async fn test_pin_directory_missing_child() {
        let store = BlobsStore::memory().await.unwrap();
        let ghost = Link::new(LD_RAW_CODEC, Hash::new(b"never stored"));
        let dir = Directory::from_links([("ghost".to_string(), ghost, 12)]);

        let err = store.pin_directory(&dir, &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingChild(link) if link == ghost));

        // excluded children are not checked
        assert!(store.pin_directory(&dir, &[ghost]).await.is_ok());
    }
}
