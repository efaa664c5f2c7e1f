use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::linked_data::{Link, LD_RAW_CODEC};
use crate::store::{BlockStore, StoreError};

use super::archive::{pin_archive, ArchiveError};

/// Upload kinds the pin endpoint understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinContentType {
    /// `application/gzip`: a gzipped tarball of files
    Archive,
    /// `application/octet-stream`: a single blob
    Raw,
}

impl PinContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinContentType::Archive => "application/gzip",
            PinContentType::Raw => "application/octet-stream",
        }
    }
}

impl fmt::Display for PinContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinContentType {
    type Err = PinError;

    /// Parameters such as `; charset=` are ignored
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mime: mime::Mime = s.trim().parse().map_err(|_| PinError::InvalidContentType)?;
        match mime.essence_str() {
            "application/gzip" => Ok(PinContentType::Archive),
            "application/octet-stream" => Ok(PinContentType::Raw),
            _ => Err(PinError::InvalidContentType),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PinError {
    #[error("invalid-content-type")]
    InvalidContentType,
    #[error("failed to read upload: {0}")]
    Read(#[from] std::io::Error),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl PinError {
    /// Whether the request itself was at fault. Server side failures are
    ///  worth retrying, client ones are not.
    pub fn is_client_error(&self) -> bool {
        match self {
            PinError::InvalidContentType | PinError::Read(_) => true,
            PinError::Archive(e) => e.is_client_error(),
            PinError::Store(_) => false,
        }
    }
}

/// Turns an upload into exactly one pinned link
#[derive(Debug, Clone)]
pub struct PinService<S> {
    store: S,
}

impl<S: BlockStore> PinService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pin an upload according to its declared content type.
    ///
    /// The content type is checked before anything touches the store.
    pub async fn pin<R>(&self, content_type: &str, reader: R) -> Result<Link, PinError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let kind: PinContentType = content_type.parse()?;
        self.pin_as(kind, reader).await
    }

    pub async fn pin_as<R>(&self, kind: PinContentType, mut reader: R) -> Result<Link, PinError>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        match kind {
            PinContentType::Archive => Ok(pin_archive(&self.store, reader).await?),
            PinContentType::Raw => {
                let mut data = Vec::new();
                reader.read_to_end(&mut data).await?;
                self.pin_raw(Bytes::from(data)).await
            }
        }
    }

    /// Pin a single blob as-is
    pub async fn pin_raw(&self, data: Bytes) -> Result<Link, PinError> {
        let len = data.len();
        let hash = self.store.put(data).await?;
        let link = Link::new(LD_RAW_CODEC, hash);
        tracing::info!(%link, len, "pinned blob");
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::linked_data::{Hash, LD_CBOR_CODEC};
    use crate::store::BlobsStore;
    use crate::testkit::{ArchiveBuilder, FailingStore};

    #[test]
    fn test_parse_content_type() {
        assert_eq!(
            "application/gzip".parse::<PinContentType>().unwrap(),
            PinContentType::Archive
        );
        assert_eq!(
            "application/octet-stream; charset=binary"
                .parse::<PinContentType>()
                .unwrap(),
            PinContentType::Raw
        );
        assert!("application/json".parse::<PinContentType>().is_err());
        assert!("multipart/form-data; boundary=x"
            .parse::<PinContentType>()
            .is_err());
        assert!("".parse::<PinContentType>().is_err());
    }

    #[tokio::test]
    async fn test_pin_raw() {
        let service = PinService::new(BlobsStore::memory().await.unwrap());
        let link = service
            .pin("application/octet-stream", Cursor::new(b"hello".to_vec()))
            .await
            .unwrap();

        assert_eq!(link, Link::new(LD_RAW_CODEC, Hash::new(b"hello")));
        assert_eq!(
            service.store().get(&link.hash()).await.unwrap().as_ref(),
            b"hello"
        );
    }

    #[tokio::test]
    async fn test_pin_raw_is_deterministic() {
        let service = PinService::new(BlobsStore::memory().await.unwrap());
        let a = service.pin_raw(Bytes::from_static(b"same")).await.unwrap();
        let b = service.pin_raw(Bytes::from_static(b"same")).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_pin_archive() {
        let service = PinService::new(BlobsStore::memory().await.unwrap());
        let archive = ArchiveBuilder::new().file("a.txt", b"alpha").gzip();
        let link = service
            .pin("application/gzip", Cursor::new(archive))
            .await
            .unwrap();
        assert_eq!(link.codec(), LD_CBOR_CODEC);
    }

    #[tokio::test]
    async fn test_invalid_content_type_skips_store() {
        // a failing store proves nothing was attempted
        let service = PinService::new(FailingStore);
        let err = service
            .pin("text/plain", Cursor::new(b"hello".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, PinError::InvalidContentType));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "invalid-content-type");
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let service = PinService::new(FailingStore);
        let err = service
            .pin("application/octet-stream", Cursor::new(b"hello".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, PinError::Store(_)));
        assert!(!err.is_client_error());
    }
}
