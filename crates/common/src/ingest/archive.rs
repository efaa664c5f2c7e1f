use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use bytes::Bytes;
use flate2::read::GzDecoder;
use tokio::io::AsyncRead;
use tokio_util::io::SyncIoBridge;

use crate::linked_data::Link;
use crate::store::{BlockStore, StoreError};

use super::directory::{DirectoryBuilder, DirectoryError};

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("failed to decompress archive: {0}")]
    Decompress(String),
    #[error("malformed archive: {0}")]
    Malformed(String),
    #[error("directories are not supported: {0}")]
    NestedDirectory(String),
    #[error("archive entries need a name")]
    EmptyName,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("archive unpacker failed: {0}")]
    Unpacker(String),
}

impl ArchiveError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ArchiveError::Store(_) | ArchiveError::Unpacker(_))
    }
}

impl From<DirectoryError> for ArchiveError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::EmptyName => ArchiveError::EmptyName,
            DirectoryError::Store(e) => ArchiveError::Store(e),
        }
    }
}

/// A regular file pulled out of the archive
#[derive(Debug)]
struct ArchiveEntry {
    name: String,
    data: Bytes,
}

type EntrySender = flume::Sender<Result<ArchiveEntry, ArchiveError>>;

/// Unpack a gzipped tarball into a directory and pin it.
///
/// Decompression and tar parsing run on a blocking thread reading the async
///  body through a [`SyncIoBridge`]. Entries are handed over one at a time,
///  so at most one file is held in memory while it is being pinned. Any
///  error aborts the whole upload; files pinned before the error stay
///  pinned.
pub async fn pin_archive<S, R>(store: &S, reader: R) -> Result<Link, ArchiveError>
where
    S: BlockStore,
    R: AsyncRead + Send + Unpin + 'static,
{
    let (tx, rx) = flume::bounded(1);
    let bridge = SyncIoBridge::new(reader);
    let unpacker = tokio::task::spawn_blocking(move || {
        if let Err(e) = read_entries(bridge, &tx) {
            let _ = tx.send(Err(e));
        }
    });

    let mut builder = DirectoryBuilder::new(store.clone());
    let mut outcome = Ok(());
    while let Ok(entry) = rx.recv_async().await {
        let added = match entry {
            Ok(ArchiveEntry { name, data }) => builder
                .add_file(name, data)
                .await
                .map(|_| ())
                .map_err(ArchiveError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = added {
            outcome = Err(e);
            break;
        }
    }
    // releases the unpacker if it is blocked handing over an entry
    drop(rx);

    unpacker
        .await
        .map_err(|e| ArchiveError::Unpacker(e.to_string()))?;
    outcome?;

    let directory = builder.finalize();
    let link = store.pin_directory(&directory, &[]).await?;
    tracing::info!(%link, files = directory.len(), "pinned archive");
    Ok(link)
}

fn read_entries<R: Read>(reader: R, tx: &EntrySender) -> Result<(), ArchiveError> {
    let mut decoder = BufReader::new(GzDecoder::new(reader));
    // surfaces a bad gzip header before any entry is read
    let head = decoder
        .fill_buf()
        .map_err(|e| ArchiveError::Decompress(e.to_string()))?;
    if head.is_empty() {
        return Err(ArchiveError::Malformed("archive is empty".to_string()));
    }

    let mut archive = tar::Archive::new(decoder);
    let entries = archive.entries().map_err(classify)?;
    for entry in entries {
        let mut entry = entry.map_err(classify)?;
        let kind = entry.header().entry_type();
        let path = entry.path().map_err(classify)?.into_owned();

        // checked on the raw path, `./` is a directory entry and not a missing name
        if kind.is_dir() {
            return Err(ArchiveError::NestedDirectory(
                path.to_string_lossy().into_owned(),
            ));
        }
        if !kind.is_file() {
            tracing::debug!(path = %path.display(), ?kind, "skipping archive entry");
            continue;
        }
        let name = entry_name(&path)?;

        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(classify)?;
        let entry = ArchiveEntry {
            name,
            data: Bytes::from(data),
        };
        if tx.send(Ok(entry)).is_err() {
            // nobody is listening anymore, the upload already failed
            return Ok(());
        }
    }
    Ok(())
}

/// Archive-relative name of an entry, without leading `./` or `/`
fn entry_name(path: &Path) -> Result<String, ArchiveError> {
    let raw = path
        .to_str()
        .ok_or_else(|| ArchiveError::Malformed("entry name is not utf-8".to_string()))?;
    let mut name = raw;
    loop {
        let trimmed = name.trim_start_matches('/');
        let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
        if trimmed == name {
            break;
        }
        name = trimmed;
    }
    let name = name.trim_end_matches('/');
    if name.is_empty() || name == "." {
        return Err(ArchiveError::EmptyName);
    }
    Ok(name.to_string())
}

/// flate2 reports corrupt or truncated streams as invalid input or an
///  early eof, tar reports everything else as `Other`
fn classify(err: io::Error) -> ArchiveError {
    match err.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            ArchiveError::Decompress(err.to_string())
        }
        _ => ArchiveError::Malformed(err.to_string()),
    }
}
