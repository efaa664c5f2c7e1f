//! Shared test utilities for ingest and snapshot integration tests
#![allow(dead_code)]

use common::ingest::{Directory, PinService};
use common::linked_data::Link;
use common::store::BlobsStore;
use tempfile::TempDir;

/// Set up a pin service over an on-disk blob store
pub async fn setup_pin_service() -> (PinService<BlobsStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let blobs = BlobsStore::fs(&temp_dir.path().join("blobs")).await.unwrap();
    (PinService::new(blobs), temp_dir)
}

/// Load a pinned directory root back out of the store
pub async fn load_directory(store: &BlobsStore, link: &Link) -> Directory {
    store.get_cbor(&link.hash()).await.unwrap()
}
