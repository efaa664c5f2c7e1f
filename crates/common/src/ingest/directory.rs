use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::linked_data::{BlockEncoded, DagCborCodec, Link, LD_RAW_CODEC};
use crate::store::{BlockStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory entries need a name")]
    EmptyName,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A named child of a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryLink {
    pub link: Link,
    pub size: u64,
}

/**
 * Directories
 * ===========
 * A flat, finalized mapping of names to pinned children.
 * Entries live in a BTreeMap so the same set of (name, content)
 *  pairs always encodes to the same block, and therefore the
 *  same link, regardless of the order they were added in.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    links: BTreeMap<String, DirectoryLink>,
}

impl BlockEncoded<DagCborCodec> for Directory {}

impl Directory {
    /// Build a directory from already pinned children
    pub fn from_links<I>(links: I) -> Self
    where
        I: IntoIterator<Item = (String, Link, u64)>,
    {
        Self {
            links: links
                .into_iter()
                .map(|(name, link, size)| (name, DirectoryLink { link, size }))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&DirectoryLink> {
        self.links.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DirectoryLink)> {
        self.links.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Request-owned builder for a [`Directory`].
///
/// Each added file is pinned immediately; the directory itself only exists
///  once [`DirectoryBuilder::finalize`] consumes the builder.
#[derive(Debug)]
pub struct DirectoryBuilder<S> {
    store: S,
    links: BTreeMap<String, DirectoryLink>,
}

impl<S: BlockStore> DirectoryBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            links: BTreeMap::new(),
        }
    }

    /// Pin `data` and record it under `name`.
    ///
    /// Adding a name twice keeps the later content.
    pub async fn add_file(
        &mut self,
        name: impl Into<String>,
        data: Bytes,
    ) -> Result<Link, DirectoryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DirectoryError::EmptyName);
        }

        let size = data.len() as u64;
        let hash = self.store.put(data).await?;
        let link = Link::new(LD_RAW_CODEC, hash);

        if self
            .links
            .insert(name.clone(), DirectoryLink { link, size })
            .is_some()
        {
            tracing::debug!(name = %name, "replacing earlier directory entry");
        }
        Ok(link)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn finalize(self) -> Directory {
        Directory { links: self.links }
    }
}
