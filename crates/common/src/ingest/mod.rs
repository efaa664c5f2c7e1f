//! Pin ingestion
//!
//! Uploads arrive either as a single blob or as a gzipped tarball of files.
//! Blobs are pinned as-is. Tarballs are unpacked entry by entry into a
//! [`DirectoryBuilder`], and the finalized [`Directory`] root is pinned once
//! the archive is exhausted. Either way the caller gets back one [`Link`].
//!
//! [`Link`]: crate::linked_data::Link

mod archive;
mod directory;
mod pin;

pub use archive::{pin_archive, ArchiveError};
pub use directory::{Directory, DirectoryBuilder, DirectoryError, DirectoryLink};
pub use pin::{PinContentType, PinError, PinService};
