use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{EntryType, Header};

/// Builds gzipped tarballs entry by entry.
///
/// Names are written into the header verbatim, so leading `./` or `/`
///  survive into the archive.
pub struct ArchiveBuilder {
    builder: tar::Builder<GzEncoder<Vec<u8>>>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        Self {
            builder: tar::Builder::new(encoder),
        }
    }

    pub fn file(self, name: &str, data: &[u8]) -> Self {
        self.entry(name, EntryType::Regular, None, data)
    }

    pub fn dir(self, name: &str) -> Self {
        self.entry(name, EntryType::Directory, None, &[])
    }

    pub fn symlink(self, name: &str, target: &str) -> Self {
        self.entry(name, EntryType::Symlink, Some(target), &[])
    }

    fn entry(mut self, name: &str, kind: EntryType, link: Option<&str>, data: &[u8]) -> Self {
        let mut header = Header::new_gnu();
        let raw = name.as_bytes();
        header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
        header.set_entry_type(kind);
        header.set_size(data.len() as u64);
        header.set_mode(if kind.is_dir() { 0o755 } else { 0o644 });
        if let Some(target) = link {
            header
                .set_link_name(target)
                .expect("failed to set link name");
        }
        header.set_cksum();
        self.builder
            .append(&header, data)
            .expect("failed to append archive entry");
        self
    }

    /// Finish the archive and return the compressed bytes
    pub fn gzip(self) -> Vec<u8> {
        let encoder = self
            .builder
            .into_inner()
            .expect("failed to finish archive");
        encoder.finish().expect("failed to finish gzip stream")
    }
}
