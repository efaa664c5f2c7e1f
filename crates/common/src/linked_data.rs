use std::fmt;
use std::str::FromStr;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use cid::multibase;
pub use cid::{Cid, Error as CidError};
pub use iroh_blobs::Hash;

use multihash::Multihash;

/// Multicodec for raw, unstructured bytes
pub const LD_RAW_CODEC: u64 = 0x55;
/// Multicodec for DAG-CBOR encoded blocks
pub const LD_CBOR_CODEC: u64 = 0x71;
/// Multihash code for BLAKE3, the hash iroh-blobs addresses content by
pub const BLAKE3_HASH_CODE: u64 = 0x1e;

const BLAKE3_HASH_SIZE: usize = 32;

/**
 * Links
 * =====
 * A link is a CIDv1 over the BLAKE3 hash that the blob store
 *  already addresses content by, tagged with the codec of the
 *  block it points at. Raw uploads are LD_RAW_CODEC links,
 *  directories are LD_CBOR_CODEC links.
 * Equal content always yields an equal link.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(Cid);

impl Default for Link {
    fn default() -> Self {
        Link::new(LD_RAW_CODEC, Hash::from_bytes([0; BLAKE3_HASH_SIZE]))
    }
}

impl Link {
    pub fn new(codec: u64, hash: Hash) -> Self {
        // a 32 byte digest always fits the default 64 byte multihash
        let mh = Multihash::<64>::wrap(BLAKE3_HASH_CODE, hash.as_bytes())
            .expect("blake3 digest fits in multihash");
        Link(Cid::new_v1(codec, mh))
    }

    pub fn codec(&self) -> u64 {
        self.0.codec()
    }

    pub fn cid(&self) -> &Cid {
        &self.0
    }

    /// The blob store hash this link resolves to
    pub fn hash(&self) -> Hash {
        let mut bytes = [0u8; BLAKE3_HASH_SIZE];
        let digest = self.0.hash().digest();
        let len = digest.len().min(BLAKE3_HASH_SIZE);
        bytes[..len].copy_from_slice(&digest[..len]);
        Hash::from_bytes(bytes)
    }
}

impl From<Cid> for Link {
    fn from(cid: Cid) -> Self {
        Link(cid)
    }
}

impl From<Link> for Cid {
    fn from(link: Link) -> Self {
        link.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.to_string_of_base(multibase::Base::Base32Lower) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for Link {
    type Err = CidError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Link(Cid::try_from(s)?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("dag-cbor encode error: {0}")]
    Encode(String),
    #[error("dag-cbor decode error: {0}")]
    Decode(String),
}

/// Marker for the codec a block is encoded with
pub struct DagCborCodec;

/// Types that are stored in the blob store as encoded blocks.
pub trait BlockEncoded<C>: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
