//! Node identity keys
//!
//! Every cafe node owns a single Ed25519 keypair. The public half is what
//! bearer tokens are verified against (see [`crate::auth`]), and its hex
//! encoding doubles as the node's account address when none is configured.
//!
//! Keys are thin wrappers around iroh's key types so that the same identity
//! can later be used on the peer-to-peer side without conversion.

mod keys;

pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
