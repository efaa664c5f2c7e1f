//! Bearer token verification
//!
//! Requests that write to the store carry `Authorization: Bearer <jwt>`.
//! Tokens are EdDSA JWTs signed by the node's own identity key, scoped to
//! the protocol the node is running via the `aud` claim. Verification is
//! stateless: nothing here caches keys or remembers tokens.

mod token;

pub use token::{bearer_token, validate, Claims, KeyResolver, Scope, TokenError};
