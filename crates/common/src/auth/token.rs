use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, SecretKey};

const BEARER_SCHEME: &str = "bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// No credential was presented
    #[error("no token")]
    NoToken,
    /// A well formed credential whose expiry has passed
    #[error("token expired")]
    Expired,
    /// Bad signature, wrong audience, wrong scope or garbage
    #[error("token invalid")]
    Invalid,
}

impl TokenError {
    /// Invalid credentials are refused outright, the rest just need a
    /// (fresh) token.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, TokenError::Invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuing node
    pub iss: String,
    /// Client the token was issued to
    pub sub: String,
    /// Protocol scope, must match the running protocol exactly
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub scopes: Scope,
}

/// Resolves the key tokens are checked against.
///
/// Always answers with the node's current public key; rotation is the
/// business of whoever owns the key.
pub trait KeyResolver {
    fn public_key(&self) -> PublicKey;
}

impl<F> KeyResolver for F
where
    F: Fn() -> PublicKey,
{
    fn public_key(&self) -> PublicKey {
        self()
    }
}

impl KeyResolver for SecretKey {
    fn public_key(&self) -> PublicKey {
        self.public()
    }
}

/// Pull the token out of an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    let header = header.map(str::trim).ok_or(TokenError::NoToken)?;
    let (scheme, token) = header.split_once(' ').ok_or(TokenError::NoToken)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(TokenError::NoToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(TokenError::NoToken);
    }
    Ok(token)
}

/// Validate an access token against the resolved key and protocol scope.
pub fn validate<K>(token: &str, keys: &K, scope: &str) -> Result<Claims, TokenError>
where
    K: KeyResolver + ?Sized,
{
    if token.trim().is_empty() {
        return Err(TokenError::NoToken);
    }

    let key = keys.public_key();
    let decoding_key = DecodingKey::from_ed_der(&key.to_bytes());

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.leeway = 0;
    validation.set_audience(&[scope]);
    validation.set_required_spec_claims(&["exp", "aud"]);

    let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.scopes != Scope::Access {
        return Err(TokenError::Invalid);
    }

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testkit::TokenMinter;

    const PROTOCOL: &str = "/cafe/1.0.0";

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
        assert_eq!(bearer_token(Some("bearer  abc ")), Ok("abc"));
        assert_eq!(bearer_token(None), Err(TokenError::NoToken));
        assert_eq!(bearer_token(Some("Bearer")), Err(TokenError::NoToken));
        assert_eq!(bearer_token(Some("Bearer   ")), Err(TokenError::NoToken));
        assert_eq!(bearer_token(Some("Basic abc")), Err(TokenError::NoToken));
    }

    #[test]
    fn test_valid_access_token() {
        let node = SecretKey::generate();
        let token = TokenMinter::new(&node, PROTOCOL)
            .subject("uploader")
            .access();

        let claims = validate(&token, &node, PROTOCOL).unwrap();
        assert_eq!(claims.sub, "uploader");
        assert_eq!(claims.aud, PROTOCOL);
        assert_eq!(claims.iss, node.public().to_hex());
        assert_eq!(claims.scopes, Scope::Access);
    }

    #[test]
    fn test_closure_resolver() {
        let node = SecretKey::generate();
        let public = node.public();
        let token = TokenMinter::new(&node, PROTOCOL).access();

        assert!(validate(&token, &|| public, PROTOCOL).is_ok());
    }

    #[test]
    fn test_empty_token() {
        let node = SecretKey::generate();
        assert_eq!(validate("", &node, PROTOCOL), Err(TokenError::NoToken));
        assert_eq!(validate("  ", &node, PROTOCOL), Err(TokenError::NoToken));
    }

    #[test]
    fn test_expired_token() {
        let node = SecretKey::generate();
        let token = TokenMinter::new(&node, PROTOCOL).expired(Duration::from_secs(30));
        let err = validate(&token, &node, PROTOCOL).unwrap_err();
        assert_eq!(err, TokenError::Expired);
        assert!(!err.is_forbidden());
    }

    #[test]
    fn test_foreign_key_is_invalid() {
        let node = SecretKey::generate();
        let impostor = SecretKey::generate();
        let token = TokenMinter::new(&impostor, PROTOCOL).access();

        let err = validate(&token, &node, PROTOCOL).unwrap_err();
        assert_eq!(err, TokenError::Invalid);
        assert!(err.is_forbidden());
    }

    #[test]
    fn test_wrong_protocol_is_invalid() {
        let node = SecretKey::generate();
        let token = TokenMinter::new(&node, "/cafe/0.9.0").access();
        assert_eq!(
            validate(&token, &node, PROTOCOL),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_refresh_token_is_invalid() {
        let node = SecretKey::generate();
        let token = TokenMinter::new(&node, PROTOCOL).refresh();
        assert_eq!(
            validate(&token, &node, PROTOCOL),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_garbage_is_invalid() {
        let node = SecretKey::generate();
        assert_eq!(
            validate("not.a.jwt", &node, PROTOCOL),
            Err(TokenError::Invalid)
        );
    }
}
