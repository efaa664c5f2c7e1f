use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use uuid::Uuid;

use crate::auth::{Claims, Scope};
use crate::crypto::SecretKey;

const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Mints tokens the way the node's token issuer would
pub struct TokenMinter<'a> {
    key: &'a SecretKey,
    audience: String,
    subject: String,
}

impl<'a> TokenMinter<'a> {
    pub fn new(key: &'a SecretKey, audience: impl Into<String>) -> Self {
        Self {
            key,
            audience: audience.into(),
            subject: "test-client".to_string(),
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// A fresh access token
    pub fn access(&self) -> String {
        self.mint(Scope::Access, Utc::now().timestamp() + DEFAULT_TTL.as_secs() as i64)
    }

    /// A fresh refresh token, never accepted on requests
    pub fn refresh(&self) -> String {
        self.mint(Scope::Refresh, Utc::now().timestamp() + DEFAULT_TTL.as_secs() as i64)
    }

    /// An access token that expired `ago`
    pub fn expired(&self, ago: Duration) -> String {
        self.mint(Scope::Access, Utc::now().timestamp() - ago.as_secs() as i64)
    }

    pub fn mint(&self, scopes: Scope, exp: i64) -> String {
        let claims = Claims {
            iss: self.key.public().to_hex(),
            sub: self.subject.clone(),
            aud: self.audience.clone(),
            exp,
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
            scopes,
        };
        let key = EncodingKey::from_ed_der(&self.key.to_pkcs8_der());
        encode(&Header::new(Algorithm::EdDSA), &claims, &key).expect("failed to sign token")
    }
}
