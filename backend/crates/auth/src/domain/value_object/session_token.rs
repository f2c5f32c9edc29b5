//! Session Token Value Object
//!
//! The value stored in the session cookie:
//! `{session_id}.{expires_at_ms}.{mac}` where `mac` is the unpadded
//! base64url HMAC-SHA256 of `{session_id}.{expires_at_ms}` under the server
//! secret. The token never carries the user id; the session row does.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken {
    pub session_id: Uuid,
    pub expires_at_ms: i64,
}

impl SessionToken {
    pub fn new(session_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            session_id,
            expires_at_ms: expires_at.timestamp_millis(),
        }
    }

    fn payload(&self) -> String {
        format!("{}.{}", self.session_id, self.expires_at_ms)
    }

    fn mac(secret: &[u8]) -> AuthResult<HmacSha256> {
        HmacSha256::new_from_slice(secret).map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Render the cookie value
    pub fn sign(&self, secret: &[u8]) -> AuthResult<String> {
        let payload = self.payload();
        let mut mac = Self::mac(secret)?;
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Parse a cookie value, returning `None` unless the MAC verifies
    ///
    /// Expiry is not checked here.
    pub fn verify(value: &str, secret: &[u8]) -> Option<Self> {
        let mut parts = value.splitn(3, '.');
        let session_id = parts.next()?;
        let expires_at_ms = parts.next()?;
        let signature = parts.next()?;

        let token = Self {
            session_id: Uuid::parse_str(session_id).ok()?,
            expires_at_ms: expires_at_ms.parse().ok()?,
        };
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = Self::mac(secret).ok()?;
        mac.update(token.payload().as_bytes());
        // verify_slice compares in constant time
        mac.verify_slice(&signature).ok()?;

        Some(token)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_ms <= now.timestamp_millis()
    }
}
