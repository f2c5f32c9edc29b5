//! Bearer Link Tokens
//!
//! HS256 JWTs embedded in emailed links. Expiry is enforced with zero
//! leeway; the payload claims are purpose-specific.

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{AuthError, AuthResult, TokenRejection};

/// Claims of an email verification link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationClaims {
    pub email: String,
    pub code: String,
}

/// Claims of a password reset link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetClaims {
    pub email: String,
    pub reset_token: String,
}

#[derive(Serialize, Deserialize)]
struct Envelope<C> {
    #[serde(flatten)]
    claims: C,
    iat: u64,
    exp: u64,
}

#[derive(Clone)]
pub struct BearerTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl BearerTokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn issue<C: Serialize>(&self, claims: C, ttl: Duration) -> AuthResult<String> {
        self.issue_at(claims, ttl, Utc::now())
    }

    /// Sign with an explicit issue time
    pub fn issue_at<C: Serialize>(
        &self,
        claims: C,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> AuthResult<String> {
        let iat = u64::try_from(issued_at.timestamp()).unwrap_or(0);
        let envelope = Envelope {
            claims,
            iat,
            exp: iat.saturating_add(ttl.as_secs()),
        };

        encode(&Header::new(Algorithm::HS256), &envelope, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, returning the payload claims
    pub fn verify<C: DeserializeOwned>(&self, token: &str) -> AuthResult<C> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Envelope<C>>(token, &self.decoding, &validation)
            .map(|data| data.claims.claims)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => TokenRejection::Expired,
                    _ => TokenRejection::BadSignature,
                };
                tracing::debug!(error = %e, "Bearer token rejected");
                AuthError::InvalidToken(reason)
            })
    }
}

impl std::fmt::Debug for BearerTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerTokenCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> VerificationClaims {
        VerificationClaims {
            email: "jane@example.com".to_string(),
            code: "a1b2c3d4e5f6".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = BearerTokenCodec::new(b"secret");
        let token = codec.issue(claims(), Duration::from_secs(300)).unwrap();
        let decoded: VerificationClaims = codec.verify(&token).unwrap();
        assert_eq!(decoded, claims());
    }

    #[test]
    fn test_reset_claims_are_camel_case() {
        let json = serde_json::to_value(ResetClaims {
            email: "jane@example.com".to_string(),
            reset_token: "00ff".to_string(),
        })
        .unwrap();
        assert_eq!(json["resetToken"], "00ff");
    }

    #[test]
    fn test_expired_token() {
        let codec = BearerTokenCodec::new(b"secret");
        let issued_at = Utc::now() - chrono::Duration::minutes(6);
        let token = codec
            .issue_at(claims(), Duration::from_secs(300), issued_at)
            .unwrap();

        let err = codec.verify::<VerificationClaims>(&token).unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidToken(TokenRejection::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let token = BearerTokenCodec::new(b"secret")
            .issue(claims(), Duration::from_secs(300))
            .unwrap();

        let err = BearerTokenCodec::new(b"other")
            .verify::<VerificationClaims>(&token)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidToken(TokenRejection::BadSignature)
        ));
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        let codec = BearerTokenCodec::new(b"secret");
        let token = codec.issue(claims(), Duration::from_secs(300)).unwrap();
        assert!(codec.verify::<ResetClaims>(&token).is_err());
    }
}
