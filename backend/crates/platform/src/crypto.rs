//! Cryptographic Utilities
//!
//! Random material for one-time codes, OAuth `state` and PKCE verifiers,
//! plus constant-time comparison of secrets.

use base64::{Engine, engine::general_purpose};
use rand::{RngCore, rngs::OsRng};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// `len` random bytes, lowercase hex encoded (2 * len characters)
pub fn random_hex(len: usize) -> String {
    hex::encode(random_bytes(len))
}

/// `len` random bytes, base64url without padding
///
/// 32 bytes yield 43 characters, a valid PKCE code verifier.
pub fn random_urlsafe(len: usize) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes(len))
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_hex_decodes_to_requested_length() {
        let decoded = hex::decode(random_hex(10)).unwrap();
        assert_eq!(decoded.len(), 10);
    }

    #[test]
    fn test_random_bytes() {
        let bytes = random_bytes(32);
        assert_eq!(bytes.len(), 32);
        assert!(bytes.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_random_hex_shape() {
        let code = random_hex(6);
        assert_eq!(code.len(), 12);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(random_hex(6), random_hex(6));
    }

    #[test]
    fn test_random_urlsafe_is_pkce_compatible() {
        let verifier = random_urlsafe(32);
        assert_eq!(verifier.len(), 43);
        assert!(
            verifier
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"a1b2c3", b"a1b2c3"));
        assert!(!constant_time_eq(b"a1b2c3", b"a1b2c4"));
        assert!(!constant_time_eq(b"a1b2c3", b"a1b2c"));
    }
}
