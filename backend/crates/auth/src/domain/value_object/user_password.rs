//! User Password Value Object
//!
//! Domain wrapper over `platform::password`. Policy violations surface as
//! `AuthError::Validation` on the field that carried the password, so the
//! same type serves sign-up, reset and change-password forms.

use platform::password::{ClearTextPassword, HashedPassword, PasswordPolicyError};
use std::fmt;

use crate::error::{AuthError, AuthResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input
///
/// Memory is zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Validate a newly chosen password reported against `field`
    pub fn new(raw: String, field: &'static str) -> AuthResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| {
            let message = match e {
                PasswordPolicyError::TooShort { min, .. } => {
                    format!("Password must be at least {} characters", min)
                }
                PasswordPolicyError::TooLong { max, .. } => {
                    format!("Password must be at most {} characters", max)
                }
                PasswordPolicyError::EmptyOrWhitespace => "Required".to_string(),
                PasswordPolicyError::InvalidCharacter => {
                    "Password contains invalid characters".to_string()
                }
            };
            AuthError::validation(field, message)
        })?;

        Ok(Self(clear_text))
    }

    /// Wrap a password that will only be compared against a stored hash
    pub fn for_verification(raw: String) -> Self {
        Self(ClearTextPassword::for_verification(raw))
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id hash in PHC format, safe to persist
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword) -> AuthResult<Self> {
        let hashed = raw
            .0
            .hash()
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Self(hashed))
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> AuthResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|_| AuthError::Internal("Invalid password hash in database".to_string()))?;
        Ok(Self(hashed))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword) -> bool {
        self.0.verify(&raw.0)
    }

    pub fn needs_rehash(&self) -> bool {
        self.0.needs_rehash()
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_error_names_field() {
        let err = RawPassword::new("short".to_string(), "newPassword").unwrap_err();
        match err {
            AuthError::Validation { field, message } => {
                assert_eq!(field, "newPassword");
                assert_eq!(message, "Password must be at least 8 characters");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_blank_password_is_required() {
        let err = RawPassword::new("   ".to_string(), "password").unwrap_err();
        assert_eq!(err.to_string(), "Required");
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("correct horse battery".to_string(), "password").unwrap();
        let hashed = UserPassword::from_raw(&raw).unwrap();

        assert!(hashed.verify(&RawPassword::for_verification(
            "correct horse battery".to_string()
        )));
        assert!(!hashed.verify(&RawPassword::for_verification(
            "wrong horse battery".to_string()
        )));
        assert!(!hashed.needs_rehash());
    }

    #[test]
    fn test_phc_roundtrip() {
        let raw = RawPassword::new("correct horse battery".to_string(), "password").unwrap();
        let hashed = UserPassword::from_raw(&raw).unwrap();
        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert_eq!(hashed, restored);
        assert!(UserPassword::from_phc_string("garbage").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::for_verification("hunter2hunter2".to_string());
        assert!(!format!("{raw:?}").contains("hunter2"));
    }
}
