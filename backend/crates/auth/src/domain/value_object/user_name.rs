//! User Name Value Object
//!
//! The public handle shown on a profile page. Input keeps its original
//! casing for display; uniqueness is decided on the lowercase canonical
//! form.
//!
//! ## Invariants
//! - Length: 1..=40 characters
//! - Characters: ASCII letters, digits, `_` and `-`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthError, AuthResult};

// ============================================================================
// Constants
// ============================================================================

pub const USER_NAME_MAX_LENGTH: usize = 40;

/// Longest seed used when deriving a handle from an external identity
pub const SEED_MAX_LENGTH: usize = 31;

/// Numbered suffixes tried before falling back to a random one
pub const MAX_NUMBERED_SUFFIX: u32 = 50;

const FALLBACK_SEED: &str = "user";

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

// ============================================================================
// UserName
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserName {
    original: String,
    canonical: String,
}

impl UserName {
    pub fn new(input: impl AsRef<str>) -> AuthResult<Self> {
        let original = input.as_ref().trim();

        if original.is_empty() {
            return Err(AuthError::validation("username", "Required"));
        }

        if original.chars().count() > USER_NAME_MAX_LENGTH {
            return Err(AuthError::validation(
                "username",
                format!("Username must be at most {} characters", USER_NAME_MAX_LENGTH),
            ));
        }

        if !original.chars().all(is_allowed_char) {
            return Err(AuthError::validation(
                "username",
                "Username may only contain letters, numbers, underscores and hyphens",
            ));
        }

        Ok(Self {
            original: original.to_string(),
            canonical: original.to_ascii_lowercase(),
        })
    }

    /// Restore from persisted columns
    pub fn from_db(original: impl Into<String>) -> Self {
        let original = original.into();
        let canonical = original.to_ascii_lowercase();
        Self {
            original,
            canonical,
        }
    }

    /// Display form, as the user typed it
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Lowercase form used for uniqueness
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Candidate handles derived from an external login or email local part
    ///
    /// Yields the sanitized seed, then `seed2` through `seed50`, then one
    /// `seed-<8 hex>` built from `random_suffix`.
    pub fn candidates(seed: &str, random_suffix: &str) -> Vec<UserName> {
        let base = Self::sanitize_seed(seed);

        std::iter::once(base.clone())
            .chain((2..=MAX_NUMBERED_SUFFIX).map(|n| format!("{base}{n}")))
            .chain(std::iter::once(format!("{base}-{random_suffix}")))
            .filter_map(|candidate| UserName::new(candidate).ok())
            .collect()
    }

    fn sanitize_seed(seed: &str) -> String {
        let cleaned: String = seed
            .chars()
            .filter(|c| is_allowed_char(*c))
            .take(SEED_MAX_LENGTH)
            .collect();

        if cleaned.is_empty() {
            FALLBACK_SEED.to_string()
        } else {
            cleaned
        }
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
