//! OAuth Provider Kind

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AuthError;

/// External identity providers supported for sign-in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProviderKind {
    #[display("google")]
    Google,
    #[display("github")]
    Github,
}

impl OAuthProviderKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Github => "github",
        }
    }

    /// Whether the authorization request carries a PKCE challenge
    pub const fn uses_pkce(&self) -> bool {
        matches!(self, Self::Google)
    }
}

impl FromStr for OAuthProviderKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google" => Ok(Self::Google),
            "github" => Ok(Self::Github),
            _ => Err(AuthError::UnknownProvider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(
            "google".parse::<OAuthProviderKind>().unwrap(),
            OAuthProviderKind::Google
        );
        assert_eq!(OAuthProviderKind::Github.to_string(), "github");
        assert!(matches!(
            "twitter".parse::<OAuthProviderKind>(),
            Err(AuthError::UnknownProvider)
        ));
    }

    #[test]
    fn test_pkce_only_for_google() {
        assert!(OAuthProviderKind::Google.uses_pkce());
        assert!(!OAuthProviderKind::Github.uses_pkce());
    }
}
