//! Web URL Value Object
//!
//! Links shown on a public page. Only absolute `http` / `https` URLs with a
//! host are accepted, so a stored link can never carry a `javascript:` or
//! `data:` payload.

use serde::Serialize;
use std::fmt;

use crate::error::{ProfileError, ProfileResult};

const WEB_URL_MAX_LENGTH: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WebUrl(String);

impl WebUrl {
    pub fn parse(field: &'static str, input: &str) -> ProfileResult<Self> {
        let url = input.trim();

        if url.is_empty() {
            return Err(ProfileError::validation(field, "Required"));
        }
        if url.len() > WEB_URL_MAX_LENGTH {
            return Err(ProfileError::validation(field, "URL is too long"));
        }

        let lower = url.to_ascii_lowercase();
        let rest = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"))
            .ok_or_else(|| ProfileError::validation(field, "URL must start with http:// or https://"))?;

        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        if host.is_empty() || url.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ProfileError::validation(field, "URL is invalid"));
        }

        Ok(Self(url.to_string()))
    }

    /// Blank input is no URL at all
    pub fn parse_optional(field: &'static str, input: Option<&str>) -> ProfileResult<Option<Self>> {
        match input.map(str::trim) {
            None | Some("") => Ok(None),
            Some(url) => Self::parse(field, url).map(Some),
        }
    }

    /// Restore from a stored column (already validated)
    pub fn from_db(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_web_urls() {
        assert!(WebUrl::parse("url", "https://example.com").is_ok());
        assert!(WebUrl::parse("url", "HTTP://example.com/a?b=c#d").is_ok());
        assert_eq!(
            WebUrl::parse("url", "  https://x.dev/p ").unwrap().as_str(),
            "https://x.dev/p"
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(WebUrl::parse("url", "javascript:alert(1)").is_err());
        assert!(WebUrl::parse("url", "data:text/html,hi").is_err());
        assert!(WebUrl::parse("url", "example.com").is_err());
        assert!(WebUrl::parse("url", "https://").is_err());
        assert!(WebUrl::parse("url", "https:///path").is_err());
        assert!(WebUrl::parse("url", "https://exa mple.com").is_err());
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(WebUrl::parse_optional("image", Some("  ")).unwrap(), None);
        assert_eq!(WebUrl::parse_optional("image", None).unwrap(), None);
        let err = WebUrl::parse_optional("image", Some("ftp://x.com")).unwrap_err();
        assert_eq!(err.key(), Some("image"));
    }
}
