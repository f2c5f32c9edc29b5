//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::STANDARD};
use platform::cookie::CookiePolicy;
use rand::RngCore;
use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

const DAY: u64 = 24 * 3600;

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Session lifetime; rotation happens once less than half remains
    pub session_ttl: Duration,
    /// `Max-Age` of the session cookie (`None` = browser-session cookie)
    pub session_cookie_max_age: Option<Duration>,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// HS256 secret for verification and reset links
    pub token_secret: Vec<u8>,
    pub verification_token_ttl: Duration,
    pub reset_token_ttl: Duration,
    pub reset_record_ttl: Duration,
    /// Minimum gap between two verification emails
    pub resend_cooldown: Duration,
    /// Origin used in emailed links and OAuth redirect URIs, no trailing slash
    pub public_base_url: String,
    pub oauth_state_cookie: String,
    pub oauth_verifier_cookie: String,
    pub oauth_cookie_ttl: Duration,
    pub sign_in_redirect: String,
    pub email_verified_redirect: String,
    pub email_verification_failed_redirect: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "auth_session".to_string(),
            session_secret: [0u8; 32],
            session_ttl: Duration::from_secs(30 * DAY),
            session_cookie_max_age: None,
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            token_secret: Vec::new(),
            verification_token_ttl: Duration::from_secs(5 * 60),
            reset_token_ttl: Duration::from_secs(3600),
            reset_record_ttl: Duration::from_secs(3600),
            resend_cooldown: Duration::from_secs(60),
            public_base_url: "http://localhost:3000".to_string(),
            oauth_state_cookie: "state".to_string(),
            oauth_verifier_cookie: "codeVerifier".to_string(),
            oauth_cookie_ttl: Duration::from_secs(10 * 60),
            sign_in_redirect: "/dashboard".to_string(),
            email_verified_redirect: "/email-verified".to_string(),
            email_verification_failed_redirect: "/email-verification-failed".to_string(),
        }
    }
}

impl AuthConfig {
    /// Create config with random secrets (for development and tests)
    pub fn with_random_secret() -> Self {
        let mut session_secret = [0u8; 32];
        rand::rng().fill_bytes(&mut session_secret);
        let mut token_secret = vec![0u8; 32];
        rand::rng().fill_bytes(&mut token_secret);

        Self {
            session_secret,
            token_secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`
    ///
    /// Outside production, absent secrets are generated and cookies are not
    /// marked `Secure`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = lookup("APP_ENV").is_some_and(|env| env == "production");
        let mut config = if production {
            Self::with_random_secret()
        } else {
            Self::development()
        };

        match lookup("AUTH_SESSION_SECRET") {
            Some(encoded) => config.session_secret = decode_session_secret(&encoded)?,
            None if production => return Err(ConfigError::Missing("AUTH_SESSION_SECRET")),
            None => {}
        }

        match lookup("TOKEN_SECRET") {
            Some(secret) if !secret.is_empty() => config.token_secret = secret.into_bytes(),
            _ if production => return Err(ConfigError::Missing("TOKEN_SECRET")),
            _ => {}
        }

        if let Some(base_url) = lookup("PUBLIC_BASE_URL") {
            config.public_base_url = base_url.trim_end_matches('/').to_string();
        }

        if let Some(name) = lookup("SESSION_COOKIE_NAME") {
            config.session_cookie_name = name;
        }

        Ok(config)
    }

    /// Cookie attributes shared by the session and OAuth cookies
    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            secure: self.cookie_secure,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
        }
    }

    /// Absolute URL under the public origin
    pub fn public_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url, path)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        to_chrono(self.session_ttl)
    }

    pub fn resend_cooldown(&self) -> chrono::Duration {
        to_chrono(self.resend_cooldown)
    }

    pub fn reset_record_ttl(&self) -> chrono::Duration {
        to_chrono(self.reset_record_ttl)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

fn decode_session_secret(encoded: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ConfigError::Invalid {
            name: "AUTH_SESSION_SECRET",
            reason: e.to_string(),
        })?;

    bytes.try_into().map_err(|bytes: Vec<u8>| ConfigError::Invalid {
        name: "AUTH_SESSION_SECRET",
        reason: format!("expected 32 bytes, got {}", bytes.len()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_cookie_name, "auth_session");
        assert_eq!(config.session_ttl, Duration::from_secs(30 * DAY));
        assert_eq!(config.resend_cooldown, Duration::from_secs(60));
        assert_eq!(config.oauth_state_cookie, "state");
        assert_eq!(config.oauth_verifier_cookie, "codeVerifier");
        assert!(config.session_cookie_max_age.is_none());
    }

    #[test]
    fn test_development_generates_secrets() {
        let config = AuthConfig::from_lookup(lookup(&[])).unwrap();
        assert!(!config.cookie_secure);
        assert_ne!(config.session_secret, [0u8; 32]);
        assert_eq!(config.token_secret.len(), 32);
    }

    #[test]
    fn test_production_requires_secrets() {
        let result = AuthConfig::from_lookup(lookup(&[("APP_ENV", "production")]));
        assert!(matches!(
            result,
            Err(ConfigError::Missing("AUTH_SESSION_SECRET"))
        ));

        let secret = STANDARD.encode([7u8; 32]);
        let result = AuthConfig::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("AUTH_SESSION_SECRET", &secret),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("TOKEN_SECRET"))));
    }

    #[test]
    fn test_production_config() {
        let secret = STANDARD.encode([7u8; 32]);
        let config = AuthConfig::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("AUTH_SESSION_SECRET", &secret),
            ("TOKEN_SECRET", "token-secret"),
            ("PUBLIC_BASE_URL", "https://links.example.com/"),
        ]))
        .unwrap();

        assert!(config.cookie_secure);
        assert_eq!(config.session_secret, [7u8; 32]);
        assert_eq!(config.token_secret, b"token-secret");
        assert_eq!(
            config.public_url("/api/verify-email"),
            "https://links.example.com/api/verify-email"
        );
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let secret = STANDARD.encode([1u8; 16]);
        let result = AuthConfig::from_lookup(lookup(&[("AUTH_SESSION_SECRET", &secret)]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
