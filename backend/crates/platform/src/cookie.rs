//! Cookie Policy
//!
//! Builds `Set-Cookie` values with consistent attributes. Every cookie issued
//! through a [`CookiePolicy`] is `HttpOnly`; `Secure` is driven by the policy
//! (on in production).

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite as CookieSameSite};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl From<SameSite> for CookieSameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => CookieSameSite::Strict,
            SameSite::Lax => CookieSameSite::Lax,
            SameSite::None => CookieSameSite::None,
        }
    }
}

/// Attributes shared by every cookie the application sets
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            secure: true,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl CookiePolicy {
    /// Build a cookie; `max_age = None` yields a browser-session cookie
    pub fn build(
        &self,
        name: impl Into<String>,
        value: impl Into<String>,
        max_age: Option<Duration>,
    ) -> Cookie<'static> {
        let mut builder = Cookie::build((name.into(), value.into()))
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site.into())
            .path(self.path.clone());

        if let Some(max_age) = max_age {
            let secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
            builder = builder.max_age(time::Duration::seconds(secs));
        }

        builder.build()
    }

    /// Build a blank cookie that makes the browser drop `name`
    pub fn removal(&self, name: impl Into<String>) -> Cookie<'static> {
        let mut cookie = self.build(name, "", None);
        cookie.make_removal();
        cookie
    }
}

/// True if a `Set-Cookie` header value writes the cookie called `name`
pub fn sets_cookie(set_cookie: &str, name: &str) -> bool {
    set_cookie
        .split_once('=')
        .is_some_and(|(key, _)| key.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_cookie_attributes() {
        let policy = CookiePolicy::default();
        let cookie = policy
            .build("state", "abc123", Some(Duration::from_secs(600)))
            .to_string();

        assert!(cookie.starts_with("state=abc123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=600"));
    }

    #[test]
    fn test_insecure_policy_omits_secure() {
        let policy = CookiePolicy {
            secure: false,
            ..CookiePolicy::default()
        };
        let cookie = policy.build("auth_session", "token", None).to_string();

        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Max-Age"));
    }

    #[test]
    fn test_removal_cookie() {
        let cookie = CookiePolicy::default().removal("codeVerifier").to_string();

        assert!(cookie.starts_with("codeVerifier=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_sets_cookie() {
        assert!(sets_cookie("auth_session=abc; HttpOnly", "auth_session"));
        assert!(!sets_cookie("auth_session_old=abc; HttpOnly", "auth_session"));
        assert!(!sets_cookie("garbage", "auth_session"));
    }
}
