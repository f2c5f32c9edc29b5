//! OAuth Provider Port
//!
//! One implementation per configured provider. The application layer owns
//! the state/PKCE handshake; providers only build URLs and talk HTTP.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{email::Email, oauth_provider::OAuthProviderKind};
use crate::error::AuthResult;

/// Tokens returned by the authorization-code exchange
#[derive(Debug, Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Identity reported by the provider's user-info endpoint
///
/// `email` is always one the provider marked as verified.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub provider_account_id: String,
    pub email: Email,
    pub display_name: Option<String>,
    /// Provider handle (GitHub login), preferred as username seed
    pub login: Option<String>,
    pub avatar_url: Option<String>,
}

/// Everything needed to resolve a local user for a provider sign-in
#[derive(Debug, Clone)]
pub struct OAuthIdentity {
    pub provider: OAuthProviderKind,
    pub profile: OAuthProfile,
    pub tokens: OAuthTokens,
}

impl OAuthIdentity {
    /// Seed for a new account's username
    pub fn username_seed(&self) -> &str {
        self.profile
            .login
            .as_deref()
            .unwrap_or_else(|| self.profile.email.local_part())
    }
}

#[trait_variant::make(OAuthProvider: Send)]
pub trait LocalOAuthProvider {
    fn kind(&self) -> OAuthProviderKind;

    /// Provider authorization URL carrying `state` and, when given, the
    /// S256 challenge of `code_verifier`
    fn authorization_url(&self, state: &str, code_verifier: Option<&str>) -> AuthResult<String>;

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> AuthResult<OAuthTokens>;

    async fn fetch_profile(&self, tokens: &OAuthTokens) -> AuthResult<OAuthProfile>;
}
