//! OAuth Sign In Use Case
//!
//! Authorization-code flow for Google and GitHub. `begin` produces the
//! provider redirect plus the `state` (and PKCE verifier) the caller keeps
//! in short-lived cookies; `complete` checks them against the callback and
//! resolves the local user.

use std::sync::Arc;

use platform::crypto::{constant_time_eq, random_hex, random_urlsafe};

use crate::application::config::AuthConfig;
use crate::application::session_manager::{IssuedSession, SessionManager};
use crate::domain::oauth::{OAuthIdentity, OAuthProvider};
use crate::domain::repository::{ExternalAccountRepository, SessionRepository, UserRepository};
use crate::domain::value_object::{oauth_provider::OAuthProviderKind, user_name::UserName};
use crate::error::{AuthError, AuthResult, OAuthRejection};

/// Random bytes in `state` and in the PKCE verifier
const OAUTH_SECRET_BYTES: usize = 32;

/// Random bytes in the last-resort username suffix
const USERNAME_SUFFIX_BYTES: usize = 4;

// ============================================================================
// Provider registry
// ============================================================================

/// Configured providers; an absent entry answers as an unknown provider
pub struct OAuthProviders<P> {
    google: Option<Arc<P>>,
    github: Option<Arc<P>>,
}

impl<P> Default for OAuthProviders<P> {
    fn default() -> Self {
        Self {
            google: None,
            github: None,
        }
    }
}

impl<P: OAuthProvider> OAuthProviders<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: P) -> Self {
        let provider = Arc::new(provider);
        match provider.kind() {
            OAuthProviderKind::Google => self.google = Some(provider),
            OAuthProviderKind::Github => self.github = Some(provider),
        }
        self
    }

    pub fn get(&self, kind: OAuthProviderKind) -> AuthResult<&P> {
        let provider = match kind {
            OAuthProviderKind::Google => self.google.as_deref(),
            OAuthProviderKind::Github => self.github.as_deref(),
        };
        provider.ok_or(AuthError::UnknownProvider)
    }
}

// ============================================================================
// Input / Output
// ============================================================================

/// Where to send the browser, and what to remember until it comes back
#[derive(Debug, Clone)]
pub struct AuthorizationRedirect {
    pub url: String,
    pub state: String,
    pub code_verifier: Option<String>,
}

/// Callback query parameters plus the values stored by `begin`
#[derive(Debug, Default)]
pub struct OAuthCallbackInput {
    pub code: Option<String>,
    pub state: Option<String>,
    pub stored_state: Option<String>,
    pub stored_code_verifier: Option<String>,
}

// ============================================================================
// Use case
// ============================================================================

pub struct OAuthSignInUseCase<R, P> {
    repo: Arc<R>,
    providers: Arc<OAuthProviders<P>>,
    sessions: SessionManager<R>,
}

impl<R, P> OAuthSignInUseCase<R, P>
where
    R: UserRepository + SessionRepository + ExternalAccountRepository,
    P: OAuthProvider + Sync,
{
    pub fn new(repo: Arc<R>, providers: Arc<OAuthProviders<P>>, config: Arc<AuthConfig>) -> Self {
        let sessions = SessionManager::new(Arc::clone(&repo), config);
        Self {
            repo,
            providers,
            sessions,
        }
    }

    pub fn begin(&self, kind: OAuthProviderKind) -> AuthResult<AuthorizationRedirect> {
        let provider = self.providers.get(kind)?;

        let state = random_urlsafe(OAUTH_SECRET_BYTES);
        let code_verifier = kind
            .uses_pkce()
            .then(|| random_urlsafe(OAUTH_SECRET_BYTES));

        let url = provider.authorization_url(&state, code_verifier.as_deref())?;

        Ok(AuthorizationRedirect {
            url,
            state,
            code_verifier,
        })
    }

    pub async fn complete(
        &self,
        kind: OAuthProviderKind,
        input: OAuthCallbackInput,
    ) -> AuthResult<IssuedSession> {
        let provider = self.providers.get(kind)?;

        let (Some(code), Some(state), Some(stored_state)) =
            (input.code, input.state, input.stored_state)
        else {
            return Err(AuthError::OAuthRequest(OAuthRejection::MissingParameters));
        };

        if kind.uses_pkce() && input.stored_code_verifier.is_none() {
            return Err(AuthError::OAuthRequest(OAuthRejection::MissingParameters));
        }

        if !constant_time_eq(state.as_bytes(), stored_state.as_bytes()) {
            return Err(AuthError::OAuthRequest(OAuthRejection::StateMismatch));
        }

        let code_verifier = input.stored_code_verifier.filter(|_| kind.uses_pkce());
        let tokens = provider
            .exchange_code(&code, code_verifier.as_deref())
            .await?;
        let profile = provider.fetch_profile(&tokens).await?;

        let identity = OAuthIdentity {
            provider: kind,
            profile,
            tokens,
        };
        let candidates = UserName::candidates(
            identity.username_seed(),
            &random_hex(USERNAME_SUFFIX_BYTES),
        );

        let user = self
            .repo
            .link_oauth_identity(&identity, &candidates)
            .await?;
        let issued = self.sessions.create_session(&user.user_id).await?;

        tracing::info!(user_id = %user.user_id, provider = %kind, "OAuth sign in");
        Ok(issued)
    }
}
