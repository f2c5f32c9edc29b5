//! OAuth Provider Clients
//!
//! Authorization-code grant against Google (with PKCE) and GitHub through the
//! `oauth2` crate; user-info calls go through `reqwest`.

use std::time::Duration;

use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::application::oauth_sign_in::OAuthProviders;
use crate::domain::oauth::{OAuthProfile, OAuthProvider, OAuthTokens};
use crate::domain::value_object::{email::Email, oauth_provider::OAuthProviderKind};
use crate::error::{AuthError, AuthResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// GitHub rejects API calls without a User-Agent
const USER_AGENT: &str = concat!("linkbio-auth/", env!("CARGO_PKG_VERSION"));

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_EMAILS_URL: &str = "https://api.github.com/user/emails";

/// OAuth client with auth URL, token URL and redirect URL set
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl OAuthClientConfig {
    /// `None` when either variable is absent or empty
    pub fn from_lookup<F>(kind: OAuthProviderKind, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (id_var, secret_var) = match kind {
            OAuthProviderKind::Google => ("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            OAuthProviderKind::Github => ("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
        };

        let client_id = lookup(id_var).filter(|v| !v.is_empty())?;
        let client_secret = lookup(secret_var).filter(|v| !v.is_empty())?;
        Some(Self {
            client_id,
            client_secret,
        })
    }
}

/// Build every provider whose credentials are present
pub fn providers_from_lookup<F>(
    public_base_url: &str,
    lookup: F,
) -> AuthResult<OAuthProviders<HttpOAuthProvider>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut providers = OAuthProviders::new();

    for kind in [OAuthProviderKind::Google, OAuthProviderKind::Github] {
        match OAuthClientConfig::from_lookup(kind, &lookup) {
            Some(credentials) => {
                providers = providers.with(HttpOAuthProvider::new(
                    kind,
                    credentials,
                    public_base_url,
                )?);
                tracing::info!(provider = %kind, "OAuth provider enabled");
            }
            None => tracing::info!(provider = %kind, "OAuth provider disabled"),
        }
    }

    Ok(providers)
}

pub fn providers_from_env(public_base_url: &str) -> AuthResult<OAuthProviders<HttpOAuthProvider>> {
    providers_from_lookup(public_base_url, |name| std::env::var(name).ok())
}

// ============================================================================
// Provider responses
// ============================================================================

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

// ============================================================================
// HTTP provider
// ============================================================================

pub struct HttpOAuthProvider {
    kind: OAuthProviderKind,
    client: ConfiguredClient,
    http: reqwest::Client,
}

impl HttpOAuthProvider {
    pub fn new(
        kind: OAuthProviderKind,
        credentials: OAuthClientConfig,
        public_base_url: &str,
    ) -> AuthResult<Self> {
        let (auth_url, token_url) = match kind {
            OAuthProviderKind::Google => (GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL),
            OAuthProviderKind::Github => (GITHUB_AUTH_URL, GITHUB_TOKEN_URL),
        };
        let redirect_url = format!("{public_base_url}/api/oauth/{kind}");

        let client = BasicClient::new(ClientId::new(credentials.client_id))
            .set_client_secret(ClientSecret::new(credentials.client_secret))
            .set_auth_uri(AuthUrl::new(auth_url.to_string()).map_err(invalid_url)?)
            .set_token_uri(TokenUrl::new(token_url.to_string()).map_err(invalid_url)?)
            .set_redirect_uri(RedirectUrl::new(redirect_url).map_err(invalid_url)?);

        // Token and user-info endpoints never redirect
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AuthError::Internal(format!("Failed to build OAuth client: {e}")))?;

        Ok(Self { kind, client, http })
    }

    fn scopes(&self) -> &'static [&'static str] {
        match self.kind {
            OAuthProviderKind::Google => &["email", "profile"],
            OAuthProviderKind::Github => &["user:email"],
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, access_token: &str) -> AuthResult<T> {
        self.http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::OAuthUpstream(format!("{url}: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::OAuthUpstream(format!("{url}: {e}")))
    }

    async fn google_profile(&self, access_token: &str) -> AuthResult<OAuthProfile> {
        let info: GoogleUserInfo = self.get_json(GOOGLE_USERINFO_URL, access_token).await?;

        let email = info
            .email
            .filter(|_| info.verified_email)
            .ok_or(AuthError::OAuthEmailUnavailable)?;

        Ok(OAuthProfile {
            provider_account_id: info.id,
            email: Email::new(email).map_err(|_| AuthError::OAuthEmailUnavailable)?,
            display_name: info.name,
            login: None,
            avatar_url: info.picture,
        })
    }

    async fn github_profile(&self, access_token: &str) -> AuthResult<OAuthProfile> {
        let user: GithubUser = self.get_json(GITHUB_USER_URL, access_token).await?;

        let email = match user.email.filter(|e| !e.is_empty()) {
            Some(email) => email,
            None => {
                let emails: Vec<GithubEmail> =
                    self.get_json(GITHUB_EMAILS_URL, access_token).await?;
                emails
                    .into_iter()
                    .find(|e| e.primary && e.verified)
                    .map(|e| e.email)
                    .ok_or(AuthError::OAuthEmailUnavailable)?
            }
        };

        Ok(OAuthProfile {
            provider_account_id: user.id.to_string(),
            email: Email::new(email).map_err(|_| AuthError::OAuthEmailUnavailable)?,
            display_name: user.name,
            login: Some(user.login),
            avatar_url: user.avatar_url,
        })
    }
}

impl OAuthProvider for HttpOAuthProvider {
    fn kind(&self) -> OAuthProviderKind {
        self.kind
    }

    fn authorization_url(&self, state: &str, code_verifier: Option<&str>) -> AuthResult<String> {
        let mut request = self
            .client
            .authorize_url(|| CsrfToken::new(state.to_string()));

        for scope in self.scopes() {
            request = request.add_scope(Scope::new((*scope).to_string()));
        }

        if let Some(verifier) = code_verifier {
            let verifier = PkceCodeVerifier::new(verifier.to_string());
            request = request.set_pkce_challenge(PkceCodeChallenge::from_code_verifier_sha256(
                &verifier,
            ));
        }

        if self.kind == OAuthProviderKind::Google {
            request = request
                .add_extra_param("prompt", "consent")
                .add_extra_param("access_type", "offline");
        }

        let (url, _) = request.url();
        Ok(url.to_string())
    }

    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> AuthResult<OAuthTokens> {
        let mut request = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()));

        if let Some(verifier) = code_verifier {
            request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_string()));
        }

        let response = request.request_async(&self.http).await.map_err(|e| {
            AuthError::OAuthUpstream(format!("{} token exchange failed: {e}", self.kind))
        })?;

        let expires_at = response
            .expires_in()
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| Utc::now() + ttl);

        Ok(OAuthTokens {
            access_token: response.access_token().secret().clone(),
            refresh_token: response.refresh_token().map(|t| t.secret().clone()),
            expires_at,
        })
    }

    async fn fetch_profile(&self, tokens: &OAuthTokens) -> AuthResult<OAuthProfile> {
        match self.kind {
            OAuthProviderKind::Google => self.google_profile(&tokens.access_token).await,
            OAuthProviderKind::Github => self.github_profile(&tokens.access_token).await,
        }
    }
}

fn invalid_url(err: oauth2::url::ParseError) -> AuthError {
    AuthError::Internal(format!("Invalid OAuth URL: {err}"))
}

// ============================================================================
// Scripted provider
// ============================================================================

/// Answers every exchange with a fixed profile
#[cfg(test)]
pub struct ScriptedOAuthProvider {
    kind: OAuthProviderKind,
    profile: OAuthProfile,
    fail_exchange: bool,
}

#[cfg(test)]
impl ScriptedOAuthProvider {
    pub fn google(email: &str) -> Self {
        Self {
            kind: OAuthProviderKind::Google,
            profile: OAuthProfile {
                provider_account_id: "google-1".to_string(),
                email: Email::new(email).expect("valid scripted email"),
                display_name: Some("Jane Doe".to_string()),
                login: None,
                avatar_url: Some("https://lh3.googleusercontent.com/a/photo".to_string()),
            },
            fail_exchange: false,
        }
    }

    pub fn github(email: &str, login: &str) -> Self {
        Self {
            kind: OAuthProviderKind::Github,
            profile: OAuthProfile {
                provider_account_id: "583231".to_string(),
                email: Email::new(email).expect("valid scripted email"),
                display_name: None,
                login: Some(login.to_string()),
                avatar_url: None,
            },
            fail_exchange: false,
        }
    }

    pub fn failing_exchange(mut self) -> Self {
        self.fail_exchange = true;
        self
    }
}

#[cfg(test)]
impl OAuthProvider for ScriptedOAuthProvider {
    fn kind(&self) -> OAuthProviderKind {
        self.kind
    }

    fn authorization_url(&self, state: &str, code_verifier: Option<&str>) -> AuthResult<String> {
        let mut url = format!("https://{}.test/authorize?state={state}", self.kind);
        if let Some(verifier) = code_verifier {
            let challenge = PkceCodeChallenge::from_code_verifier_sha256(&PkceCodeVerifier::new(
                verifier.to_string(),
            ));
            url.push_str("&code_challenge=");
            url.push_str(challenge.as_str());
        }
        Ok(url)
    }

    async fn exchange_code(
        &self,
        _code: &str,
        _code_verifier: Option<&str>,
    ) -> AuthResult<OAuthTokens> {
        if self.fail_exchange {
            return Err(AuthError::OAuthUpstream("scripted exchange failure".to_string()));
        }
        Ok(OAuthTokens {
            access_token: "scripted-access-token".to_string(),
            refresh_token: None,
            expires_at: None,
        })
    }

    async fn fetch_profile(&self, _tokens: &OAuthTokens) -> AuthResult<OAuthProfile> {
        Ok(self.profile.clone())
    }
}
