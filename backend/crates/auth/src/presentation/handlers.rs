//! HTTP Handlers

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    ChangePasswordInput, ChangePasswordUseCase, CheckSessionUseCase, ForgotPasswordUseCase,
    OAuthCallbackInput, OAuthProviders, OAuthSignInUseCase, ResendVerificationUseCase,
    ResetPasswordInput, ResetPasswordUseCase, SessionManager, SignInInput, SignInUseCase,
    SignOutUseCase, SignUpInput, SignUpUseCase, VerifyEmailUseCase,
};
use crate::domain::mailer::EmailSender;
use crate::domain::oauth::OAuthProvider;
use crate::domain::repository::AuthStore;
use crate::domain::value_object::oauth_provider::OAuthProviderKind;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ChangePasswordRequest, CheckSessionResponse, EmailRequest, OAuthCallbackQuery,
    ResendVerificationResponse, ResetPasswordRequest, SignInRequest, SignUpRequest,
    SuccessResponse, VerifyEmailQuery,
};
use crate::presentation::middleware::SessionContext;

/// Shared state for auth handlers
pub struct AuthAppState<R, M, P> {
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub providers: Arc<OAuthProviders<P>>,
    pub config: Arc<AuthConfig>,
}

impl<R, M, P> Clone for AuthAppState<R, M, P> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            mailer: Arc::clone(&self.mailer),
            providers: Arc::clone(&self.providers),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R, M, P> AuthAppState<R, M, P> {
    pub fn new(repo: R, mailer: M, providers: OAuthProviders<P>, config: AuthConfig) -> Self {
        Self {
            repo: Arc::new(repo),
            mailer: Arc::new(mailer),
            providers: Arc::new(providers),
            config: Arc::new(config),
        }
    }
}

impl<R, M, P> AuthAppState<R, M, P>
where
    R: AuthStore,
{
    pub(crate) fn sessions(&self) -> SessionManager<R> {
        SessionManager::new(self.repo.clone(), self.config.clone())
    }
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/auth/signup
pub async fn sign_up<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    Json(req): Json<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let use_case = SignUpUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case
        .execute(SignUpInput {
            email: req.email,
            username: req.username,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(SuccessResponse::ok())))
}

// ============================================================================
// Sign In
// ============================================================================

/// POST /api/auth/signin
pub async fn sign_in<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    jar: CookieJar,
    Json(req): Json<SignInRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.config.clone());

    let issued = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let jar = jar.add(state.sessions().session_cookie(issued.token));
    Ok((jar, Json(SuccessResponse::ok())))
}

// ============================================================================
// Sign Out
// ============================================================================

/// POST /api/auth/signout
pub async fn sign_out<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let sessions = state.sessions();
    let token = jar
        .get(sessions.cookie_name())
        .map(|cookie| cookie.value().to_string());

    let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
    use_case.execute(token.as_deref()).await?;

    Ok((StatusCode::NO_CONTENT, jar.add(sessions.removal_cookie())))
}

// ============================================================================
// Session Check
// ============================================================================

/// GET /api/auth/check
pub async fn check_session(Extension(session): Extension<SessionContext>) -> Response {
    match CheckSessionUseCase::execute(session.0.as_ref()) {
        Some(user) => Json(CheckSessionResponse {
            authenticated: true,
            user: Some(user),
        })
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(CheckSessionResponse {
                authenticated: false,
                user: None,
            }),
        )
            .into_response(),
    }
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /api/auth/resend-verification
pub async fn resend_verification<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<ResendVerificationResponse>>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let use_case = ResendVerificationUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(req.email).await?;

    Ok(Json(ResendVerificationResponse {
        success: "Email verification sent",
    }))
}

/// GET /api/verify-email?token=…
///
/// Browser-facing: every outcome but a missing token is a redirect.
pub async fn verify_email<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    jar: CookieJar,
    Query(query): Query<VerifyEmailQuery>,
) -> AuthResult<Response>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let token = query
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::validation("token", "Token is required"))?;

    let use_case = VerifyEmailUseCase::new(state.repo.clone(), state.config.clone());

    match use_case.execute(&token).await {
        Ok(issued) => {
            let jar = jar.add(state.sessions().session_cookie(issued.token));
            Ok((jar, Redirect::to(&state.config.email_verified_redirect)).into_response())
        }
        Err(err) => {
            err.log();
            Ok(Redirect::to(&state.config.email_verification_failed_redirect).into_response())
        }
    }
}

// ============================================================================
// Passwords
// ============================================================================

/// POST /api/auth/forgot-password
pub async fn forgot_password<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<SuccessResponse>>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(req.email).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/auth/reset-password
pub async fn reset_password<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<SuccessResponse>>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let use_case = ResetPasswordUseCase::new(state.repo.clone(), state.config.clone());
    use_case
        .execute(ResetPasswordInput {
            token: req.token,
            password: req.password,
        })
        .await?;

    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/auth/change-password (requires a session)
pub async fn change_password<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    Extension(session): Extension<SessionContext>,
    jar: CookieJar,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let current = session.require()?;

    let use_case = ChangePasswordUseCase::new(state.repo.clone(), state.config.clone());
    let output = use_case
        .execute(
            &current.user.user_id,
            ChangePasswordInput {
                current_password: req.password,
                new_password: req.new_password,
                confirm_password: req.confirm_password,
                logout_from_all_devices: req.logout_from_all_devices,
            },
        )
        .await?;

    let jar = match output.new_session {
        Some(issued) => jar.add(state.sessions().session_cookie(issued.token)),
        None => jar,
    };

    Ok((jar, Json(SuccessResponse::ok())))
}

// ============================================================================
// OAuth
// ============================================================================

/// GET /api/oauth/{provider}/authorize
pub async fn oauth_authorize<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let kind: OAuthProviderKind = provider.parse()?;

    let use_case = OAuthSignInUseCase::new(
        state.repo.clone(),
        state.providers.clone(),
        state.config.clone(),
    );
    let redirect = use_case.begin(kind)?;

    let config = &state.config;
    let policy = config.cookie_policy();
    let ttl = Some(config.oauth_cookie_ttl);

    let jar = jar.add(policy.build(config.oauth_state_cookie.clone(), redirect.state, ttl));
    let jar = match redirect.code_verifier {
        Some(verifier) => jar.add(policy.build(config.oauth_verifier_cookie.clone(), verifier, ttl)),
        None => jar.add(policy.removal(config.oauth_verifier_cookie.clone())),
    };

    Ok((jar, Redirect::to(&redirect.url)))
}

/// GET /api/oauth/{provider}?code=…&state=…
///
/// The transient cookies are cleared whatever the outcome.
pub async fn oauth_callback<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> AuthResult<Response>
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let config = &state.config;
    let policy = config.cookie_policy();

    let input = OAuthCallbackInput {
        code: query.code,
        state: query.state,
        stored_state: jar
            .get(&config.oauth_state_cookie)
            .map(|cookie| cookie.value().to_string()),
        stored_code_verifier: jar
            .get(&config.oauth_verifier_cookie)
            .map(|cookie| cookie.value().to_string()),
    };

    let jar = jar
        .add(policy.removal(config.oauth_state_cookie.clone()))
        .add(policy.removal(config.oauth_verifier_cookie.clone()));

    let kind = match provider.parse::<OAuthProviderKind>() {
        Ok(kind) => kind,
        Err(err) => return Ok((jar, err).into_response()),
    };

    let use_case = OAuthSignInUseCase::new(
        state.repo.clone(),
        state.providers.clone(),
        state.config.clone(),
    );

    match use_case.complete(kind, input).await {
        Ok(issued) => {
            let jar = jar.add(state.sessions().session_cookie(issued.token));
            Ok((jar, Redirect::to(&config.sign_in_redirect)).into_response())
        }
        Err(err) => Ok((jar, err).into_response()),
    }
}
