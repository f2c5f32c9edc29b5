//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::domain::mailer::EmailSender;
use crate::domain::oauth::OAuthProvider;
use crate::domain::repository::AuthStore;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::resolve_session;

/// Every auth route behind the session middleware, mounted at the root
pub fn auth_router<R, M, P>(state: AuthAppState<R, M, P>) -> Router
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    with_sessions(auth_routes(state.clone()), state)
}

/// Resolve the session cookie for every route of `router`
///
/// Handlers read the outcome through `Extension<SessionContext>`, so other
/// crates' routes can be merged in before this is applied.
pub fn with_sessions<R, M, P>(router: Router, state: AuthAppState<R, M, P>) -> Router
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        state,
        resolve_session::<R, M, P>,
    ))
}

/// Auth routes without the session middleware
pub fn auth_routes<R, M, P>(state: AuthAppState<R, M, P>) -> Router
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    Router::new()
        .route("/api/auth/signup", post(handlers::sign_up::<R, M, P>))
        .route("/api/auth/signin", post(handlers::sign_in::<R, M, P>))
        .route("/api/auth/signout", post(handlers::sign_out::<R, M, P>))
        .route("/api/auth/check", get(handlers::check_session))
        .route(
            "/api/auth/resend-verification",
            post(handlers::resend_verification::<R, M, P>),
        )
        .route(
            "/api/auth/forgot-password",
            post(handlers::forgot_password::<R, M, P>),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::reset_password::<R, M, P>),
        )
        .route(
            "/api/auth/change-password",
            post(handlers::change_password::<R, M, P>),
        )
        .route(
            "/api/oauth/{provider}/authorize",
            get(handlers::oauth_authorize::<R, M, P>),
        )
        .route(
            "/api/oauth/{provider}",
            get(handlers::oauth_callback::<R, M, P>),
        )
        .route("/api/verify-email", get(handlers::verify_email::<R, M, P>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::AuthConfig;
    use crate::application::oauth_sign_in::OAuthProviders;
    use crate::infra::mailer::RecordingEmailSender;
    use crate::infra::memory::InMemoryAuthRepository;
    use crate::infra::oauth::ScriptedOAuthProvider;
    use crate::presentation::middleware::SessionContext;
    use axum::Extension;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    type TestState =
        AuthAppState<InMemoryAuthRepository, RecordingEmailSender, ScriptedOAuthProvider>;

    fn state() -> TestState {
        AuthAppState::new(
            InMemoryAuthRepository::new(),
            RecordingEmailSender::new(),
            OAuthProviders::new(),
            AuthConfig::development(),
        )
    }

    fn app() -> Router {
        auth_router(state())
    }

    #[tokio::test]
    async fn test_check_without_cookie() {
        let response = app()
            .oneshot(
                Request::get("/api/auth/check")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_invalid_cookie_is_cleared() {
        let response = app()
            .oneshot(
                Request::get("/api/auth/check")
                    .header(header::COOKIE, "auth_session=forged.123.abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("auth_session=;"));
    }

    #[tokio::test]
    async fn test_unconfigured_provider_is_not_found() {
        let response = app()
            .oneshot(
                Request::get("/api/oauth/google/authorize")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app()
            .oneshot(
                Request::get("/api/oauth/twitter/authorize")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_provider_callback_clears_oauth_cookies() {
        let response = app()
            .oneshot(
                Request::get("/api/oauth/twitter?code=abc&state=xyz")
                    .header(header::COOKIE, "state=xyz; codeVerifier=secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let cleared: Vec<&str> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();
        assert!(cleared.iter().any(|c| c.starts_with("state=;")));
        assert!(cleared.iter().any(|c| c.starts_with("codeVerifier=;")));
    }

    #[tokio::test]
    async fn test_merged_routes_share_the_session_layer() {
        let state = state();
        let extra = Router::new().route(
            "/api/ping",
            get(|Extension(session): Extension<SessionContext>| async move {
                if session.0.is_some() { "signed-in" } else { "signed-out" }
            }),
        );
        let app = with_sessions(auth_routes(state.clone()).merge(extra), state);

        let response = app
            .oneshot(
                Request::get("/api/ping")
                    .header(header::COOKIE, "auth_session=forged.123.abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.starts_with("auth_session=;"));
    }

    #[tokio::test]
    async fn test_verify_email_requires_token() {
        let response = app()
            .oneshot(
                Request::get("/api/verify-email")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_change_password_requires_session() {
        let response = app()
            .oneshot(
                Request::post("/api/auth/change-password")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"password":"a","newPassword":"b","confirmPassword":"b"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
