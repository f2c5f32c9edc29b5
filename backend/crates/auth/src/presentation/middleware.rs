//! Session Middleware
//!
//! Validates the session cookie once per request and stores the outcome in
//! request extensions for the handlers.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use platform::cookie::sets_cookie;

use crate::application::session_manager::ValidatedSession;
use crate::domain::mailer::EmailSender;
use crate::domain::oauth::OAuthProvider;
use crate::domain::repository::AuthStore;
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::AuthAppState;

/// Session resolved for the current request (`None` when signed out)
#[derive(Debug, Clone, Default)]
pub struct SessionContext(pub Option<ValidatedSession>);

impl SessionContext {
    pub fn require(&self) -> AuthResult<&ValidatedSession> {
        self.0.as_ref().ok_or(AuthError::Unauthorized)
    }
}

/// Resolve the session cookie, then refresh or clear it on the way out
///
/// A rotated session gets its new cookie; an unusable cookie is blanked.
/// Either is skipped when the handler already wrote the session cookie.
pub async fn resolve_session<R, M, P>(
    State(state): State<AuthAppState<R, M, P>>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response
where
    R: AuthStore,
    M: EmailSender + Sync + 'static,
    P: OAuthProvider + Sync + 'static,
{
    let sessions = state.sessions();
    let presented = jar
        .get(sessions.cookie_name())
        .map(|cookie| cookie.value().to_string());

    let mut refresh: Option<Cookie<'static>> = None;
    let validated = match presented {
        None => None,
        Some(token) => match sessions.validate_session(&token).await {
            Ok(Some(validated)) => {
                refresh = validated
                    .rotated_token
                    .clone()
                    .map(|token| sessions.session_cookie(token));
                Some(validated)
            }
            Ok(None) => {
                refresh = Some(sessions.removal_cookie());
                None
            }
            Err(err) => return err.into_response(),
        },
    };

    req.extensions_mut().insert(SessionContext(validated));
    let mut response = next.run(req).await;

    if let Some(cookie) = refresh {
        let name = sessions.cookie_name();
        let handler_set_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| sets_cookie(value, name));

        if !handler_set_cookie {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }

    response
}
