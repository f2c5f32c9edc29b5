//! Session Manager
//!
//! Creates, validates, rotates and revokes sessions. The cookie value is a
//! [`SessionToken`] signed with the configured secret; the row in the
//! session repository is the source of truth.

use std::sync::Arc;

use axum_extra::extract::cookie::Cookie;
use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::{session::Session, user::User};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{session_token::SessionToken, user_id::UserId};
use crate::error::AuthResult;

/// A freshly stored session and the cookie value that proves it
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
}

/// Outcome of a successful validation
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub user: User,
    pub session: Session,
    /// Set when the session was extended and the caller must send a new cookie
    pub rotated_token: Option<String>,
}

pub struct SessionManager<R> {
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> Clone for SessionManager<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R> SessionManager<R>
where
    R: SessionRepository + UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    fn sign(&self, session: &Session) -> AuthResult<String> {
        SessionToken::new(session.session_id, session.expires_at).sign(&self.config.session_secret)
    }

    pub async fn create_session(&self, user_id: &UserId) -> AuthResult<IssuedSession> {
        let session = Session::new(*user_id, self.config.session_ttl());
        self.repo.create_session(&session).await?;
        let token = self.sign(&session)?;

        tracing::debug!(user_id = %user_id, session_id = %session.session_id, "Session created");
        Ok(IssuedSession { session, token })
    }

    /// Resolve a cookie value to its user
    ///
    /// `Ok(None)` means the cookie should be cleared. Expired rows are
    /// deleted here.
    pub async fn validate_session(&self, token: &str) -> AuthResult<Option<ValidatedSession>> {
        let Some(token) = SessionToken::verify(token, &self.config.session_secret) else {
            return Ok(None);
        };

        let now = Utc::now();
        if token.is_expired_at(now) {
            return Ok(None);
        }

        let Some(mut session) = self.repo.find_session(token.session_id).await? else {
            return Ok(None);
        };

        if session.is_expired_at(now) {
            self.repo.delete_session(session.session_id).await?;
            return Ok(None);
        }

        let Some(user) = self.repo.find_user(&session.user_id).await? else {
            return Ok(None);
        };

        let ttl = self.config.session_ttl();
        let rotated_token = if session.needs_rotation(ttl, now) {
            session.extend(ttl, now);
            self.repo.update_session(&session).await?;
            tracing::debug!(session_id = %session.session_id, "Session rotated");
            Some(self.sign(&session)?)
        } else {
            None
        };

        Ok(Some(ValidatedSession {
            user,
            session,
            rotated_token,
        }))
    }

    /// Delete the session behind a cookie value, if it is one of ours
    pub async fn invalidate_session(&self, token: &str) -> AuthResult<()> {
        if let Some(token) = SessionToken::verify(token, &self.config.session_secret) {
            self.repo.delete_session(token.session_id).await?;
            tracing::debug!(session_id = %token.session_id, "Session invalidated");
        }
        Ok(())
    }

    pub async fn revoke_all_sessions(&self, user_id: &UserId) -> AuthResult<u64> {
        let revoked = self.repo.delete_sessions_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "Sessions revoked");
        Ok(revoked)
    }

    /// Revoke every session of the user and open a single new one
    pub async fn replace_all_sessions(&self, user_id: &UserId) -> AuthResult<IssuedSession> {
        let session = Session::new(*user_id, self.config.session_ttl());
        let revoked = self
            .repo
            .replace_sessions_for_user(user_id, &session)
            .await?;
        let token = self.sign(&session)?;

        tracing::info!(user_id = %user_id, revoked, "Sessions revoked");
        Ok(IssuedSession { session, token })
    }

    pub fn session_cookie(&self, token: impl Into<String>) -> Cookie<'static> {
        self.config.cookie_policy().build(
            self.config.session_cookie_name.clone(),
            token,
            self.config.session_cookie_max_age,
        )
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        self.config
            .cookie_policy()
            .removal(self.config.session_cookie_name.clone())
    }

    pub fn cookie_name(&self) -> &str {
        &self.config.session_cookie_name
    }
}
