//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system. Every failure is
//! rendered exactly once, in [`AuthError::into_response`], which is also
//! where it gets logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Why an email-verification or password-reset token was refused
///
/// Callers see a single "Invalid or expired token" message; the reason is
/// kept for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("signature does not verify")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("no user for token email")]
    UnknownUser,
    #[error("no pending record")]
    NoRecord,
    #[error("code does not match")]
    CodeMismatch,
    #[error("record expired")]
    RecordExpired,
}

/// Why an OAuth callback was refused before talking to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OAuthRejection {
    #[error("No code or state provided. Invalid request.")]
    MissingParameters,
    #[error("Invalid state. Request may have been tampered with.")]
    StateMismatch,
}

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Input failed validation; `field` names the offending field
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please verify your email first")]
    EmailNotVerified,

    /// Current password is wrong (change password)
    #[error("Invalid password")]
    InvalidPassword,

    /// Account only has OAuth identities
    #[error("This account signs in with an external provider")]
    PasswordNotSet,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Username already taken.")]
    UsernameTaken,

    #[error("Email already taken.")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already verified")]
    EmailAlreadyVerified,

    #[error("Invalid or expired token")]
    InvalidToken(TokenRejection),

    #[error("{0}")]
    OAuthRequest(OAuthRejection),

    #[error("Unknown OAuth provider")]
    UnknownProvider,

    #[error("Email verification already sent. Please wait {remaining_secs} seconds.")]
    ResendCooldown { remaining_secs: u64 },

    /// Provider exchange or profile fetch failed
    #[error("OAuth provider error: {0}")]
    OAuthUpstream(String),

    /// Provider did not supply a verified email
    #[error("OAuth provider returned no verified email")]
    OAuthEmailUnavailable,

    #[error("Email delivery failed: {0}")]
    EmailDelivery(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation { .. }
            | AuthError::PasswordNotSet
            | AuthError::InvalidToken(_)
            | AuthError::OAuthRequest(_) => ErrorKind::BadRequest,
            AuthError::InvalidCredentials | AuthError::InvalidPassword | AuthError::Unauthorized => {
                ErrorKind::Unauthorized
            }
            AuthError::EmailNotVerified => ErrorKind::Forbidden,
            AuthError::UserNotFound | AuthError::UnknownProvider => ErrorKind::NotFound,
            AuthError::UsernameTaken | AuthError::EmailTaken | AuthError::EmailAlreadyVerified => {
                ErrorKind::Conflict
            }
            AuthError::ResendCooldown { .. } => ErrorKind::TooManyRequests,
            AuthError::OAuthUpstream(_)
            | AuthError::OAuthEmailUnavailable
            | AuthError::EmailDelivery(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Machine-readable key for client-side branching
    pub fn key(&self) -> Option<&'static str> {
        match self {
            AuthError::Validation { field, .. } => Some(*field),
            AuthError::EmailNotVerified => Some("email_not_verified"),
            AuthError::InvalidPassword => Some("invalid_password"),
            AuthError::UsernameTaken => Some("username"),
            AuthError::EmailTaken => Some("email"),
            _ => None,
        }
    }

    /// User-facing message; server-side failures never leak internals
    pub fn public_message(&self) -> String {
        match self {
            AuthError::OAuthUpstream(_) | AuthError::OAuthEmailUnavailable => {
                "An error occurred during authentication.".to_string()
            }
            AuthError::EmailDelivery(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let error = AppError::new(self.kind(), self.public_message());
        match self.key() {
            Some(key) => error.with_key(key),
            None => error,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::OAuthUpstream(msg) => {
                tracing::error!(message = %msg, "OAuth provider error");
            }
            AuthError::OAuthEmailUnavailable => {
                tracing::error!("OAuth provider returned no verified email");
            }
            AuthError::EmailDelivery(msg) => {
                tracing::error!(message = %msg, "Email delivery failed");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidToken(reason) => {
                tracing::warn!(reason = %reason, "Rejected token");
            }
            AuthError::OAuthRequest(reason) => {
                tracing::warn!(reason = ?reason, "Rejected OAuth callback");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        err.to_app_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::validation("email", "Required").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::EmailNotVerified.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AuthError::UsernameTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::ResendCooldown { remaining_secs: 3 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::InvalidToken(TokenRejection::Expired).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::OAuthUpstream("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_keys() {
        assert_eq!(
            AuthError::validation("password", "Required").key(),
            Some("password")
        );
        assert_eq!(
            AuthError::EmailNotVerified.key(),
            Some("email_not_verified")
        );
        assert_eq!(AuthError::EmailTaken.key(), Some("email"));
        assert_eq!(AuthError::InvalidCredentials.key(), None);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AuthError::Internal("connection string leaked".into());
        assert_eq!(
            err.public_message(),
            "Something went wrong. Please try again."
        );

        let err = AuthError::OAuthUpstream("invalid_grant".into());
        assert_eq!(
            err.public_message(),
            "An error occurred during authentication."
        );
    }

    #[test]
    fn test_token_rejections_share_one_message() {
        assert_eq!(
            AuthError::InvalidToken(TokenRejection::BadSignature).public_message(),
            AuthError::InvalidToken(TokenRejection::CodeMismatch).public_message()
        );
    }

    #[test]
    fn test_cooldown_message() {
        assert_eq!(
            AuthError::ResendCooldown { remaining_secs: 42 }.public_message(),
            "Email verification already sent. Please wait 42 seconds."
        );
    }
}
