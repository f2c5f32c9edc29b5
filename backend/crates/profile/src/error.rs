//! Profile Error Types
//!
//! Rendered through `kernel::error::AppError` like the auth errors, and
//! logged once in [`ProfileError::into_response`].

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type ProfileResult<T> = Result<T, ProfileError>;

#[derive(Debug, Error)]
pub enum ProfileError {
    /// Input failed validation; `field` names the offending field
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("User not found")]
    UserNotFound,

    /// Missing, or owned by someone else
    #[error("Item not found")]
    ItemNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Cannot delete category with associated items")]
    CategoryInUse,

    #[error("Username already taken.")]
    UsernameTaken,

    #[error("Email already taken.")]
    EmailTaken,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProfileError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ProfileError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProfileError::Validation { .. } => ErrorKind::BadRequest,
            ProfileError::Unauthorized => ErrorKind::Unauthorized,
            ProfileError::UserNotFound
            | ProfileError::ItemNotFound
            | ProfileError::CategoryNotFound => ErrorKind::NotFound,
            ProfileError::CategoryInUse
            | ProfileError::UsernameTaken
            | ProfileError::EmailTaken => ErrorKind::Conflict,
            ProfileError::Database(_) | ProfileError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn key(&self) -> Option<&'static str> {
        match self {
            ProfileError::Validation { field, .. } => Some(*field),
            ProfileError::UsernameTaken => Some("username"),
            ProfileError::EmailTaken => Some("email"),
            _ => None,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            ProfileError::Database(_) | ProfileError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let error = AppError::new(self.kind(), self.public_message());
        match self.key() {
            Some(key) => error.with_key(key),
            None => error,
        }
    }

    fn log(&self) {
        match self {
            ProfileError::Database(e) => {
                tracing::error!(error = %e, "Profile database error");
            }
            ProfileError::Internal(msg) => {
                tracing::error!(message = %msg, "Profile internal error");
            }
            _ => {
                tracing::debug!(error = %self, "Profile error");
            }
        }
    }
}

/// Value objects borrowed from auth report their failures as `AuthError`
impl From<AuthError> for ProfileError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation { field, message } => ProfileError::Validation { field, message },
            AuthError::Unauthorized => ProfileError::Unauthorized,
            AuthError::UsernameTaken => ProfileError::UsernameTaken,
            AuthError::EmailTaken => ProfileError::EmailTaken,
            AuthError::Database(e) => ProfileError::Database(e),
            other => ProfileError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ProfileError::validation("url", "Invalid URL").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ProfileError::ItemNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ProfileError::CategoryInUse.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ProfileError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_auth_validation_keeps_its_field() {
        let err: ProfileError = AuthError::validation("username", "Required").into();
        assert_eq!(err.key(), Some("username"));
        assert_eq!(err.public_message(), "Required");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ProfileError::Internal("pool exhausted".into());
        assert_eq!(
            err.public_message(),
            "Something went wrong. Please try again."
        );
    }
}
