//! Sign In Use Case
//!
//! Authenticates a user by email and password and creates a session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_manager::{IssuedSession, SessionManager};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

/// Sign in use case
pub struct SignInUseCase<R> {
    repo: Arc<R>,
    sessions: SessionManager<R>,
}

impl<R> SignInUseCase<R>
where
    R: UserRepository + SessionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let sessions = SessionManager::new(Arc::clone(&repo), config);
        Self { repo, sessions }
    }

    pub async fn execute(&self, input: SignInInput) -> AuthResult<IssuedSession> {
        let email = Email::new(input.email)?;
        if input.password.is_empty() {
            return Err(AuthError::validation("password", "Required"));
        }

        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // OAuth-only accounts have nothing to compare against
        let Some(password_hash) = &user.password_hash else {
            return Err(AuthError::InvalidCredentials);
        };

        let raw_password = RawPassword::for_verification(input.password);
        if !password_hash.verify(&raw_password) {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        if password_hash.needs_rehash() {
            match UserPassword::from_raw(&raw_password) {
                Ok(rehashed) => {
                    if let Err(e) = self.repo.update_password(&user.user_id, &rehashed).await {
                        tracing::warn!(user_id = %user.user_id, error = %e, "Password rehash failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(user_id = %user.user_id, error = %e, "Password rehash failed");
                }
            }
        }

        let issued = self.sessions.create_session(&user.user_id).await?;

        tracing::info!(user_id = %user.user_id, "User signed in");
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryAuthRepository;

    fn input(email: &str, password: &str) -> SignInInput {
        SignInInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn use_case(repo: Arc<InMemoryAuthRepository>) -> SignInUseCase<InMemoryAuthRepository> {
        SignInUseCase::new(repo, Arc::new(AuthConfig::development()))
    }

    #[tokio::test]
    async fn test_sign_in_is_case_insensitive() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let user = repo.insert_verified_user("jane@example.com", "jane").await;

        let issued = use_case(repo.clone())
            .execute(input("JANE@example.com", InMemoryAuthRepository::PASSWORD))
            .await
            .unwrap();
        assert_eq!(issued.session.user_id, user.user_id);
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_alike() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        repo.insert_verified_user("jane@example.com", "jane").await;
        let use_case = use_case(repo.clone());

        let wrong = use_case
            .execute(input("jane@example.com", "not the password"))
            .await
            .unwrap_err();
        let unknown = use_case
            .execute(input("ghost@example.com", InMemoryAuthRepository::PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_unverified_user_gets_key() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        repo.insert_unverified_user("jane@example.com", "jane").await;

        let err = use_case(repo)
            .execute(input("jane@example.com", InMemoryAuthRepository::PASSWORD))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailNotVerified));
        assert_eq!(err.key(), Some("email_not_verified"));
    }

    #[tokio::test]
    async fn test_oauth_only_account() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        repo.insert_oauth_user("octo@example.com", "octocat").await;

        let err = use_case(repo)
            .execute(input("octo@example.com", "anything at all"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_empty_password_is_validation_error() {
        let err = use_case(Arc::new(InMemoryAuthRepository::new()))
            .execute(input("jane@example.com", ""))
            .await
            .unwrap_err();
        assert_eq!(err.key(), Some("password"));
    }
}
