//! Change Password Use Case
//!
//! Authenticated password change. Optionally signs out every device and
//! re-establishes a single session for the caller.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_manager::{IssuedSession, SessionManager};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{
    user_id::UserId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
    pub logout_from_all_devices: bool,
}

#[derive(Debug)]
pub struct ChangePasswordOutput {
    /// The caller's replacement session when every device was signed out
    pub new_session: Option<IssuedSession>,
}

pub struct ChangePasswordUseCase<R> {
    repo: Arc<R>,
    sessions: SessionManager<R>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: UserRepository + SessionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let sessions = SessionManager::new(Arc::clone(&repo), config);
        Self { repo, sessions }
    }

    pub async fn execute(
        &self,
        user_id: &UserId,
        input: ChangePasswordInput,
    ) -> AuthResult<ChangePasswordOutput> {
        if input.current_password.is_empty() {
            return Err(AuthError::validation("password", "Required"));
        }

        if input.new_password != input.confirm_password {
            return Err(AuthError::validation(
                "confirmPassword",
                "Passwords do not match",
            ));
        }

        let new_password = RawPassword::new(input.new_password, "newPassword")?;

        let user = self
            .repo
            .find_user(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let current_hash = user
            .password_hash
            .as_ref()
            .ok_or(AuthError::PasswordNotSet)?;

        if !current_hash.verify(&RawPassword::for_verification(input.current_password)) {
            return Err(AuthError::InvalidPassword);
        }

        let password_hash = UserPassword::from_raw(&new_password)?;
        self.repo
            .update_password(&user.user_id, &password_hash)
            .await?;

        tracing::info!(user_id = %user.user_id, "Password changed");

        let new_session = if input.logout_from_all_devices {
            Some(self.sessions.replace_all_sessions(&user.user_id).await?)
        } else {
            None
        };

        Ok(ChangePasswordOutput { new_session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryAuthRepository;

    fn input(current: &str, new: &str, confirm: &str, everywhere: bool) -> ChangePasswordInput {
        ChangePasswordInput {
            current_password: current.to_string(),
            new_password: new.to_string(),
            confirm_password: confirm.to_string(),
            logout_from_all_devices: everywhere,
        }
    }

    #[tokio::test]
    async fn test_mismatched_confirmation() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let user = repo.insert_verified_user("jane@example.com", "jane").await;
        let use_case = ChangePasswordUseCase::new(repo, Arc::new(AuthConfig::development()));

        let err = use_case
            .execute(
                &user.user_id,
                input(InMemoryAuthRepository::PASSWORD, "new password 1", "new password 2", false),
            )
            .await
            .unwrap_err();
        assert_eq!(err.key(), Some("confirmPassword"));
    }

    #[tokio::test]
    async fn test_wrong_current_password() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let user = repo.insert_verified_user("jane@example.com", "jane").await;
        let use_case = ChangePasswordUseCase::new(repo, Arc::new(AuthConfig::development()));

        let err = use_case
            .execute(
                &user.user_id,
                input("not my password", "new password 1", "new password 1", false),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
        assert_eq!(err.key(), Some("invalid_password"));
    }

    #[tokio::test]
    async fn test_oauth_account_has_no_password() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let user = repo.insert_oauth_user("octo@example.com", "octocat").await;
        let use_case = ChangePasswordUseCase::new(repo, Arc::new(AuthConfig::development()));

        let err = use_case
            .execute(
                &user.user_id,
                input("whatever it is", "new password 1", "new password 1", false),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordNotSet));
    }

    #[tokio::test]
    async fn test_change_keeps_sessions_by_default() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let config = Arc::new(AuthConfig::development());
        let user = repo.insert_verified_user("jane@example.com", "jane").await;
        SessionManager::new(repo.clone(), config.clone())
            .create_session(&user.user_id)
            .await
            .unwrap();

        let output = ChangePasswordUseCase::new(repo.clone(), config)
            .execute(
                &user.user_id,
                input(InMemoryAuthRepository::PASSWORD, "new password 1", "new password 1", false),
            )
            .await
            .unwrap();

        assert!(output.new_session.is_none());
        assert_eq!(repo.session_count().await, 1);

        let stored = repo.find_user(&user.user_id).await.unwrap().unwrap();
        assert!(stored.password_hash.unwrap().verify(&RawPassword::for_verification(
            "new password 1".to_string()
        )));
    }
}
