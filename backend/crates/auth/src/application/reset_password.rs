//! Reset Password Use Case
//!
//! Completes the forgot-password flow with the emailed token.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::user_password::{RawPassword, UserPassword};
use crate::error::AuthResult;

pub struct ResetPasswordInput {
    pub token: String,
    pub password: String,
}

pub struct ResetPasswordUseCase<R> {
    tokens: TokenIssuer<R>,
}

impl<R> ResetPasswordUseCase<R>
where
    R: UserRepository + TokenRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            tokens: TokenIssuer::new(repo, config),
        }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<()> {
        let raw_password = RawPassword::new(input.password, "password")?;
        let password_hash = UserPassword::from_raw(&raw_password)?;

        self.tokens
            .consume_password_reset(&input.token, &password_hash)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::infra::memory::InMemoryAuthRepository;

    #[tokio::test]
    async fn test_policy_checked_before_token() {
        let use_case = ResetPasswordUseCase::new(
            Arc::new(InMemoryAuthRepository::new()),
            Arc::new(AuthConfig::development()),
        );

        let err = use_case
            .execute(ResetPasswordInput {
                token: "not-a-token".to_string(),
                password: "short".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.key(), Some("password"));

        let err = use_case
            .execute(ResetPasswordInput {
                token: "not-a-token".to_string(),
                password: "long enough password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
