//! Resend Verification Use Case
//!
//! Re-sends the verification link to an unverified account, at most once
//! per cooldown window.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::mailer::{EmailMessage, EmailSender};
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

pub struct ResendVerificationUseCase<R, M> {
    repo: Arc<R>,
    mailer: Arc<M>,
    tokens: TokenIssuer<R>,
    config: Arc<AuthConfig>,
}

impl<R, M> ResendVerificationUseCase<R, M>
where
    R: UserRepository + TokenRepository,
    M: EmailSender + Sync,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        let tokens = TokenIssuer::new(Arc::clone(&repo), Arc::clone(&config));
        Self {
            repo,
            mailer,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, email: String) -> AuthResult<()> {
        let email = Email::new(email)?;

        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_verified {
            return Err(AuthError::EmailAlreadyVerified);
        }

        let token = self.tokens.resend_email_verification(&user).await?;

        let message = EmailMessage {
            to: user.email.as_str().to_string(),
            username: user.username.original().to_string(),
            url: self
                .config
                .public_url(&format!("/api/verify-email?token={}", token)),
        };
        self.mailer.send_verification_email(&message).await?;

        tracing::info!(user_id = %user.user_id, "Verification email re-sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::mailer::RecordingEmailSender;
    use crate::infra::memory::InMemoryAuthRepository;

    fn use_case(
        repo: Arc<InMemoryAuthRepository>,
        mailer: Arc<RecordingEmailSender>,
    ) -> ResendVerificationUseCase<InMemoryAuthRepository, RecordingEmailSender> {
        ResendVerificationUseCase::new(repo, mailer, Arc::new(AuthConfig::development()))
    }

    #[tokio::test]
    async fn test_unknown_and_verified_users() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        repo.insert_verified_user("jane@example.com", "jane").await;
        let use_case = use_case(repo, Arc::new(RecordingEmailSender::new()));

        assert!(matches!(
            use_case.execute("ghost@example.com".to_string()).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            use_case.execute("jane@example.com".to_string()).await,
            Err(AuthError::EmailAlreadyVerified)
        ));
    }

    #[tokio::test]
    async fn test_second_resend_hits_cooldown() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        repo.insert_unverified_user("jane@example.com", "jane").await;
        let mailer = Arc::new(RecordingEmailSender::new());
        let use_case = use_case(repo, mailer.clone());

        use_case.execute("jane@example.com".to_string()).await.unwrap();
        let err = use_case
            .execute("jane@example.com".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::ResendCooldown { .. }));
        assert_eq!(mailer.sent().await.len(), 1);
    }
}
