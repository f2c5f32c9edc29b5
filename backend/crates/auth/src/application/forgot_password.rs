//! Forgot Password Use Case
//!
//! Emails a reset link to a known address. The outcome is identical
//! whether or not the address belongs to an account.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::mailer::{EmailMessage, EmailSender};
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::AuthResult;

pub struct ForgotPasswordUseCase<R, M> {
    repo: Arc<R>,
    mailer: Arc<M>,
    tokens: TokenIssuer<R>,
    config: Arc<AuthConfig>,
}

impl<R, M> ForgotPasswordUseCase<R, M>
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

        let Some(user) = self.repo.find_by_email(&email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = match self.tokens.issue_password_reset(&user).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(user_id = %user.user_id, error = %e, "Password reset could not be issued");
                return Ok(());
            }
        };
        let message = EmailMessage {
            to: user.email.as_str().to_string(),
            username: user.username.original().to_string(),
            url: self
                .config
                .public_url(&format!("/forgot-password/reset?token={}", token)),
        };

        if let Err(e) = self.mailer.send_password_reset_email(&message).await {
            tracing::error!(user_id = %user.user_id, error = %e, "Password reset email failed");
            return Ok(());
        }

        tracing::info!(user_id = %user.user_id, "Password reset requested");
        Ok(())
    }
}
