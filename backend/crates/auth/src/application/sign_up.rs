//! Sign Up Use Case
//!
//! Creates an unverified account and emails its verification link.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token_issuer::TokenIssuer;
use crate::domain::entity::user::User;
use crate::domain::mailer::{EmailMessage, EmailSender};
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_id::UserId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Sign up input
pub struct SignUpInput {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Sign up output
#[derive(Debug)]
pub struct SignUpOutput {
    pub user_id: UserId,
}

/// Sign up use case
pub struct SignUpUseCase<R, M> {
    repo: Arc<R>,
    mailer: Arc<M>,
    tokens: TokenIssuer<R>,
    config: Arc<AuthConfig>,
}

impl<R, M> SignUpUseCase<R, M>
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

    pub async fn execute(&self, input: SignUpInput) -> AuthResult<SignUpOutput> {
        let email = Email::new(input.email)?;
        let username = UserName::new(&input.username)?;
        let raw_password = RawPassword::new(input.password, "password")?;

        if self.repo.exists_by_username(&username).await? {
            return Err(AuthError::UsernameTaken);
        }

        if self.repo.exists_by_email(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_raw(&raw_password)?;
        let user = User::new(email, username, password_hash);
        let (verification, token) = self.tokens.prepare_email_verification(&user)?;

        // Unique-index races surface here as the same field conflicts
        self.repo.register(&user, &verification).await?;

        tracing::info!(
            user_id = %user.user_id,
            username = %user.username,
            "User signed up"
        );

        let message = EmailMessage {
            to: user.email.as_str().to_string(),
            username: user.username.original().to_string(),
            url: self
                .config
                .public_url(&format!("/api/verify-email?token={}", token)),
        };
        self.mailer.send_verification_email(&message).await?;

        Ok(SignUpOutput {
            user_id: user.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::mailer::{EmailKind, RecordingEmailSender};
    use crate::infra::memory::InMemoryAuthRepository;

    fn input(email: &str, username: &str) -> SignUpInput {
        SignUpInput {
            email: email.to_string(),
            username: username.to_string(),
            password: "correct horse battery".to_string(),
        }
    }

    fn use_case(
        repo: Arc<InMemoryAuthRepository>,
        mailer: Arc<RecordingEmailSender>,
    ) -> SignUpUseCase<InMemoryAuthRepository, RecordingEmailSender> {
        SignUpUseCase::new(repo, mailer, Arc::new(AuthConfig::development()))
    }

    #[tokio::test]
    async fn test_sign_up_sends_verification_link() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let mailer = Arc::new(RecordingEmailSender::new());
        let output = use_case(repo.clone(), mailer.clone())
            .execute(input("Jane@Example.com", "Jane"))
            .await
            .unwrap();

        let user = repo.find_user(&output.user_id).await.unwrap().unwrap();
        assert_eq!(user.email.as_str(), "jane@example.com");
        assert!(!user.email_verified);

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, EmailKind::Verification);
        assert_eq!(sent[0].message.to, "jane@example.com");
        assert_eq!(sent[0].message.username, "Jane");
        assert!(
            sent[0]
                .message
                .url
                .starts_with("http://localhost:3000/api/verify-email?token=")
        );
    }

    #[tokio::test]
    async fn test_username_checked_before_email() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        repo.insert_verified_user("jane@example.com", "jane").await;
        let use_case = use_case(repo.clone(), Arc::new(RecordingEmailSender::new()));

        let err = use_case
            .execute(input("JANE@example.com", "JANE"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));

        let err = use_case
            .execute(input("JANE@example.com", "someone"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        assert_eq!(repo.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_validation_errors_name_the_field() {
        let use_case = use_case(
            Arc::new(InMemoryAuthRepository::new()),
            Arc::new(RecordingEmailSender::new()),
        );

        let err = use_case.execute(input("nope", "jane")).await.unwrap_err();
        assert_eq!(err.key(), Some("email"));

        let err = use_case
            .execute(input("jane@example.com", "jane doe"))
            .await
            .unwrap_err();
        assert_eq!(err.key(), Some("username"));

        let err = use_case
            .execute(SignUpInput {
                password: "short".to_string(),
                ..input("jane@example.com", "jane")
            })
            .await
            .unwrap_err();
        assert_eq!(err.key(), Some("password"));
    }

    #[tokio::test]
    async fn test_mail_failure_is_reported() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let err = use_case(repo.clone(), Arc::new(RecordingEmailSender::failing()))
            .execute(input("jane@example.com", "jane"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::EmailDelivery(_)));
        // The account exists; the user can ask for a new link
        assert_eq!(repo.user_count().await, 1);
    }
}
