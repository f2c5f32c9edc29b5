//! Verify Email Use Case
//!
//! Consumes a verification link and signs the user in.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_manager::{IssuedSession, SessionManager};
use crate::application::token_issuer::TokenIssuer;
use crate::domain::repository::{SessionRepository, TokenRepository, UserRepository};
use crate::error::AuthResult;

pub struct VerifyEmailUseCase<R> {
    tokens: TokenIssuer<R>,
    sessions: SessionManager<R>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: UserRepository + TokenRepository + SessionRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            tokens: TokenIssuer::new(Arc::clone(&repo), Arc::clone(&config)),
            sessions: SessionManager::new(repo, config),
        }
    }

    pub async fn execute(&self, token: &str) -> AuthResult<IssuedSession> {
        let user = self.tokens.consume_email_verification(token).await?;
        self.sessions.create_session(&user.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthError, TokenRejection};
    use crate::infra::memory::InMemoryAuthRepository;

    #[tokio::test]
    async fn test_verify_creates_session() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let config = Arc::new(AuthConfig::development());
        let user = repo.insert_unverified_user("jane@example.com", "jane").await;
        let token = TokenIssuer::new(repo.clone(), config.clone())
            .issue_email_verification(&user)
            .await
            .unwrap();

        let use_case = VerifyEmailUseCase::new(repo.clone(), config);
        let issued = use_case.execute(&token).await.unwrap();
        assert_eq!(issued.session.user_id, user.user_id);

        let err = use_case.execute(&token).await.unwrap_err();
        assert!(matches!(
            err,
            AuthError::InvalidToken(TokenRejection::NoRecord)
        ));
        assert_eq!(repo.session_count().await, 1);
    }
}
