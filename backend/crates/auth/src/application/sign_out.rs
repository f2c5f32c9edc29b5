//! Sign Out Use Case
//!
//! Invalidates the caller's session.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session_manager::SessionManager;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<R> {
    sessions: SessionManager<R>,
}

impl<R> SignOutUseCase<R>
where
    R: SessionRepository + UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self {
            sessions: SessionManager::new(repo, config),
        }
    }

    /// Sign out from current session; a missing or foreign cookie is a no-op
    pub async fn execute(&self, session_token: Option<&str>) -> AuthResult<()> {
        if let Some(token) = session_token {
            self.sessions.invalidate_session(token).await?;
            tracing::info!("User signed out");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::InMemoryAuthRepository;

    #[tokio::test]
    async fn test_sign_out_deletes_session() {
        let repo = Arc::new(InMemoryAuthRepository::new());
        let config = Arc::new(AuthConfig::development());
        let user = repo.insert_verified_user("jane@example.com", "jane").await;
        let sessions = SessionManager::new(repo.clone(), config.clone());
        let issued = sessions.create_session(&user.user_id).await.unwrap();

        let use_case = SignOutUseCase::new(repo.clone(), config);
        use_case.execute(Some(&issued.token)).await.unwrap();
        assert_eq!(repo.session_count().await, 0);

        // Idempotent
        use_case.execute(Some(&issued.token)).await.unwrap();
        use_case.execute(None).await.unwrap();
    }
}
