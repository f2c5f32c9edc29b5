//! In-Memory Repository
//!
//! Implements every repository trait over one `tokio::sync::Mutex`, so each
//! call, including the transactional ones, is atomic. Test double only: the
//! seeding helpers panic on invalid input.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entity::{
    email_verification::EmailVerification, external_account::ExternalAccount,
    password_reset::PasswordReset, session::Session, user::User,
};
use crate::domain::oauth::OAuthIdentity;
use crate::domain::repository::{
    ExternalAccountRepository, SessionRepository, TokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email,
    oauth_provider::OAuthProviderKind,
    user_id::UserId,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    sessions: HashMap<Uuid, Session>,
    verifications: HashMap<UserId, EmailVerification>,
    resets: HashMap<UserId, PasswordReset>,
    external_accounts: HashMap<(UserId, OAuthProviderKind), ExternalAccount>,
}

impl State {
    fn user_by_email(&self, email: &Email) -> Option<&User> {
        self.users.values().find(|u| u.email == *email)
    }

    fn username_taken(&self, username: &UserName) -> bool {
        self.users
            .values()
            .any(|u| u.username.canonical() == username.canonical())
    }
}

#[derive(Default)]
pub struct InMemoryAuthRepository {
    state: Mutex<State>,
    fail_token_writes: AtomicBool,
}

impl InMemoryAuthRepository {
    /// Password of every user created through the `insert_*_user` helpers
    pub const PASSWORD: &'static str = "correct horse battery staple";

    pub fn new() -> Self {
        Self::default()
    }

    fn known_password_hash() -> AuthResult<UserPassword> {
        static HASH: OnceLock<String> = OnceLock::new();

        if let Some(phc) = HASH.get() {
            return UserPassword::from_phc_string(phc.as_str());
        }

        let raw = RawPassword::new(Self::PASSWORD.to_string(), "password")?;
        let hashed = UserPassword::from_raw(&raw)?;
        let phc = HASH.get_or_init(|| hashed.as_phc_string().to_string());
        UserPassword::from_phc_string(phc.as_str())
    }

    async fn insert_user(&self, email: &str, username: &str, verified: bool) -> AuthResult<User> {
        let mut user = User::new(
            Email::new(email)?,
            UserName::new(username)?,
            Self::known_password_hash()?,
        );
        user.email_verified = verified;

        self.state
            .lock()
            .await
            .users
            .insert(user.user_id, user.clone());
        Ok(user)
    }

    /// Seed a verified password account
    ///
    /// # Panics
    /// If `email` or `username` is invalid.
    pub async fn insert_verified_user(&self, email: &str, username: &str) -> User {
        self.insert_user(email, username, true)
            .await
            .expect("valid seed user")
    }

    /// Seed an unverified password account
    ///
    /// # Panics
    /// If `email` or `username` is invalid.
    pub async fn insert_unverified_user(&self, email: &str, username: &str) -> User {
        self.insert_user(email, username, false)
            .await
            .expect("valid seed user")
    }

    /// Seed an account that has no password
    ///
    /// # Panics
    /// If `email` or `username` is invalid.
    pub async fn insert_oauth_user(&self, email: &str, username: &str) -> User {
        let user = User::from_provider(
            Email::new(email).expect("valid seed email"),
            UserName::new(username).expect("valid seed username"),
            None,
            None,
        );
        self.state
            .lock()
            .await
            .users
            .insert(user.user_id, user.clone());
        user
    }

    /// Make every later verification or reset write fail like a lost connection
    pub fn fail_token_writes(&self) {
        self.fail_token_writes.store(true, Ordering::SeqCst);
    }

    fn check_token_write(&self) -> AuthResult<()> {
        if self.fail_token_writes.load(Ordering::SeqCst) {
            return Err(AuthError::Internal("token storage unavailable".to_string()));
        }
        Ok(())
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn session_count(&self) -> usize {
        self.state.lock().await.sessions.len()
    }

    /// Move a verification record's `sent_at` into the past
    pub async fn backdate_verification(&self, user_id: &UserId, by: Duration) {
        if let Some(record) = self.state.lock().await.verifications.get_mut(user_id) {
            record.sent_at -= by;
        }
    }

    /// Make a reset record expire now
    pub async fn expire_password_reset(&self, user_id: &UserId) {
        if let Some(record) = self.state.lock().await.resets.get_mut(user_id) {
            record.expires_at = Utc::now() - Duration::seconds(1);
        }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for InMemoryAuthRepository {
    async fn register(&self, user: &User, verification: &EmailVerification) -> AuthResult<()> {
        let mut state = self.state.lock().await;

        if state.username_taken(&user.username) {
            return Err(AuthError::UsernameTaken);
        }
        if state.user_by_email(&user.email).is_some() {
            return Err(AuthError::EmailTaken);
        }

        state.users.insert(user.user_id, user.clone());
        state
            .verifications
            .insert(verification.user_id, verification.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.state.lock().await.users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.state.lock().await.user_by_email(email).cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.state.lock().await.user_by_email(email).is_some())
    }

    async fn exists_by_username(&self, username: &UserName) -> AuthResult<bool> {
        Ok(self.state.lock().await.username_taken(username))
    }

    async fn update_password(&self, user_id: &UserId, password: &UserPassword) -> AuthResult<()> {
        if let Some(user) = self.state.lock().await.users.get_mut(user_id) {
            user.set_password(password.clone());
        }
        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for InMemoryAuthRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        self.state
            .lock()
            .await
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>> {
        Ok(self.state.lock().await.sessions.get(&session_id).cloned())
    }

    async fn update_session(&self, session: &Session) -> AuthResult<()> {
        if let Some(stored) = self.state.lock().await.sessions.get_mut(&session.session_id) {
            stored.expires_at = session.expires_at;
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        self.state.lock().await.sessions.remove(&session_id);
        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.user_id != *user_id);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn replace_sessions_for_user(
        &self,
        user_id: &UserId,
        session: &Session,
    ) -> AuthResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.user_id != *user_id);
        let deleted = (before - state.sessions.len()) as u64;
        state.sessions.insert(session.session_id, session.clone());
        Ok(deleted)
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }
}

// ============================================================================
// Token Repository Implementation
// ============================================================================

impl TokenRepository for InMemoryAuthRepository {
    async fn save_email_verification(&self, record: &EmailVerification) -> AuthResult<()> {
        self.check_token_write()?;
        self.state
            .lock()
            .await
            .verifications
            .insert(record.user_id, record.clone());
        Ok(())
    }

    async fn find_email_verification(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<EmailVerification>> {
        Ok(self.state.lock().await.verifications.get(user_id).cloned())
    }

    async fn confirm_email(&self, user_id: &UserId, code: &str) -> AuthResult<bool> {
        let mut state = self.state.lock().await;

        if !state
            .verifications
            .get(user_id)
            .is_some_and(|record| record.code == code)
        {
            return Ok(false);
        }

        state.verifications.remove(user_id);
        if let Some(user) = state.users.get_mut(user_id) {
            user.mark_email_verified();
        }
        Ok(true)
    }

    async fn save_password_reset(&self, record: &PasswordReset) -> AuthResult<()> {
        self.check_token_write()?;
        self.state
            .lock()
            .await
            .resets
            .insert(record.user_id, record.clone());
        Ok(())
    }

    async fn find_password_reset(&self, user_id: &UserId) -> AuthResult<Option<PasswordReset>> {
        Ok(self.state.lock().await.resets.get(user_id).cloned())
    }

    async fn complete_password_reset(
        &self,
        user_id: &UserId,
        token: &str,
        password: &UserPassword,
    ) -> AuthResult<bool> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        if !state
            .resets
            .get(user_id)
            .is_some_and(|record| record.token == token && !record.is_expired_at(now))
        {
            return Ok(false);
        }

        state.resets.remove(user_id);
        if let Some(user) = state.users.get_mut(user_id) {
            user.set_password(password.clone());
        }
        Ok(true)
    }

    async fn cleanup_expired_resets(&self) -> AuthResult<u64> {
        let now = Utc::now();
        let mut state = self.state.lock().await;
        let before = state.resets.len();
        state.resets.retain(|_, r| !r.is_expired_at(now));
        Ok((before - state.resets.len()) as u64)
    }
}

// ============================================================================
// External Account Repository Implementation
// ============================================================================

impl ExternalAccountRepository for InMemoryAuthRepository {
    async fn link_oauth_identity(
        &self,
        identity: &OAuthIdentity,
        username_candidates: &[UserName],
    ) -> AuthResult<User> {
        let profile = &identity.profile;
        let mut state = self.state.lock().await;

        let existing = state.user_by_email(&profile.email).map(|u| u.user_id);
        let user = match existing.and_then(|id| state.users.get_mut(&id)) {
            Some(user) => {
                user.refresh_from_provider(
                    profile.display_name.as_deref(),
                    profile.avatar_url.as_deref(),
                );
                let claimed = user.claim_for_provider();
                let user = user.clone();

                if claimed {
                    state.sessions.retain(|_, s| s.user_id != user.user_id);
                    state.verifications.remove(&user.user_id);
                    state.resets.remove(&user.user_id);
                }
                user
            }
            None => {
                let username = username_candidates
                    .iter()
                    .find(|candidate| !state.username_taken(candidate))
                    .cloned()
                    .ok_or_else(|| {
                        AuthError::Internal("No free username for OAuth account".to_string())
                    })?;

                let user = User::from_provider(
                    profile.email.clone(),
                    username,
                    profile.display_name.clone(),
                    profile.avatar_url.clone(),
                );
                state.users.insert(user.user_id, user.clone());
                user
            }
        };

        let now = Utc::now();
        let key = (user.user_id, identity.provider);
        let refresh_token = identity.tokens.refresh_token.clone().or_else(|| {
            state
                .external_accounts
                .get(&key)
                .and_then(|account| account.refresh_token.clone())
        });
        let created_at = state
            .external_accounts
            .get(&key)
            .map_or(now, |account| account.created_at);

        state.external_accounts.insert(
            key,
            ExternalAccount {
                user_id: user.user_id,
                provider: identity.provider,
                provider_account_id: profile.provider_account_id.clone(),
                access_token: identity.tokens.access_token.clone(),
                refresh_token,
                expires_at: identity.tokens.expires_at,
                created_at,
                updated_at: now,
            },
        );

        Ok(user)
    }

    async fn find_external_account(
        &self,
        user_id: &UserId,
        provider: OAuthProviderKind,
    ) -> AuthResult<Option<ExternalAccount>> {
        Ok(self
            .state
            .lock()
            .await
            .external_accounts
            .get(&(*user_id, provider))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::oauth::{OAuthProfile, OAuthTokens};

    fn identity(refresh_token: Option<&str>) -> OAuthIdentity {
        OAuthIdentity {
            provider: OAuthProviderKind::Google,
            profile: OAuthProfile {
                provider_account_id: "1234".to_string(),
                email: Email::new("jane@example.com").unwrap(),
                display_name: None,
                login: None,
                avatar_url: None,
            },
            tokens: OAuthTokens {
                access_token: "access".to_string(),
                refresh_token: refresh_token.map(str::to_string),
                expires_at: None,
            },
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let repo = InMemoryAuthRepository::new();
        repo.insert_verified_user("jane@example.com", "Jane").await;

        let taken_name = User::new(
            Email::new("other@example.com").unwrap(),
            UserName::new("JANE").unwrap(),
            InMemoryAuthRepository::known_password_hash().unwrap(),
        );
        let record = EmailVerification::new(taken_name.user_id);
        assert!(matches!(
            repo.register(&taken_name, &record).await,
            Err(AuthError::UsernameTaken)
        ));
        assert_eq!(repo.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_token_kept_when_absent() {
        let repo = InMemoryAuthRepository::new();
        let candidates = UserName::candidates("jane", "00000000");

        let user = repo
            .link_oauth_identity(&identity(Some("refresh-1")), &candidates)
            .await
            .unwrap();
        repo.link_oauth_identity(&identity(None), &candidates)
            .await
            .unwrap();

        let account = repo
            .find_external_account(&user.user_id, OAuthProviderKind::Google)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.refresh_token.as_deref(), Some("refresh-1"));
        assert_eq!(repo.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_link_claims_unverified_account() {
        let repo = InMemoryAuthRepository::new();
        let squatter = repo.insert_unverified_user("jane@example.com", "jane").await;
        repo.save_email_verification(&EmailVerification::new(squatter.user_id))
            .await
            .unwrap();
        repo.create_session(&Session::new(squatter.user_id, Duration::days(1)))
            .await
            .unwrap();

        let user = repo
            .link_oauth_identity(&identity(None), &UserName::candidates("jane", "00000000"))
            .await
            .unwrap();

        assert_eq!(user.user_id, squatter.user_id);
        assert!(user.email_verified);
        assert!(user.password_hash.is_none());
        assert_eq!(repo.session_count().await, 0);
        assert!(
            repo.find_email_verification(&user.user_id)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_link_keeps_verified_password() {
        let repo = InMemoryAuthRepository::new();
        let owner = repo.insert_verified_user("jane@example.com", "jane").await;
        repo.create_session(&Session::new(owner.user_id, Duration::days(1)))
            .await
            .unwrap();

        let user = repo
            .link_oauth_identity(&identity(None), &UserName::candidates("jane", "00000000"))
            .await
            .unwrap();

        assert!(user.password_hash.is_some());
        assert_eq!(repo.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_confirm_email_requires_matching_code() {
        let repo = InMemoryAuthRepository::new();
        let user = repo.insert_unverified_user("jane@example.com", "jane").await;
        let record = EmailVerification::new(user.user_id);
        repo.save_email_verification(&record).await.unwrap();

        assert!(!repo.confirm_email(&user.user_id, "wrong").await.unwrap());
        assert!(repo.confirm_email(&user.user_id, &record.code).await.unwrap());
        assert!(!repo.confirm_email(&user.user_id, &record.code).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let repo = InMemoryAuthRepository::new();
        let user = repo.insert_verified_user("jane@example.com", "jane").await;
        repo.create_session(&Session::new(user.user_id, Duration::seconds(-1)))
            .await
            .unwrap();
        repo.create_session(&Session::new(user.user_id, Duration::days(1)))
            .await
            .unwrap();

        assert_eq!(repo.cleanup_expired_sessions().await.unwrap(), 1);
        assert_eq!(repo.session_count().await, 1);
    }
}
