//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.
//! Methods that must be atomic are single calls here so every implementation
//! owns its transaction boundary.

use uuid::Uuid;

use crate::domain::entity::{
    email_verification::EmailVerification, external_account::ExternalAccount,
    password_reset::PasswordReset, session::Session, user::User,
};
use crate::domain::oauth::OAuthIdentity;
use crate::domain::value_object::{
    email::Email, oauth_provider::OAuthProviderKind, user_id::UserId, user_name::UserName,
    user_password::UserPassword,
};
use crate::error::AuthResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a user and its first verification record in one transaction
    ///
    /// Unique violations map to `UsernameTaken` / `EmailTaken`.
    async fn register(&self, user: &User, verification: &EmailVerification) -> AuthResult<()>;

    async fn find_user(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Compared on the canonical form
    async fn exists_by_username(&self, username: &UserName) -> AuthResult<bool>;

    async fn update_password(&self, user_id: &UserId, password: &UserPassword) -> AuthResult<()>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()>;

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>>;

    /// Persist a new expiry (rotation)
    async fn update_session(&self, session: &Session) -> AuthResult<()>;

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()>;

    async fn delete_sessions_for_user(&self, user_id: &UserId) -> AuthResult<u64>;

    /// Delete every session of `user_id` and insert `session`, atomically
    async fn replace_sessions_for_user(
        &self,
        user_id: &UserId,
        session: &Session,
    ) -> AuthResult<u64>;

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64>;
}

/// Email verification and password reset records
#[trait_variant::make(TokenRepository: Send)]
pub trait LocalTokenRepository {
    /// Insert or overwrite the user's verification record
    async fn save_email_verification(&self, record: &EmailVerification) -> AuthResult<()>;

    async fn find_email_verification(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<EmailVerification>>;

    /// Delete the record if it still holds `code` and mark the email verified,
    /// in one transaction. Returns false when nothing matched.
    async fn confirm_email(&self, user_id: &UserId, code: &str) -> AuthResult<bool>;

    /// Insert or overwrite the user's reset record
    async fn save_password_reset(&self, record: &PasswordReset) -> AuthResult<()>;

    async fn find_password_reset(&self, user_id: &UserId) -> AuthResult<Option<PasswordReset>>;

    /// Delete the unexpired record holding `token` and store `password`, in
    /// one transaction. Returns false when nothing matched.
    async fn complete_password_reset(
        &self,
        user_id: &UserId,
        token: &str,
        password: &UserPassword,
    ) -> AuthResult<bool>;

    async fn cleanup_expired_resets(&self) -> AuthResult<u64>;
}

/// OAuth account links
#[trait_variant::make(ExternalAccountRepository: Send)]
pub trait LocalExternalAccountRepository {
    /// Resolve the local user for a provider identity in one transaction
    ///
    /// Finds the user by email or creates one under the first free name in
    /// `username_candidates`, then upserts the external account. A refresh
    /// token already on file is kept when the provider sent none.
    async fn link_oauth_identity(
        &self,
        identity: &OAuthIdentity,
        username_candidates: &[UserName],
    ) -> AuthResult<User>;

    async fn find_external_account(
        &self,
        user_id: &UserId,
        provider: OAuthProviderKind,
    ) -> AuthResult<Option<ExternalAccount>>;
}

/// Everything the HTTP layer needs from storage
pub trait AuthStore:
    UserRepository + SessionRepository + TokenRepository + ExternalAccountRepository + Sync + 'static
{
}

impl<T> AuthStore for T where
    T: UserRepository
        + SessionRepository
        + TokenRepository
        + ExternalAccountRepository
        + Sync
        + 'static
{
}
