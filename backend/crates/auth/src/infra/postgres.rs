//! PostgreSQL Repository Implementations
//!
//! Schema: `database/migrations`. Email uniqueness is enforced by a unique
//! index on `lower(email)`, username uniqueness by one on
//! `username_canonical`; both are named so violations can be mapped back
//! to the offending field.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::entity::{
    email_verification::EmailVerification, external_account::ExternalAccount,
    password_reset::PasswordReset, session::Session, user::User,
};
use crate::domain::oauth::{OAuthIdentity, OAuthProfile};
use crate::domain::repository::{
    ExternalAccountRepository, SessionRepository, TokenRepository, UserRepository,
};
use crate::domain::value_object::{
    email::Email, oauth_provider::OAuthProviderKind, user_id::UserId, user_name::UserName,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";
const USERNAME_UNIQUE_INDEX: &str = "users_username_canonical_key";

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique violation on the users table to its field conflict
fn map_user_conflict(err: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(EMAIL_UNIQUE_INDEX) => return AuthError::EmailTaken,
            Some(USERNAME_UNIQUE_INDEX) => return AuthError::UsernameTaken,
            _ => {}
        }
    }
    AuthError::Database(err)
}

async fn fetch_user_by_email<'e, E>(executor: E, email: &Email) -> AuthResult<Option<User>>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT
            user_id,
            email,
            username,
            display_name,
            password_hash,
            email_verified,
            profile_image_url,
            bio,
            created_at,
            updated_at
        FROM users
        WHERE lower(email) = lower($1)
        "#,
    )
    .bind(email.as_str())
    .fetch_optional(executor)
    .await?;

    row.map(UserRow::into_user).transpose()
}

async fn refresh_provider_fields<'e, E>(executor: E, user: &User) -> AuthResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE users
        SET display_name = $2,
            profile_image_url = $3,
            updated_at = $4
        WHERE user_id = $1
        "#,
    )
    .bind(user.user_id.as_uuid())
    .bind(&user.display_name)
    .bind(&user.profile_image_url)
    .bind(user.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Sign an existing account in through a provider that vouched for its email
///
/// An account whose email was never confirmed is taken over: its password,
/// sessions and pending links belonged to whoever registered the address.
async fn adopt_existing_user(
    conn: &mut PgConnection,
    mut user: User,
    profile: &OAuthProfile,
) -> AuthResult<User> {
    user.refresh_from_provider(profile.display_name.as_deref(), profile.avatar_url.as_deref());
    refresh_provider_fields(&mut *conn, &user).await?;

    let claimed = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = NULL,
            email_verified = TRUE
        WHERE user_id = $1 AND NOT email_verified
        "#,
    )
    .bind(user.user_id.as_uuid())
    .execute(&mut *conn)
    .await?
    .rows_affected()
        > 0;

    if claimed {
        user.claim_for_provider();

        for statement in [
            "DELETE FROM sessions WHERE user_id = $1",
            "DELETE FROM email_verifications WHERE user_id = $1",
            "DELETE FROM password_resets WHERE user_id = $1",
        ] {
            sqlx::query(statement)
                .bind(user.user_id.as_uuid())
                .execute(&mut *conn)
                .await?;
        }

        tracing::warn!(
            user_id = %user.user_id,
            "Unverified account claimed through OAuth, password and sessions dropped"
        );
    } else {
        // Another transaction may have verified it since the row was read
        user.email_verified = true;
    }

    Ok(user)
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn register(&self, user: &User, verification: &EmailVerification) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                email,
                username,
                username_canonical,
                display_name,
                password_hash,
                email_verified,
                profile_image_url,
                bio,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.email.as_str())
        .bind(user.username.original())
        .bind(user.username.canonical())
        .bind(&user.display_name)
        .bind(user.password_hash.as_ref().map(UserPassword::as_phc_string))
        .bind(user.email_verified)
        .bind(&user.profile_image_url)
        .bind(&user.bio)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_user_conflict)?;

        sqlx::query(
            r#"
            INSERT INTO email_verifications (user_id, code, sent_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(verification.user_id.as_uuid())
        .bind(&verification.code)
        .bind(verification.sent_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_user(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                email,
                username,
                display_name,
                password_hash,
                email_verified,
                profile_image_url,
                bio,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        fetch_user_by_email(&self.pool, email).await
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE lower(email) = lower($1))",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn exists_by_username(&self, username: &UserName) -> AuthResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username_canonical = $1)",
        )
        .bind(username.canonical())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn update_password(&self, user_id: &UserId, password: &UserPassword) -> AuthResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(password.as_phc_string())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, user_id, expires_at, created_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRow::into_session))
    }

    async fn update_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query("UPDATE sessions SET expires_at = $2 WHERE session_id = $1")
            .bind(session.session_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_sessions_for_user(&self, user_id: &UserId) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn replace_sessions_for_user(
        &self,
        user_id: &UserId,
        session: &Session,
    ) -> AuthResult<u64> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, user_id, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id.as_uuid())
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(deleted)
    }

    async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Token Repository Implementation
// ============================================================================

impl TokenRepository for PgAuthRepository {
    async fn save_email_verification(&self, record: &EmailVerification) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO email_verifications (user_id, code, sent_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET code = EXCLUDED.code,
                sent_at = EXCLUDED.sent_at
            "#,
        )
        .bind(record.user_id.as_uuid())
        .bind(&record.code)
        .bind(record.sent_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_email_verification(
        &self,
        user_id: &UserId,
    ) -> AuthResult<Option<EmailVerification>> {
        let row = sqlx::query_as::<_, EmailVerificationRow>(
            "SELECT user_id, code, sent_at FROM email_verifications WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(EmailVerificationRow::into_record))
    }

    async fn confirm_email(&self, user_id: &UserId, code: &str) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM email_verifications WHERE user_id = $1 AND code = $2")
            .bind(user_id.as_uuid())
            .bind(code)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET email_verified = TRUE, updated_at = $2 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn save_password_reset(&self, record: &PasswordReset) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO password_resets (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET token = EXCLUDED.token,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(record.user_id.as_uuid())
        .bind(&record.token)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_password_reset(&self, user_id: &UserId) -> AuthResult<Option<PasswordReset>> {
        let row = sqlx::query_as::<_, PasswordResetRow>(
            "SELECT user_id, token, expires_at FROM password_resets WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PasswordResetRow::into_record))
    }

    async fn complete_password_reset(
        &self,
        user_id: &UserId,
        token: &str,
        password: &UserPassword,
    ) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let deleted = sqlx::query(
            "DELETE FROM password_resets WHERE user_id = $1 AND token = $2 AND expires_at > $3",
        )
        .bind(user_id.as_uuid())
        .bind(token)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .bind(password.as_phc_string())
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn cleanup_expired_resets(&self) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM password_resets WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(resets_deleted = deleted, "Cleaned up expired password resets");

        Ok(deleted)
    }
}

// ============================================================================
// External Account Repository Implementation
// ============================================================================

impl ExternalAccountRepository for PgAuthRepository {
    async fn link_oauth_identity(
        &self,
        identity: &OAuthIdentity,
        username_candidates: &[UserName],
    ) -> AuthResult<User> {
        let profile = &identity.profile;
        let mut tx = self.pool.begin().await?;

        let user = match fetch_user_by_email(&mut *tx, &profile.email).await? {
            Some(user) => adopt_existing_user(&mut *tx, user, profile).await?,
            None => {
                let mut resolved = None;

                for candidate in username_candidates {
                    let user = User::from_provider(
                        profile.email.clone(),
                        candidate.clone(),
                        profile.display_name.clone(),
                        profile.avatar_url.clone(),
                    );

                    let inserted: Option<Uuid> = sqlx::query_scalar(
                        r#"
                        INSERT INTO users (
                            user_id,
                            email,
                            username,
                            username_canonical,
                            display_name,
                            email_verified,
                            profile_image_url,
                            created_at,
                            updated_at
                        ) VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $8)
                        ON CONFLICT DO NOTHING
                        RETURNING user_id
                        "#,
                    )
                    .bind(user.user_id.as_uuid())
                    .bind(user.email.as_str())
                    .bind(user.username.original())
                    .bind(user.username.canonical())
                    .bind(&user.display_name)
                    .bind(&user.profile_image_url)
                    .bind(user.created_at)
                    .bind(user.updated_at)
                    .fetch_optional(&mut *tx)
                    .await?;

                    if inserted.is_some() {
                        resolved = Some(user);
                        break;
                    }

                    // A concurrent first sign-in may have created the email meanwhile
                    if let Some(existing) = fetch_user_by_email(&mut *tx, &profile.email).await? {
                        resolved = Some(adopt_existing_user(&mut *tx, existing, profile).await?);
                        break;
                    }
                }

                resolved.ok_or_else(|| {
                    AuthError::Internal("No free username for OAuth account".to_string())
                })?
            }
        };

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO external_accounts (
                user_id,
                provider,
                provider_account_id,
                access_token,
                refresh_token,
                expires_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ON CONFLICT (user_id, provider) DO UPDATE
            SET provider_account_id = EXCLUDED.provider_account_id,
                access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, external_accounts.refresh_token),
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(identity.provider.as_str())
        .bind(&profile.provider_account_id)
        .bind(&identity.tokens.access_token)
        .bind(&identity.tokens.refresh_token)
        .bind(identity.tokens.expires_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn find_external_account(
        &self,
        user_id: &UserId,
        provider: OAuthProviderKind,
    ) -> AuthResult<Option<ExternalAccount>> {
        let row = sqlx::query_as::<_, ExternalAccountRow>(
            r#"
            SELECT
                user_id,
                provider,
                provider_account_id,
                access_token,
                refresh_token,
                expires_at,
                created_at,
                updated_at
            FROM external_accounts
            WHERE user_id = $1 AND provider = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ExternalAccountRow::into_account).transpose()
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    username: String,
    display_name: Option<String>,
    password_hash: Option<String>,
    email_verified: bool,
    profile_image_url: Option<String>,
    bio: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password_hash = self
            .password_hash
            .map(UserPassword::from_phc_string)
            .transpose()?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            email: Email::from_db(self.email),
            username: UserName::from_db(self.username),
            display_name: self.display_name,
            password_hash,
            email_verified: self.email_verified,
            profile_image_url: self.profile_image_url,
            bio: self.bio,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            session_id: self.session_id,
            user_id: UserId::from_uuid(self.user_id),
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EmailVerificationRow {
    user_id: Uuid,
    code: String,
    sent_at: DateTime<Utc>,
}

impl EmailVerificationRow {
    fn into_record(self) -> EmailVerification {
        EmailVerification {
            user_id: UserId::from_uuid(self.user_id),
            code: self.code,
            sent_at: self.sent_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PasswordResetRow {
    user_id: Uuid,
    token: String,
    expires_at: DateTime<Utc>,
}

impl PasswordResetRow {
    fn into_record(self) -> PasswordReset {
        PasswordReset {
            user_id: UserId::from_uuid(self.user_id),
            token: self.token,
            expires_at: self.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ExternalAccountRow {
    user_id: Uuid,
    provider: String,
    provider_account_id: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExternalAccountRow {
    fn into_account(self) -> AuthResult<ExternalAccount> {
        let provider = self
            .provider
            .parse()
            .map_err(|_| AuthError::Internal(format!("Invalid provider: {}", self.provider)))?;

        Ok(ExternalAccount {
            user_id: UserId::from_uuid(self.user_id),
            provider,
            provider_account_id: self.provider_account_id,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
