//! Token Issuer
//!
//! Email verification and password reset links. Each link is a signed
//! bearer token carrying the email and a random code; the same code is
//! stored server-side so a re-issue revokes older links and consuming a
//! link deletes the record.

use std::sync::Arc;

use chrono::Utc;
use platform::crypto::constant_time_eq;

use crate::application::bearer::{BearerTokenCodec, ResetClaims, VerificationClaims};
use crate::application::config::AuthConfig;
use crate::domain::entity::{
    email_verification::EmailVerification, password_reset::PasswordReset, user::User,
};
use crate::domain::repository::{TokenRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_password::UserPassword};
use crate::error::{AuthError, AuthResult, TokenRejection};

pub struct TokenIssuer<R> {
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    codec: BearerTokenCodec,
}

impl<R> Clone for TokenIssuer<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: Arc::clone(&self.config),
            codec: self.codec.clone(),
        }
    }
}

impl<R> TokenIssuer<R>
where
    R: TokenRepository + UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        let codec = BearerTokenCodec::new(&config.token_secret);
        Self {
            repo,
            config,
            codec,
        }
    }

    // ========================================================================
    // Email verification
    // ========================================================================

    /// Build a verification record and its link token without storing it
    ///
    /// Sign-up stores the record together with the user.
    pub fn prepare_email_verification(
        &self,
        user: &User,
    ) -> AuthResult<(EmailVerification, String)> {
        let record = EmailVerification::new(user.user_id);
        let token = self.codec.issue(
            VerificationClaims {
                email: user.email.as_str().to_string(),
                code: record.code.clone(),
            },
            self.config.verification_token_ttl,
        )?;
        Ok((record, token))
    }

    /// Store a new verification record, replacing any previous one
    pub async fn issue_email_verification(&self, user: &User) -> AuthResult<String> {
        let (record, token) = self.prepare_email_verification(user)?;
        self.repo.save_email_verification(&record).await?;
        Ok(token)
    }

    /// Re-issue unless the previous email went out within the cooldown
    pub async fn resend_email_verification(&self, user: &User) -> AuthResult<String> {
        if let Some(record) = self.repo.find_email_verification(&user.user_id).await? {
            if let Some(remaining_secs) =
                record.cooldown_remaining(self.config.resend_cooldown(), Utc::now())
            {
                return Err(AuthError::ResendCooldown { remaining_secs });
            }
        }

        self.issue_email_verification(user).await
    }

    /// Verify a link token, mark the email verified and delete the record
    pub async fn consume_email_verification(&self, token: &str) -> AuthResult<User> {
        let claims: VerificationClaims = self.codec.verify(token)?;
        let mut user = self.user_for_claim(&claims.email).await?;

        let record = self
            .repo
            .find_email_verification(&user.user_id)
            .await?
            .ok_or(AuthError::InvalidToken(TokenRejection::NoRecord))?;

        if !constant_time_eq(record.code.as_bytes(), claims.code.as_bytes()) {
            return Err(AuthError::InvalidToken(TokenRejection::CodeMismatch));
        }

        // A concurrent consume may have won between the read and this write
        if !self.repo.confirm_email(&user.user_id, &record.code).await? {
            return Err(AuthError::InvalidToken(TokenRejection::NoRecord));
        }

        user.mark_email_verified();
        tracing::info!(user_id = %user.user_id, "Email verified");
        Ok(user)
    }

    // ========================================================================
    // Password reset
    // ========================================================================

    /// Store a new reset record, replacing any previous one
    pub async fn issue_password_reset(&self, user: &User) -> AuthResult<String> {
        let record = PasswordReset::new(user.user_id, self.config.reset_record_ttl());
        let token = self.codec.issue(
            ResetClaims {
                email: user.email.as_str().to_string(),
                reset_token: record.token.clone(),
            },
            self.config.reset_token_ttl,
        )?;

        self.repo.save_password_reset(&record).await?;
        Ok(token)
    }

    /// Verify a reset link and store `new_password`, deleting the record
    pub async fn consume_password_reset(
        &self,
        token: &str,
        new_password: &UserPassword,
    ) -> AuthResult<User> {
        let claims: ResetClaims = self.codec.verify(token)?;
        let mut user = self.user_for_claim(&claims.email).await?;

        let record = self
            .repo
            .find_password_reset(&user.user_id)
            .await?
            .ok_or(AuthError::InvalidToken(TokenRejection::NoRecord))?;

        if !constant_time_eq(record.token.as_bytes(), claims.reset_token.as_bytes()) {
            return Err(AuthError::InvalidToken(TokenRejection::CodeMismatch));
        }

        if record.is_expired_at(Utc::now()) {
            return Err(AuthError::InvalidToken(TokenRejection::RecordExpired));
        }

        if !self
            .repo
            .complete_password_reset(&user.user_id, &record.token, new_password)
            .await?
        {
            return Err(AuthError::InvalidToken(TokenRejection::NoRecord));
        }

        user.set_password(new_password.clone());
        tracing::info!(user_id = %user.user_id, "Password reset");
        Ok(user)
    }

    async fn user_for_claim(&self, email: &str) -> AuthResult<User> {
        let email =
            Email::new(email).map_err(|_| AuthError::InvalidToken(TokenRejection::UnknownUser))?;
        self.repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidToken(TokenRejection::UnknownUser))
    }
}
