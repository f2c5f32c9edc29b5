//! Email Senders
//!
//! [`HttpEmailSender`] hands messages to the external email service over
//! HTTP. `RecordingEmailSender` (feature `test-util`) keeps them in memory
//! for tests.

use std::time::Duration;

use crate::domain::mailer::{EmailMessage, EmailSender};
use crate::error::{AuthError, AuthResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// HTTP sender
// ============================================================================

/// Where verification and reset messages are posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailEndpoints {
    pub verification: String,
    pub password_reset: String,
}

impl EmailEndpoints {
    /// Defaults to the service mounted under `public_base_url`
    pub fn from_lookup<F>(public_base_url: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            verification: lookup("EMAIL_VERIFICATION_ENDPOINT")
                .unwrap_or_else(|| format!("{public_base_url}/api/send")),
            password_reset: lookup("EMAIL_RESET_ENDPOINT")
                .unwrap_or_else(|| format!("{public_base_url}/api/send-reset-email")),
        }
    }

    pub fn from_env(public_base_url: &str) -> Self {
        Self::from_lookup(public_base_url, |name| std::env::var(name).ok())
    }
}

#[derive(Debug, Clone)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    endpoints: EmailEndpoints,
}

impl HttpEmailSender {
    pub fn new(endpoints: EmailEndpoints) -> AuthResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Internal(format!("Failed to build email client: {e}")))?;

        Ok(Self { client, endpoints })
    }

    async fn post(&self, endpoint: &str, message: &EmailMessage) -> AuthResult<()> {
        let response = self
            .client
            .post(endpoint)
            .json(message)
            .send()
            .await
            .map_err(|e| AuthError::EmailDelivery(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(endpoint, "Email handed to delivery service");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AuthError::EmailDelivery(format!(
            "{endpoint} answered {status}: {body}"
        )))
    }
}

impl EmailSender for HttpEmailSender {
    async fn send_verification_email(&self, message: &EmailMessage) -> AuthResult<()> {
        self.post(&self.endpoints.verification, message).await
    }

    async fn send_password_reset_email(&self, message: &EmailMessage) -> AuthResult<()> {
        self.post(&self.endpoints.password_reset, message).await
    }
}

// ============================================================================
// Recording sender
// ============================================================================

#[cfg(any(test, feature = "test-util"))]
pub use recording::{EmailKind, RecordingEmailSender, SentEmail};

#[cfg(any(test, feature = "test-util"))]
mod recording {
    use tokio::sync::Mutex;

    use crate::domain::mailer::{EmailMessage, EmailSender};
    use crate::error::{AuthError, AuthResult};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum EmailKind {
        Verification,
        PasswordReset,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentEmail {
        pub kind: EmailKind,
        pub message: EmailMessage,
    }

    /// Captures every message; when failing, records nothing and errors
    #[derive(Debug, Default)]
    pub struct RecordingEmailSender {
        sent: Mutex<Vec<SentEmail>>,
        fail: bool,
    }

    impl RecordingEmailSender {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub async fn sent(&self) -> Vec<SentEmail> {
            self.sent.lock().await.clone()
        }

        async fn record(&self, kind: EmailKind, message: &EmailMessage) -> AuthResult<()> {
            if self.fail {
                return Err(AuthError::EmailDelivery("recording sender set to fail".to_string()));
            }

            self.sent.lock().await.push(SentEmail {
                kind,
                message: message.clone(),
            });
            Ok(())
        }
    }

    impl EmailSender for RecordingEmailSender {
        async fn send_verification_email(&self, message: &EmailMessage) -> AuthResult<()> {
            self.record(EmailKind::Verification, message).await
        }

        async fn send_password_reset_email(&self, message: &EmailMessage) -> AuthResult<()> {
            self.record(EmailKind::PasswordReset, message).await
        }
    }
}
