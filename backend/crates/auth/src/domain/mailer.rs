//! Outbound Email Port
//!
//! Rendering and delivery belong to an external service; the core only
//! hands over the recipient, the username and the action link.

use serde::Serialize;

use crate::error::AuthResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub username: String,
    pub url: String,
}

#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    async fn send_verification_email(&self, message: &EmailMessage) -> AuthResult<()>;

    async fn send_password_reset_email(&self, message: &EmailMessage) -> AuthResult<()>;
}
