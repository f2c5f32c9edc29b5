//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the ports for
//! outbound email and OAuth providers.

pub mod entity;
pub mod mailer;
pub mod oauth;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{session::Session, user::User};
pub use mailer::{EmailMessage, EmailSender};
pub use oauth::{OAuthIdentity, OAuthProfile, OAuthProvider, OAuthTokens};
pub use repository::{
    AuthStore, ExternalAccountRepository, SessionRepository, TokenRepository, UserRepository,
};
