//! Infrastructure Layer
//!
//! Repository implementations and clients for the external email service
//! and OAuth providers. The in-memory repository and recording mailer are
//! test doubles, compiled for this crate's tests or with `test-util`.

pub mod mailer;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod oauth;
pub mod postgres;

pub use mailer::{EmailEndpoints, HttpEmailSender};
#[cfg(any(test, feature = "test-util"))]
pub use mailer::RecordingEmailSender;
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryAuthRepository;
pub use oauth::{HttpOAuthProvider, OAuthClientConfig};
pub use postgres::PgAuthRepository;
