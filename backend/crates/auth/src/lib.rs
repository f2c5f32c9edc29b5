//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, outbound ports
//! - `application/` - Session manager, token issuer, OAuth exchange, use cases
//! - `infra/` - PostgreSQL repository, email and OAuth clients; in-memory
//!   test doubles behind the `test-util` feature
//! - `presentation/` - HTTP handlers, DTOs, session middleware, router
//!
//! ## Features
//! - Sign-up with email, username and password; email verification links
//! - Sign-in with password or Google / GitHub (authorization code, PKCE for Google)
//! - Server-side sessions behind an HMAC-signed cookie, rotated at half-life
//! - Password reset by emailed link, password change with optional logout everywhere
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (pinned parameters, rehash on drift)
//! - Link tokens are HS256 JWTs whose code is also stored server-side,
//!   so a link is single-use and a re-issue revokes older links
//! - OAuth `state` and PKCE verifier live in short-lived http-only cookies
//!   and are compared in constant time

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::{AuthConfig, ConfigError};
pub use domain::repository::AuthStore;
pub use error::{AuthError, AuthResult};
pub use infra::{HttpEmailSender, HttpOAuthProvider, PgAuthRepository};
#[cfg(any(test, feature = "test-util"))]
pub use infra::{InMemoryAuthRepository, RecordingEmailSender};
pub use presentation::{AuthAppState, SessionContext, auth_router, auth_routes, with_sessions};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod store {
    pub use crate::infra::postgres::PgAuthRepository as AuthPgStore;
}
