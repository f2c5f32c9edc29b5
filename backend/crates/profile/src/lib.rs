//! Profile Backend Module
//!
//! The editable profile and the public link page built on top of auth
//! accounts:
//! - `domain/` - Profile, item and category entities, slugs, web URLs
//! - `application/` - Use cases for the editor and the public page
//! - `infra/` - PostgreSQL repository; in-memory test double behind `test-util`
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! Every editor route needs a session; the public page does not. Items and
//! categories of other users are reported as not found, never forbidden.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use domain::repository::ProfileRepository;
pub use error::{ProfileError, ProfileResult};
#[cfg(any(test, feature = "test-util"))]
pub use infra::InMemoryProfileRepository;
pub use infra::PgProfileRepository;
pub use presentation::{ProfileAppState, profile_router};
