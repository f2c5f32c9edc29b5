//! Infrastructure Layer
//!
//! PostgreSQL repository; the in-memory one is a test double compiled for
//! this crate's tests or with `test-util`.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryProfileRepository;
pub use postgres::PgProfileRepository;
