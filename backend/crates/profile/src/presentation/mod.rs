//! Presentation Layer
//!
//! HTTP handlers, DTOs and the router. Routes expect the auth session
//! layer (`auth::with_sessions`) around them.

pub mod dto;
pub mod handlers;
pub mod router;

pub use handlers::ProfileAppState;
pub use router::profile_router;
