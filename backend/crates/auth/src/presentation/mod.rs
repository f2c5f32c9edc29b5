//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and the session middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{SessionContext, resolve_session};
pub use router::{auth_router, auth_routes, with_sessions};
