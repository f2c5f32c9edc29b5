//! Profile Router

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::domain::repository::ProfileRepository;
use crate::presentation::handlers::{self, ProfileAppState};

/// Profile editor and public page routes
///
/// Wrap the merged router with `auth::with_sessions`; the handlers read the
/// session it resolves.
pub fn profile_router<R>(state: ProfileAppState<R>) -> Router
where
    R: ProfileRepository + Sync + 'static,
{
    Router::new()
        .route(
            "/api/profile",
            get(handlers::get_profile::<R>).put(handlers::update_profile::<R>),
        )
        .route("/api/items", post(handlers::add_item::<R>))
        .route(
            "/api/items/{item_id}",
            put(handlers::update_item::<R>).delete(handlers::delete_item::<R>),
        )
        .route(
            "/api/categories/{category_id}",
            delete(handlers::delete_category::<R>),
        )
        .route("/api/users/{username}", get(handlers::public_profile::<R>))
        .with_state(state)
}
