//! HTTP Handlers

use auth::SessionContext;
use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::{
    AddItemUseCase, DeleteCategoryUseCase, DeleteItemUseCase, GetProfileUseCase,
    PublicProfileUseCase, UpdateItemUseCase, UpdateProfileUseCase,
};
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::{CategoryId, ItemId, UserId};
use crate::error::{ProfileError, ProfileResult};
use crate::presentation::dto::{
    ItemRequest, ItemResponse, ProfileResponse, PublicProfileResponse, UpdateProfileRequest,
    UpdateProfileResponse,
};

/// Shared state for profile handlers
pub struct ProfileAppState<R> {
    pub repo: Arc<R>,
}

impl<R> Clone for ProfileAppState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R> ProfileAppState<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo: Arc::new(repo),
        }
    }
}

fn signed_in(session: &SessionContext) -> ProfileResult<UserId> {
    Ok(session.require()?.user.user_id)
}

// ============================================================================
// Own profile
// ============================================================================

/// GET /api/profile
pub async fn get_profile<R>(
    State(state): State<ProfileAppState<R>>,
    Extension(session): Extension<SessionContext>,
) -> ProfileResult<Json<ProfileResponse>>
where
    R: ProfileRepository + Sync + 'static,
{
    let user_id = signed_in(&session)?;
    let profile = GetProfileUseCase::new(state.repo.clone())
        .execute(&user_id)
        .await?;
    Ok(Json(profile.into()))
}

/// PUT /api/profile
pub async fn update_profile<R>(
    State(state): State<ProfileAppState<R>>,
    Extension(session): Extension<SessionContext>,
    Json(req): Json<UpdateProfileRequest>,
) -> ProfileResult<Json<UpdateProfileResponse>>
where
    R: ProfileRepository + Sync + 'static,
{
    let user_id = signed_in(&session)?;
    let output = UpdateProfileUseCase::new(state.repo.clone())
        .execute(&user_id, req.into())
        .await?;
    Ok(Json(output.into()))
}

// ============================================================================
// Items and categories
// ============================================================================

/// POST /api/items
pub async fn add_item<R>(
    State(state): State<ProfileAppState<R>>,
    Extension(session): Extension<SessionContext>,
    Json(req): Json<ItemRequest>,
) -> ProfileResult<impl IntoResponse>
where
    R: ProfileRepository + Sync + 'static,
{
    let user_id = signed_in(&session)?;
    let item = AddItemUseCase::new(state.repo.clone())
        .execute(&user_id, req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// PUT /api/items/{item_id}
pub async fn update_item<R>(
    State(state): State<ProfileAppState<R>>,
    Extension(session): Extension<SessionContext>,
    Path(item_id): Path<String>,
    Json(req): Json<ItemRequest>,
) -> ProfileResult<Json<ItemResponse>>
where
    R: ProfileRepository + Sync + 'static,
{
    let user_id = signed_in(&session)?;
    let item_id: ItemId = item_id.parse().map_err(|_| ProfileError::ItemNotFound)?;
    let item = UpdateItemUseCase::new(state.repo.clone())
        .execute(&user_id, &item_id, req.into())
        .await?;
    Ok(Json(item.into()))
}

/// DELETE /api/items/{item_id}
pub async fn delete_item<R>(
    State(state): State<ProfileAppState<R>>,
    Extension(session): Extension<SessionContext>,
    Path(item_id): Path<String>,
) -> ProfileResult<StatusCode>
where
    R: ProfileRepository + Sync + 'static,
{
    let user_id = signed_in(&session)?;
    let item_id: ItemId = item_id.parse().map_err(|_| ProfileError::ItemNotFound)?;
    DeleteItemUseCase::new(state.repo.clone())
        .execute(&user_id, &item_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/categories/{category_id}
pub async fn delete_category<R>(
    State(state): State<ProfileAppState<R>>,
    Extension(session): Extension<SessionContext>,
    Path(category_id): Path<String>,
) -> ProfileResult<StatusCode>
where
    R: ProfileRepository + Sync + 'static,
{
    let user_id = signed_in(&session)?;
    let category_id: CategoryId = category_id
        .parse()
        .map_err(|_| ProfileError::CategoryNotFound)?;
    DeleteCategoryUseCase::new(state.repo.clone())
        .execute(&user_id, &category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Public profile
// ============================================================================

/// GET /api/users/{username}
///
/// Open to everyone; a signed-in owner additionally gets `isOwnProfile`.
pub async fn public_profile<R>(
    State(state): State<ProfileAppState<R>>,
    Extension(session): Extension<SessionContext>,
    Path(username): Path<String>,
) -> ProfileResult<Json<PublicProfileResponse>>
where
    R: ProfileRepository + Sync + 'static,
{
    let viewer = session.0.as_ref().map(|validated| validated.user.user_id);
    let page = PublicProfileUseCase::new(state.repo.clone())
        .execute(&username, viewer.as_ref())
        .await?;
    Ok(Json(page.into()))
}
