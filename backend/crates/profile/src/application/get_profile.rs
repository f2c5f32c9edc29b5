//! Get Profile Use Case
//!
//! The signed-in user's editable profile.

use std::sync::Arc;

use crate::domain::entity::profile::Profile;
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::UserId;
use crate::error::{ProfileError, ProfileResult};

pub struct GetProfileUseCase<R> {
    repo: Arc<R>,
}

impl<R: ProfileRepository> GetProfileUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &UserId) -> ProfileResult<Profile> {
        self.repo
            .find_profile(user_id)
            .await?
            .ok_or(ProfileError::UserNotFound)
    }
}
