//! Update Profile Use Case
//!
//! Replaces every editable field at once; social links submitted are the
//! complete new list.

use std::sync::Arc;

use auth::domain::value_object::user_name::UserName;

use crate::domain::entity::profile::{Profile, ProfileChanges, ProfileChangesInput};
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::UserId;
use crate::error::{ProfileError, ProfileResult};

#[derive(Debug)]
pub struct UpdateProfileOutput {
    pub profile: Profile,
    /// Handle the public page lived under before the update
    pub old_username: UserName,
}

pub struct UpdateProfileUseCase<R> {
    repo: Arc<R>,
}

impl<R: ProfileRepository> UpdateProfileUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        user_id: &UserId,
        input: ProfileChangesInput,
    ) -> ProfileResult<UpdateProfileOutput> {
        let changes = ProfileChanges::new(input)?;

        let mut profile = self
            .repo
            .find_profile(user_id)
            .await?
            .ok_or(ProfileError::UserNotFound)?;
        let old_username = profile.username.clone();
        let old_email = profile.email.clone();

        profile.apply(changes);
        profile.email_verified = self.repo.save_profile(&profile).await?;

        tracing::info!(
            user_id = %user_id,
            username_changed = old_username.canonical() != profile.username.canonical(),
            email_changed = old_email != profile.email,
            "Profile updated"
        );

        Ok(UpdateProfileOutput {
            profile,
            old_username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::profile::SocialLinkInput;
    use crate::infra::memory::InMemoryProfileRepository;

    fn input(username: &str, email: &str) -> ProfileChangesInput {
        ProfileChangesInput {
            name: Some("Jane Doe".into()),
            username: username.into(),
            email: email.into(),
            bio: Some("Things I use every day".into()),
            profile_image_url: None,
            social_links: vec![SocialLinkInput {
                platform: "github".into(),
                url: "https://github.com/jane".into(),
            }],
        }
    }

    #[tokio::test]
    async fn test_update_returns_old_username() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;

        let output = UpdateProfileUseCase::new(repo.clone())
            .execute(&jane.user_id, input("JaneDoe", "jane@example.com"))
            .await
            .unwrap();

        assert_eq!(output.old_username.original(), "jane");
        assert_eq!(output.profile.username.original(), "JaneDoe");
        assert!(output.profile.email_verified);

        let stored = repo.find_profile(&jane.user_id).await.unwrap().unwrap();
        assert_eq!(stored.bio.as_deref(), Some("Things I use every day"));
        assert_eq!(stored.social_links.len(), 1);
    }

    #[tokio::test]
    async fn test_social_links_are_replaced() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;
        let use_case = UpdateProfileUseCase::new(repo.clone());

        use_case
            .execute(&jane.user_id, input("jane", "jane@example.com"))
            .await
            .unwrap();
        let mut cleared = input("jane", "jane@example.com");
        cleared.social_links.clear();
        use_case.execute(&jane.user_id, cleared).await.unwrap();

        let stored = repo.find_profile(&jane.user_id).await.unwrap().unwrap();
        assert!(stored.social_links.is_empty());
    }

    #[tokio::test]
    async fn test_new_email_must_be_verified_again() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;

        let output = UpdateProfileUseCase::new(repo)
            .execute(&jane.user_id, input("jane", "jane@work.example.com"))
            .await
            .unwrap();
        assert!(!output.profile.email_verified);
    }

    #[tokio::test]
    async fn test_taken_username_and_email() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;
        repo.insert_profile("john@example.com", "john").await;
        let use_case = UpdateProfileUseCase::new(repo);

        let err = use_case
            .execute(&jane.user_id, input("JOHN", "jane@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::UsernameTaken));

        let err = use_case
            .execute(&jane.user_id, input("jane", "John@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::EmailTaken));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let err = UpdateProfileUseCase::new(repo)
            .execute(&UserId::new(), input("jane", "jane@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::UserNotFound));
    }
}
