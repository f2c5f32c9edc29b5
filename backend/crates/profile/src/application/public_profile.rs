//! Public Profile Use Case
//!
//! Everything shown on `/<username>`: the owner, their categories and
//! their items, newest first.

use std::sync::Arc;

use auth::domain::value_object::user_name::UserName;

use crate::domain::entity::{category::Category, item::Item, profile::Profile};
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::UserId;
use crate::error::{ProfileError, ProfileResult};

#[derive(Debug)]
pub struct PublicProfile {
    pub profile: Profile,
    pub categories: Vec<Category>,
    pub items: Vec<Item>,
    /// The viewer is the owner and may edit
    pub is_own_profile: bool,
}

pub struct PublicProfileUseCase<R> {
    repo: Arc<R>,
}

impl<R: ProfileRepository> PublicProfileUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// A handle that could never be registered is simply not found
    pub async fn execute(
        &self,
        username: &str,
        viewer: Option<&UserId>,
    ) -> ProfileResult<PublicProfile> {
        let username = UserName::new(username).map_err(|_| ProfileError::UserNotFound)?;

        let profile = self
            .repo
            .find_profile_by_username(&username)
            .await?
            .ok_or(ProfileError::UserNotFound)?;

        let categories = self.repo.list_categories(&profile.user_id).await?;
        let items = self.repo.list_items(&profile.user_id).await?;
        let is_own_profile = viewer == Some(&profile.user_id);

        Ok(PublicProfile {
            profile,
            categories,
            items,
            is_own_profile,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::item::{ItemDraft, ItemInput};
    use crate::domain::value_object::slug::item_slug_candidates;
    use crate::infra::memory::InMemoryProfileRepository;

    async fn add(repo: &InMemoryProfileRepository, owner: &UserId, name: &str, category: &str) {
        let draft = ItemDraft::new(ItemInput {
            name: name.into(),
            category: category.into(),
            ..ItemInput::default()
        })
        .unwrap();
        repo.create_item(owner, &draft, &item_slug_candidates(name))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "JaneDoe").await;
        add(&repo, &jane.user_id, "Desk Lamp", "Office").await;
        add(&repo, &jane.user_id, "Notebook", "Office").await;

        let page = PublicProfileUseCase::new(repo)
            .execute("janedoe", None)
            .await
            .unwrap();

        assert_eq!(page.profile.username.original(), "JaneDoe");
        assert_eq!(page.categories.len(), 1);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "Notebook");
        assert!(!page.is_own_profile);
    }

    #[tokio::test]
    async fn test_owner_sees_own_profile() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;
        let john = repo.insert_profile("john@example.com", "john").await;
        let use_case = PublicProfileUseCase::new(repo);

        assert!(use_case.execute("jane", Some(&jane.user_id)).await.unwrap().is_own_profile);
        assert!(!use_case.execute("jane", Some(&john.user_id)).await.unwrap().is_own_profile);
    }

    #[tokio::test]
    async fn test_unknown_or_malformed_username() {
        let use_case = PublicProfileUseCase::new(Arc::new(InMemoryProfileRepository::new()));

        for username in ["nobody", "no body", ""] {
            let err = use_case.execute(username, None).await.unwrap_err();
            assert!(matches!(err, ProfileError::UserNotFound));
        }
    }
}
