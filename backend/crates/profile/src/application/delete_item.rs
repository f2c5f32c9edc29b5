//! Delete Item Use Case

use std::sync::Arc;

use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::{ItemId, UserId};
use crate::error::{ProfileError, ProfileResult};

pub struct DeleteItemUseCase<R> {
    repo: Arc<R>,
}

impl<R: ProfileRepository> DeleteItemUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Delete an owned item and its affiliate links; its category stays
    pub async fn execute(&self, owner: &UserId, item_id: &ItemId) -> ProfileResult<()> {
        if !self.repo.delete_item(owner, item_id).await? {
            return Err(ProfileError::ItemNotFound);
        }

        tracing::info!(user_id = %owner, item_id = %item_id, "Item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::add_item::AddItemUseCase;
    use crate::domain::entity::item::ItemInput;
    use crate::infra::memory::InMemoryProfileRepository;

    #[tokio::test]
    async fn test_only_owner_can_delete() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;
        let mallory = repo.insert_profile("mallory@example.com", "mallory").await;
        let item = AddItemUseCase::new(repo.clone())
            .execute(
                &jane.user_id,
                ItemInput {
                    name: "Desk Lamp".into(),
                    category: "Office".into(),
                    ..ItemInput::default()
                },
            )
            .await
            .unwrap();
        let use_case = DeleteItemUseCase::new(repo.clone());

        let err = use_case
            .execute(&mallory.user_id, &item.item_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::ItemNotFound));
        assert_eq!(repo.item_count().await, 1);

        use_case.execute(&jane.user_id, &item.item_id).await.unwrap();
        assert_eq!(repo.item_count().await, 0);
        assert_eq!(repo.category_count().await, 1);

        let err = use_case.execute(&jane.user_id, &item.item_id).await.unwrap_err();
        assert!(matches!(err, ProfileError::ItemNotFound));
    }
}
