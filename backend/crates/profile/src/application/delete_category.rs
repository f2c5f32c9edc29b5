//! Delete Category Use Case
//!
//! Only an empty category can go; items are never deleted implicitly.

use std::sync::Arc;

use crate::domain::entity::category::CategoryDeletion;
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::{CategoryId, UserId};
use crate::error::{ProfileError, ProfileResult};

pub struct DeleteCategoryUseCase<R> {
    repo: Arc<R>,
}

impl<R: ProfileRepository> DeleteCategoryUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, owner: &UserId, category_id: &CategoryId) -> ProfileResult<()> {
        match self.repo.delete_category(owner, category_id).await? {
            CategoryDeletion::Deleted => {
                tracing::info!(user_id = %owner, category_id = %category_id, "Category deleted");
                Ok(())
            }
            CategoryDeletion::NotFound => Err(ProfileError::CategoryNotFound),
            CategoryDeletion::InUse => Err(ProfileError::CategoryInUse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{add_item::AddItemUseCase, delete_item::DeleteItemUseCase};
    use crate::domain::entity::item::ItemInput;
    use crate::infra::memory::InMemoryProfileRepository;

    #[tokio::test]
    async fn test_category_with_items_is_kept() {
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
        let category_id = item.category.category_id;
        let use_case = DeleteCategoryUseCase::new(repo.clone());

        let err = use_case.execute(&jane.user_id, &category_id).await.unwrap_err();
        assert!(matches!(err, ProfileError::CategoryInUse));

        DeleteItemUseCase::new(repo.clone())
            .execute(&jane.user_id, &item.item_id)
            .await
            .unwrap();

        let err = use_case
            .execute(&mallory.user_id, &category_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::CategoryNotFound));

        use_case.execute(&jane.user_id, &category_id).await.unwrap();
        assert_eq!(repo.category_count().await, 0);
    }
}
