//! Update Item Use Case
//!
//! Overwrites an item the caller owns. The slug, and so the item's link,
//! does not change.

use std::sync::Arc;

use crate::domain::entity::item::{Item, ItemDraft, ItemInput};
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::{ItemId, UserId};
use crate::error::{ProfileError, ProfileResult};

pub struct UpdateItemUseCase<R> {
    repo: Arc<R>,
}

impl<R: ProfileRepository> UpdateItemUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(
        &self,
        owner: &UserId,
        item_id: &ItemId,
        input: ItemInput,
    ) -> ProfileResult<Item> {
        let draft = ItemDraft::new(input)?;

        let item = self
            .repo
            .update_item(owner, item_id, &draft)
            .await?
            .ok_or(ProfileError::ItemNotFound)?;

        tracing::info!(user_id = %owner, item_id = %item_id, "Item updated");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::add_item::AddItemUseCase;
    use crate::infra::memory::InMemoryProfileRepository;

    fn input(name: &str, category: &str, links: &[&str]) -> ItemInput {
        ItemInput {
            name: name.into(),
            category: category.into(),
            affiliate_links: links.iter().map(|l| l.to_string()).collect(),
            ..ItemInput::default()
        }
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_links() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;
        let item = AddItemUseCase::new(repo.clone())
            .execute(
                &jane.user_id,
                input("Desk Lamp", "Office", &["https://a.example.com", "https://b.example.com"]),
            )
            .await
            .unwrap();

        let updated = UpdateItemUseCase::new(repo.clone())
            .execute(
                &jane.user_id,
                &item.item_id,
                input("Floor Lamp", "Living Room", &["https://c.example.com"]),
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Floor Lamp");
        assert_eq!(updated.slug, "desk-lamp");
        assert_eq!(updated.category.name, "Living Room");
        assert_eq!(updated.affiliate_links.len(), 1);
        assert_eq!(updated.affiliate_links[0].url.as_str(), "https://c.example.com");
        assert_eq!(updated.created_at, item.created_at);
    }

    #[tokio::test]
    async fn test_foreign_item_is_not_found() {
        let repo = Arc::new(InMemoryProfileRepository::new());
        let jane = repo.insert_profile("jane@example.com", "jane").await;
        let mallory = repo.insert_profile("mallory@example.com", "mallory").await;
        let item = AddItemUseCase::new(repo.clone())
            .execute(&jane.user_id, input("Desk Lamp", "Office", &[]))
            .await
            .unwrap();

        let err = UpdateItemUseCase::new(repo.clone())
            .execute(&mallory.user_id, &item.item_id, input("Mine now", "Loot", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProfileError::ItemNotFound));

        let items = repo.list_items(&jane.user_id).await.unwrap();
        assert_eq!(items[0].name, "Desk Lamp");
        // The attempt left no category behind for the caller
        assert!(repo.list_categories(&mallory.user_id).await.unwrap().is_empty());
    }
}
