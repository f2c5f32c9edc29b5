//! Add Item Use Case

use std::sync::Arc;

use crate::domain::entity::item::{Item, ItemDraft, ItemInput};
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::UserId;
use crate::domain::value_object::slug::item_slug_candidates;
use crate::error::ProfileResult;

pub struct AddItemUseCase<R> {
    repo: Arc<R>,
}

impl<R: ProfileRepository> AddItemUseCase<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// File a new item under its category, creating the category if needed
    pub async fn execute(&self, owner: &UserId, input: ItemInput) -> ProfileResult<Item> {
        let draft = ItemDraft::new(input)?;
        let slugs = item_slug_candidates(&draft.name);

        let item = self.repo.create_item(owner, &draft, &slugs).await?;

        tracing::info!(
            user_id = %owner,
            item_id = %item.item_id,
            slug = %item.slug,
            "Item added"
        );
        Ok(item)
    }
}
