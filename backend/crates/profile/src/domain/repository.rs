//! Repository Traits
//!
//! Every write that touches more than one row is a single call so the
//! implementation owns the transaction. Ownership is part of each item and
//! category query: another user's record behaves as if it did not exist.

use auth::domain::value_object::user_name::UserName;

use crate::domain::entity::{
    category::{Category, CategoryDeletion},
    item::{Item, ItemDraft},
    profile::Profile,
};
use crate::domain::value_object::ids::{CategoryId, ItemId, UserId};
use crate::error::ProfileResult;

#[trait_variant::make(ProfileRepository: Send)]
pub trait LocalProfileRepository {
    async fn find_profile(&self, user_id: &UserId) -> ProfileResult<Option<Profile>>;

    /// Compared on the canonical form
    async fn find_profile_by_username(&self, username: &UserName)
    -> ProfileResult<Option<Profile>>;

    /// Write the user row and replace its social links in one transaction
    ///
    /// Unique violations map to `UsernameTaken` / `EmailTaken`. Returns the
    /// stored `email_verified`, which is cleared when the address changed.
    async fn save_profile(&self, profile: &Profile) -> ProfileResult<bool>;

    /// Sorted by name
    async fn list_categories(&self, user_id: &UserId) -> ProfileResult<Vec<Category>>;

    /// Newest first
    async fn list_items(&self, user_id: &UserId) -> ProfileResult<Vec<Item>>;

    /// Insert an item under the first free slug of `slugs`
    ///
    /// The category named by the draft is reused or created, and the
    /// affiliate links inserted, in the same transaction. Fails with a
    /// validation error when every slug is taken.
    async fn create_item(&self, owner: &UserId, draft: &ItemDraft, slugs: &[String])
    -> ProfileResult<Item>;

    /// Overwrite an owned item and replace its affiliate links; the slug stays
    async fn update_item(
        &self,
        owner: &UserId,
        item_id: &ItemId,
        draft: &ItemDraft,
    ) -> ProfileResult<Option<Item>>;

    /// Delete an owned item with its affiliate links; false when not found
    async fn delete_item(&self, owner: &UserId, item_id: &ItemId) -> ProfileResult<bool>;

    async fn delete_category(
        &self,
        owner: &UserId,
        category_id: &CategoryId,
    ) -> ProfileResult<CategoryDeletion>;
}
