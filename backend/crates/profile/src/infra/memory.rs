//! In-Memory Profile Repository
//!
//! One `tokio::sync::Mutex` over every table, so each call is atomic. Test
//! double only: profiles are seeded from auth `User`s with the same id.

use std::collections::HashMap;

use auth::domain::User;
use auth::domain::value_object::{email::Email, user_name::UserName};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::entity::{
    category::{Category, CategoryDeletion},
    item::{Item, ItemDraft},
    profile::Profile,
};
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::{CategoryId, ItemId, UserId};
use crate::domain::value_object::web_url::WebUrl;
use crate::error::{ProfileError, ProfileResult};

#[derive(Default)]
struct State {
    profiles: HashMap<UserId, Profile>,
    categories: HashMap<CategoryId, Category>,
    /// Insertion order
    items: Vec<Item>,
}

impl State {
    fn connect_or_create_category(&mut self, owner: &UserId, name: &str) -> Category {
        if let Some(existing) = self
            .categories
            .values()
            .find(|c| c.user_id == *owner && c.name == name)
        {
            return existing.clone();
        }

        let category = Category::new(*owner, name.to_string());
        self.categories
            .insert(category.category_id, category.clone());
        category
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    state: Mutex<State>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror an auth account as a profile with no social links
    pub async fn insert_user(&self, user: &User) -> Profile {
        let profile = Profile {
            user_id: user.user_id,
            name: user.display_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            email_verified: user.email_verified,
            bio: user.bio.clone(),
            profile_image_url: user.profile_image_url.clone().map(WebUrl::from_db),
            social_links: Vec::new(),
            updated_at: user.updated_at,
        };
        self.state
            .lock()
            .await
            .profiles
            .insert(profile.user_id, profile.clone());
        profile
    }

    /// Seed a verified account that exists only on the profile side
    ///
    /// # Panics
    /// If `email` or `username` is invalid.
    pub async fn insert_profile(&self, email: &str, username: &str) -> Profile {
        let user = User::from_provider(
            Email::new(email).expect("valid seed email"),
            UserName::new(username).expect("valid seed username"),
            None,
            None,
        );
        self.insert_user(&user).await
    }

    pub async fn category_count(&self) -> usize {
        self.state.lock().await.categories.len()
    }

    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    async fn find_profile(&self, user_id: &UserId) -> ProfileResult<Option<Profile>> {
        Ok(self.state.lock().await.profiles.get(user_id).cloned())
    }

    async fn find_profile_by_username(
        &self,
        username: &UserName,
    ) -> ProfileResult<Option<Profile>> {
        Ok(self
            .state
            .lock()
            .await
            .profiles
            .values()
            .find(|p| p.username.canonical() == username.canonical())
            .cloned())
    }

    async fn save_profile(&self, profile: &Profile) -> ProfileResult<bool> {
        let mut state = self.state.lock().await;

        let Some(stored) = state.profiles.get(&profile.user_id) else {
            return Err(ProfileError::UserNotFound);
        };
        let verified = stored.email_verified && stored.email == profile.email;

        let conflict = state
            .profiles
            .values()
            .filter(|p| p.user_id != profile.user_id)
            .find_map(|p| {
                if p.email == profile.email {
                    Some(ProfileError::EmailTaken)
                } else if p.username.canonical() == profile.username.canonical() {
                    Some(ProfileError::UsernameTaken)
                } else {
                    None
                }
            });
        if let Some(err) = conflict {
            return Err(err);
        }

        let mut saved = profile.clone();
        saved.email_verified = verified;
        state.profiles.insert(saved.user_id, saved);
        Ok(verified)
    }

    async fn list_categories(&self, user_id: &UserId) -> ProfileResult<Vec<Category>> {
        let state = self.state.lock().await;
        let mut categories: Vec<Category> = state
            .categories
            .values()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_items(&self, user_id: &UserId) -> ProfileResult<Vec<Item>> {
        let state = self.state.lock().await;
        // Later inserts win ties on the timestamp
        let mut items: Vec<Item> = state
            .items
            .iter()
            .rev()
            .filter(|i| i.user_id == *user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn create_item(
        &self,
        owner: &UserId,
        draft: &ItemDraft,
        slugs: &[String],
    ) -> ProfileResult<Item> {
        let mut state = self.state.lock().await;

        let slug = slugs
            .iter()
            .find(|slug| {
                !state
                    .items
                    .iter()
                    .any(|i| i.user_id == *owner && &i.slug == *slug)
            })
            .cloned()
            .ok_or_else(|| ProfileError::validation("name", "Too many items already use this name"))?;

        let category = state.connect_or_create_category(owner, &draft.category_name);
        let now = Utc::now();
        let item = Item {
            item_id: ItemId::new(),
            user_id: *owner,
            category,
            name: draft.name.clone(),
            slug,
            description: draft.description.clone(),
            url: draft.url.clone(),
            image: draft.image.clone(),
            affiliate_links: draft.affiliate_links(),
            created_at: now,
            updated_at: now,
        };
        state.items.push(item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        owner: &UserId,
        item_id: &ItemId,
        draft: &ItemDraft,
    ) -> ProfileResult<Option<Item>> {
        let mut state = self.state.lock().await;

        let Some(index) = state
            .items
            .iter()
            .position(|item| item.item_id == *item_id && item.user_id == *owner)
        else {
            return Ok(None);
        };

        let category = state.connect_or_create_category(owner, &draft.category_name);
        let item = &mut state.items[index];

        item.category = category;
        item.name = draft.name.clone();
        item.description = draft.description.clone();
        item.url = draft.url.clone();
        item.image = draft.image.clone();
        item.affiliate_links = draft.affiliate_links();
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, owner: &UserId, item_id: &ItemId) -> ProfileResult<bool> {
        let mut state = self.state.lock().await;

        let before = state.items.len();
        state
            .items
            .retain(|item| !(item.item_id == *item_id && item.user_id == *owner));
        Ok(state.items.len() < before)
    }

    async fn delete_category(
        &self,
        owner: &UserId,
        category_id: &CategoryId,
    ) -> ProfileResult<CategoryDeletion> {
        let mut state = self.state.lock().await;

        if !state
            .categories
            .get(category_id)
            .is_some_and(|c| c.user_id == *owner)
        {
            return Ok(CategoryDeletion::NotFound);
        }
        if state
            .items
            .iter()
            .any(|i| i.category.category_id == *category_id)
        {
            return Ok(CategoryDeletion::InUse);
        }

        state.categories.remove(category_id);
        Ok(CategoryDeletion::Deleted)
    }
}
