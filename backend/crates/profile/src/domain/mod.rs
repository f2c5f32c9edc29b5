//! Domain Layer
//!
//! Entities, value objects and the repository trait for profile content.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    category::{Category, CategoryDeletion},
    item::{AffiliateLink, Item, ItemDraft, ItemInput},
    profile::{Profile, ProfileChanges, ProfileChangesInput, SocialLink, SocialLinkInput},
};
pub use repository::ProfileRepository;
