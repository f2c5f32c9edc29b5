//! Application Layer
//!
//! Use cases for the profile editor and the public profile page.

pub mod add_item;
pub mod delete_category;
pub mod delete_item;
pub mod get_profile;
pub mod public_profile;
pub mod update_item;
pub mod update_profile;

// Re-exports
pub use add_item::AddItemUseCase;
pub use delete_category::DeleteCategoryUseCase;
pub use delete_item::DeleteItemUseCase;
pub use get_profile::GetProfileUseCase;
pub use public_profile::{PublicProfile, PublicProfileUseCase};
pub use update_item::UpdateItemUseCase;
pub use update_profile::{UpdateProfileOutput, UpdateProfileUseCase};
