//! Category Entity
//!
//! Groups items on a profile page. Names are unique per owner; a category
//! is created the first time an item names it.

use chrono::{DateTime, Utc};

use crate::domain::value_object::ids::{CategoryId, UserId};
use crate::domain::value_object::slug::slugify;
use crate::domain::value_object::text::required_text;
use crate::error::ProfileResult;

pub const CATEGORY_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub category_id: CategoryId,
    pub user_id: UserId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(user_id: UserId, name: String) -> Self {
        let slug = slugify(&name);
        Self {
            category_id: CategoryId::new(),
            user_id,
            name,
            slug,
            created_at: Utc::now(),
        }
    }

    pub fn validate_name(name: String) -> ProfileResult<String> {
        required_text("category", name, CATEGORY_NAME_MAX_LENGTH)
    }
}

/// Outcome of deleting a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryDeletion {
    Deleted,
    /// Missing, or owned by someone else
    NotFound,
    /// Still has items
    InUse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_follows_name() {
        let category = Category::new(UserId::new(), "Home Office".into());
        assert_eq!(category.slug, "home-office");
    }

    #[test]
    fn test_name_is_required() {
        assert!(Category::validate_name("   ".into()).is_err());
        assert_eq!(Category::validate_name(" Tech ".into()).unwrap(), "Tech");
    }
}
