//! Item Entity
//!
//! A recommended product on a profile page, filed under one category, with
//! optional affiliate links.

use chrono::{DateTime, Utc};

use crate::domain::entity::category::Category;
use crate::domain::value_object::ids::{AffiliateLinkId, ItemId, UserId};
use crate::domain::value_object::text::{optional_text, required_text};
use crate::domain::value_object::web_url::WebUrl;
use crate::error::{ProfileError, ProfileResult};

pub const ITEM_NAME_MAX_LENGTH: usize = 100;
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;
pub const MAX_AFFILIATE_LINKS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliateLink {
    pub affiliate_link_id: AffiliateLinkId,
    pub url: WebUrl,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub item_id: ItemId,
    pub user_id: UserId,
    pub category: Category,
    pub name: String,
    /// Unique per owner; fixed when the item is created
    pub slug: String,
    pub description: Option<String>,
    pub url: Option<WebUrl>,
    pub image: Option<WebUrl>,
    /// In display order
    pub affiliate_links: Vec<AffiliateLink>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Item fields as submitted by the editor
#[derive(Debug, Clone, Default)]
pub struct ItemInput {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub category: String,
    pub affiliate_links: Vec<String>,
}

/// Validated item fields, shared by create and update
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<WebUrl>,
    pub image: Option<WebUrl>,
    pub category_name: String,
    pub affiliate_links: Vec<WebUrl>,
}

impl ItemDraft {
    pub fn new(input: ItemInput) -> ProfileResult<Self> {
        let name = required_text("name", input.name, ITEM_NAME_MAX_LENGTH)?;
        let description = optional_text("description", input.description, DESCRIPTION_MAX_LENGTH)?;
        let url = WebUrl::parse_optional("url", input.url.as_deref())?;
        let image = WebUrl::parse_optional("image", input.image.as_deref())?;
        let category_name = Category::validate_name(input.category)?;

        let affiliate_links = input
            .affiliate_links
            .iter()
            .filter(|link| !link.trim().is_empty())
            .map(|link| WebUrl::parse("affiliateLinks", link))
            .collect::<ProfileResult<Vec<_>>>()?;

        if affiliate_links.len() > MAX_AFFILIATE_LINKS {
            return Err(ProfileError::validation(
                "affiliateLinks",
                format!("At most {MAX_AFFILIATE_LINKS} affiliate links"),
            ));
        }

        Ok(Self {
            name,
            description,
            url,
            image,
            category_name,
            affiliate_links,
        })
    }

    pub fn affiliate_links(&self) -> Vec<AffiliateLink> {
        self.affiliate_links
            .iter()
            .map(|url| AffiliateLink {
                affiliate_link_id: AffiliateLinkId::new(),
                url: url.clone(),
            })
            .collect()
    }
}
