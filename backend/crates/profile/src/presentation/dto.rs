//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::{PublicProfile, UpdateProfileOutput};
use crate::domain::entity::{
    category::Category,
    item::{AffiliateLink, Item, ItemInput},
    profile::{Profile, ProfileChangesInput, SocialLink, SocialLinkInput},
};
use crate::domain::value_object::ids::{AffiliateLinkId, CategoryId, ItemId, SocialLinkId, UserId};
use crate::domain::value_object::web_url::WebUrl;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SocialLinkRequest {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub social_links: Vec<SocialLinkRequest>,
}

impl From<UpdateProfileRequest> for ProfileChangesInput {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            name: req.name,
            username: req.username,
            email: req.email,
            bio: req.bio,
            profile_image_url: req.profile_image_url,
            social_links: req
                .social_links
                .into_iter()
                .map(|link| SocialLinkInput {
                    platform: link.platform,
                    url: link.url,
                })
                .collect(),
        }
    }
}

/// Body of item create and update
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub affiliate_links: Vec<String>,
}

impl From<ItemRequest> for ItemInput {
    fn from(req: ItemRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            url: req.url,
            image: req.image,
            category: req.category,
            affiliate_links: req.affiliate_links,
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SocialLinkResponse {
    pub id: SocialLinkId,
    pub platform: String,
    pub url: WebUrl,
}

impl From<SocialLink> for SocialLinkResponse {
    fn from(link: SocialLink) -> Self {
        Self {
            id: link.social_link_id,
            platform: link.platform,
            url: link.url,
        }
    }
}

/// The owner's own view, including the email address
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: UserId,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub email_verified: bool,
    pub bio: Option<String>,
    pub profile_image_url: Option<WebUrl>,
    pub social_links: Vec<SocialLinkResponse>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.user_id,
            name: profile.name,
            username: profile.username.original().to_string(),
            email: profile.email.as_str().to_string(),
            email_verified: profile.email_verified,
            bio: profile.bio,
            profile_image_url: profile.profile_image_url,
            social_links: profile.social_links.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileResponse {
    pub user: ProfileResponse,
    pub old_username: String,
}

impl From<UpdateProfileOutput> for UpdateProfileResponse {
    fn from(output: UpdateProfileOutput) -> Self {
        Self {
            user: output.profile.into(),
            old_username: output.old_username.original().to_string(),
        }
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.category_id,
            name: category.name,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AffiliateLinkResponse {
    pub id: AffiliateLinkId,
    pub url: WebUrl,
}

impl From<AffiliateLink> for AffiliateLinkResponse {
    fn from(link: AffiliateLink) -> Self {
        Self {
            id: link.affiliate_link_id,
            url: link.url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub url: Option<WebUrl>,
    pub image: Option<WebUrl>,
    pub category: CategoryResponse,
    pub affiliate_links: Vec<AffiliateLinkResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.item_id,
            name: item.name,
            slug: item.slug,
            description: item.description,
            url: item.url,
            image: item.image,
            category: item.category.into(),
            affiliate_links: item.affiliate_links.into_iter().map(Into::into).collect(),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

// ============================================================================
// Public profile
// ============================================================================

/// What anyone may see; no email or verification state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUserResponse {
    pub id: UserId,
    pub name: Option<String>,
    pub username: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<WebUrl>,
    pub social_links: Vec<SocialLinkResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileResponse {
    pub user: PublicUserResponse,
    pub categories: Vec<CategoryResponse>,
    pub items: Vec<ItemResponse>,
    pub is_own_profile: bool,
}

impl From<PublicProfile> for PublicProfileResponse {
    fn from(page: PublicProfile) -> Self {
        let profile = page.profile;
        Self {
            user: PublicUserResponse {
                id: profile.user_id,
                name: profile.name,
                username: profile.username.original().to_string(),
                bio: profile.bio,
                profile_image_url: profile.profile_image_url,
                social_links: profile.social_links.into_iter().map(Into::into).collect(),
            },
            categories: page.categories.into_iter().map(Into::into).collect(),
            items: page.items.into_iter().map(Into::into).collect(),
            is_own_profile: page.is_own_profile,
        }
    }
}
