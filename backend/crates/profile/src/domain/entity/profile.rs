//! Profile Entity
//!
//! The editable half of an account plus its social links. Identity fields
//! (email, username) live on the same `users` row auth reads; password and
//! verification state are never written from here except that a new email
//! starts out unverified.

use auth::domain::value_object::{email::Email, user_name::UserName};
use chrono::{DateTime, Utc};

use crate::domain::value_object::ids::{SocialLinkId, UserId};
use crate::domain::value_object::text::{optional_text, required_text};
use crate::domain::value_object::web_url::WebUrl;
use crate::error::{ProfileError, ProfileResult};

pub const NAME_MAX_LENGTH: usize = 100;
pub const BIO_MAX_LENGTH: usize = 500;
pub const PLATFORM_MAX_LENGTH: usize = 40;
pub const MAX_SOCIAL_LINKS: usize = 20;

/// Platforms offered by the profile editor; anything else is shown as-is
pub const KNOWN_PLATFORMS: [&str; 11] = [
    "twitter", "instagram", "github", "website", "linkedin", "youtube", "pinterest", "bluesky",
    "facebook", "tiktok", "medium",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialLink {
    pub social_link_id: SocialLinkId,
    pub platform: String,
    pub url: WebUrl,
}

impl SocialLink {
    pub fn new(platform: String, url: &str) -> ProfileResult<Self> {
        let platform = required_text("socialLinks", platform, PLATFORM_MAX_LENGTH)?;
        // Known platforms are stored in their canonical lowercase spelling
        let platform = KNOWN_PLATFORMS
            .iter()
            .find(|known| known.eq_ignore_ascii_case(&platform))
            .map_or(platform, |known| known.to_string());

        Ok(Self {
            social_link_id: SocialLinkId::new(),
            platform,
            url: WebUrl::parse("socialLinks", url)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub user_id: UserId,
    pub name: Option<String>,
    pub username: UserName,
    pub email: Email,
    pub email_verified: bool,
    pub bio: Option<String>,
    pub profile_image_url: Option<WebUrl>,
    /// In display order
    pub social_links: Vec<SocialLink>,
    pub updated_at: DateTime<Utc>,
}

/// Validated replacement for every editable field
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub username: UserName,
    pub email: Email,
    pub bio: Option<String>,
    pub profile_image_url: Option<WebUrl>,
    pub social_links: Vec<SocialLink>,
}

/// Raw social link as submitted
#[derive(Debug, Clone, Default)]
pub struct SocialLinkInput {
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChangesInput {
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub profile_image_url: Option<String>,
    pub social_links: Vec<SocialLinkInput>,
}

impl ProfileChanges {
    pub fn new(input: ProfileChangesInput) -> ProfileResult<Self> {
        let username = UserName::new(&input.username)?;
        let email = Email::new(input.email)?;
        let name = optional_text("name", input.name, NAME_MAX_LENGTH)?;
        let bio = optional_text("bio", input.bio, BIO_MAX_LENGTH)?;
        let profile_image_url =
            WebUrl::parse_optional("profileImageUrl", input.profile_image_url.as_deref())?;

        // Rows the editor left completely empty are dropped
        let social_links = input
            .social_links
            .into_iter()
            .filter(|link| !(link.platform.trim().is_empty() && link.url.trim().is_empty()))
            .map(|link| SocialLink::new(link.platform, &link.url))
            .collect::<ProfileResult<Vec<_>>>()?;

        if social_links.len() > MAX_SOCIAL_LINKS {
            return Err(ProfileError::validation(
                "socialLinks",
                format!("At most {MAX_SOCIAL_LINKS} social links"),
            ));
        }

        Ok(Self {
            name,
            username,
            email,
            bio,
            profile_image_url,
            social_links,
        })
    }
}

impl Profile {
    /// Replace every editable field
    ///
    /// A different email address has not been proven yet, so it starts out
    /// unverified.
    pub fn apply(&mut self, changes: ProfileChanges) {
        if changes.email != self.email {
            self.email_verified = false;
        }

        self.name = changes.name;
        self.username = changes.username;
        self.email = changes.email;
        self.bio = changes.bio;
        self.profile_image_url = changes.profile_image_url;
        self.social_links = changes.social_links;
        self.updated_at = Utc::now();
    }
}
