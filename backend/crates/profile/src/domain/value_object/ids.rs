//! Typed ids for profile records

use kernel::id::Id;

pub use kernel::id::UserId;

pub struct CategoryMarker;
pub type CategoryId = Id<CategoryMarker>;

pub struct ItemMarker;
pub type ItemId = Id<ItemMarker>;

pub struct SocialLinkMarker;
pub type SocialLinkId = Id<SocialLinkMarker>;

pub struct AffiliateLinkMarker;
pub type AffiliateLinkId = Id<AffiliateLinkMarker>;
