//! PostgreSQL Profile Repository
//!
//! Profiles are rows of the `users` table shared with auth; social links,
//! categories, items and affiliate links are in `0002_profile.sql`.

use std::collections::HashMap;

use auth::domain::value_object::{email::Email, user_name::UserName};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::entity::{
    category::{Category, CategoryDeletion},
    item::{AffiliateLink, Item, ItemDraft},
    profile::{Profile, SocialLink},
};
use crate::domain::repository::ProfileRepository;
use crate::domain::value_object::ids::{
    AffiliateLinkId, CategoryId, ItemId, SocialLinkId, UserId,
};
use crate::domain::value_object::web_url::WebUrl;
use crate::error::{ProfileError, ProfileResult};

// Unique indexes created by the auth migration
const EMAIL_UNIQUE_INDEX: &str = "users_email_lower_key";
const USERNAME_UNIQUE_INDEX: &str = "users_username_canonical_key";

#[derive(Clone)]
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_user_conflict(err: sqlx::Error) -> ProfileError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(EMAIL_UNIQUE_INDEX) => return ProfileError::EmailTaken,
            Some(USERNAME_UNIQUE_INDEX) => return ProfileError::UsernameTaken,
            _ => {}
        }
    }
    ProfileError::Database(err)
}

const PROFILE_COLUMNS: &str = r#"
    user_id,
    display_name,
    username,
    email,
    email_verified,
    bio,
    profile_image_url,
    updated_at
"#;

async fn load_social_links<'e, E>(executor: E, user_id: &UserId) -> ProfileResult<Vec<SocialLink>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query_as::<_, SocialLinkRow>(
        r#"
        SELECT social_link_id, platform, url
        FROM social_links
        WHERE user_id = $1
        ORDER BY position
        "#,
    )
    .bind(user_id.as_uuid())
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(SocialLinkRow::into_social_link).collect())
}

/// Reuse the owner's category of that name or create it
async fn connect_or_create_category(
    conn: &mut PgConnection,
    owner: &UserId,
    name: &str,
) -> ProfileResult<Category> {
    let candidate = Category::new(*owner, name.to_string());

    // The no-op update makes RETURNING yield the existing row on conflict
    let row = sqlx::query_as::<_, CategoryRow>(
        r#"
        INSERT INTO categories (category_id, user_id, name, slug, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name
        RETURNING category_id, user_id, name, slug, created_at
        "#,
    )
    .bind(candidate.category_id.as_uuid())
    .bind(owner.as_uuid())
    .bind(&candidate.name)
    .bind(&candidate.slug)
    .bind(candidate.created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into_category())
}

async fn insert_affiliate_links(
    conn: &mut PgConnection,
    item_id: &ItemId,
    links: &[AffiliateLink],
) -> ProfileResult<()> {
    for (position, link) in links.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO affiliate_links (affiliate_link_id, item_id, url, position)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(link.affiliate_link_id.as_uuid())
        .bind(item_id.as_uuid())
        .bind(link.url.as_str())
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

impl ProfileRepository for PgProfileRepository {
    async fn find_profile(&self, user_id: &UserId) -> ProfileResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let links = load_social_links(&self.pool, user_id).await?;
        Ok(Some(row.into_profile(links)))
    }

    async fn find_profile_by_username(
        &self,
        username: &UserName,
    ) -> ProfileResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM users WHERE username_canonical = $1"
        ))
        .bind(username.canonical())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let links = load_social_links(&self.pool, &UserId::from_uuid(row.user_id)).await?;
        Ok(Some(row.into_profile(links)))
    }

    async fn save_profile(&self, profile: &Profile) -> ProfileResult<bool> {
        let mut tx = self.pool.begin().await?;

        // Verification survives only while the address is unchanged, even
        // against a verification that landed after the profile was read
        let verified = sqlx::query_scalar::<_, bool>(
            r#"
            UPDATE users
            SET display_name = $2,
                username = $3,
                username_canonical = $4,
                email_verified = email_verified AND lower(email) = lower($5),
                email = $5,
                bio = $6,
                profile_image_url = $7,
                updated_at = $8
            WHERE user_id = $1
            RETURNING email_verified
            "#,
        )
        .bind(profile.user_id.as_uuid())
        .bind(&profile.name)
        .bind(profile.username.original())
        .bind(profile.username.canonical())
        .bind(profile.email.as_str())
        .bind(profile.bio.as_deref())
        .bind(profile.profile_image_url.as_ref().map(WebUrl::as_str))
        .bind(profile.updated_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_user_conflict)?;

        let Some(verified) = verified else {
            return Err(ProfileError::UserNotFound);
        };

        sqlx::query("DELETE FROM social_links WHERE user_id = $1")
            .bind(profile.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for (position, link) in profile.social_links.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO social_links (social_link_id, user_id, platform, url, position)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(link.social_link_id.as_uuid())
            .bind(profile.user_id.as_uuid())
            .bind(&link.platform)
            .bind(link.url.as_str())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(verified)
    }

    async fn list_categories(&self, user_id: &UserId) -> ProfileResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT category_id, user_id, name, slug, created_at
            FROM categories
            WHERE user_id = $1
            ORDER BY name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CategoryRow::into_category).collect())
    }

    async fn list_items(&self, user_id: &UserId) -> ProfileResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT
                i.item_id,
                i.user_id,
                i.name,
                i.slug,
                i.description,
                i.url,
                i.image,
                i.created_at,
                i.updated_at,
                c.category_id,
                c.name AS category_name,
                c.slug AS category_slug,
                c.created_at AS category_created_at
            FROM items i
            JOIN categories c ON c.category_id = i.category_id
            WHERE i.user_id = $1
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let item_ids: Vec<Uuid> = rows.iter().map(|row| row.item_id).collect();
        let links = sqlx::query_as::<_, AffiliateLinkRow>(
            r#"
            SELECT affiliate_link_id, item_id, url
            FROM affiliate_links
            WHERE item_id = ANY($1)
            ORDER BY position
            "#,
        )
        .bind(&item_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut links_by_item: HashMap<Uuid, Vec<AffiliateLink>> = HashMap::new();
        for link in links {
            links_by_item
                .entry(link.item_id)
                .or_default()
                .push(link.into_affiliate_link());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let links = links_by_item.remove(&row.item_id).unwrap_or_default();
                row.into_item(links)
            })
            .collect())
    }

    async fn create_item(
        &self,
        owner: &UserId,
        draft: &ItemDraft,
        slugs: &[String],
    ) -> ProfileResult<Item> {
        let mut tx = self.pool.begin().await?;

        let category = connect_or_create_category(&mut *tx, owner, &draft.category_name).await?;
        let item_id = ItemId::new();
        let now = Utc::now();

        let mut slug = None;
        for candidate in slugs {
            let inserted = sqlx::query(
                r#"
                INSERT INTO items (
                    item_id, user_id, category_id, name, slug,
                    description, url, image, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
                ON CONFLICT (user_id, slug) DO NOTHING
                "#,
            )
            .bind(item_id.as_uuid())
            .bind(owner.as_uuid())
            .bind(category.category_id.as_uuid())
            .bind(&draft.name)
            .bind(candidate)
            .bind(draft.description.as_deref())
            .bind(draft.url.as_ref().map(WebUrl::as_str))
            .bind(draft.image.as_ref().map(WebUrl::as_str))
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if inserted > 0 {
                slug = Some(candidate.clone());
                break;
            }
        }

        let Some(slug) = slug else {
            return Err(ProfileError::validation(
                "name",
                "Too many items already use this name",
            ));
        };

        let affiliate_links = draft.affiliate_links();
        insert_affiliate_links(&mut *tx, &item_id, &affiliate_links).await?;

        tx.commit().await?;

        Ok(Item {
            item_id,
            user_id: *owner,
            category,
            name: draft.name.clone(),
            slug,
            description: draft.description.clone(),
            url: draft.url.clone(),
            image: draft.image.clone(),
            affiliate_links,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_item(
        &self,
        owner: &UserId,
        item_id: &ItemId,
        draft: &ItemDraft,
    ) -> ProfileResult<Option<Item>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, (String, DateTime<Utc>)>(
            r#"
            SELECT slug, created_at
            FROM items
            WHERE item_id = $1 AND user_id = $2
            FOR UPDATE
            "#,
        )
        .bind(item_id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((slug, created_at)) = existing else {
            return Ok(None);
        };

        let category = connect_or_create_category(&mut *tx, owner, &draft.category_name).await?;
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE items
            SET category_id = $2,
                name = $3,
                description = $4,
                url = $5,
                image = $6,
                updated_at = $7
            WHERE item_id = $1
            "#,
        )
        .bind(item_id.as_uuid())
        .bind(category.category_id.as_uuid())
        .bind(&draft.name)
        .bind(draft.description.as_deref())
        .bind(draft.url.as_ref().map(WebUrl::as_str))
        .bind(draft.image.as_ref().map(WebUrl::as_str))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM affiliate_links WHERE item_id = $1")
            .bind(item_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let affiliate_links = draft.affiliate_links();
        insert_affiliate_links(&mut *tx, item_id, &affiliate_links).await?;

        tx.commit().await?;

        Ok(Some(Item {
            item_id: *item_id,
            user_id: *owner,
            category,
            name: draft.name.clone(),
            slug,
            description: draft.description.clone(),
            url: draft.url.clone(),
            image: draft.image.clone(),
            affiliate_links,
            created_at,
            updated_at: now,
        }))
    }

    async fn delete_item(&self, owner: &UserId, item_id: &ItemId) -> ProfileResult<bool> {
        // Affiliate links go with the item (ON DELETE CASCADE)
        let deleted = sqlx::query("DELETE FROM items WHERE item_id = $1 AND user_id = $2")
            .bind(item_id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn delete_category(
        &self,
        owner: &UserId,
        category_id: &CategoryId,
    ) -> ProfileResult<CategoryDeletion> {
        let mut tx = self.pool.begin().await?;

        let owned = sqlx::query_scalar::<_, Uuid>(
            "SELECT category_id FROM categories WHERE category_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(category_id.as_uuid())
        .bind(owner.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            return Ok(CategoryDeletion::NotFound);
        }

        let in_use = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM items WHERE category_id = $1)",
        )
        .bind(category_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        if in_use {
            return Ok(CategoryDeletion::InUse);
        }

        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(category_id.as_uuid())
            .execute(&mut *tx)
            .await;

        match result {
            Ok(_) => {}
            // An item was filed under it since the check
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                return Ok(CategoryDeletion::InUse);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(CategoryDeletion::Deleted)
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct ProfileRow {
    user_id: Uuid,
    display_name: Option<String>,
    username: String,
    email: String,
    email_verified: bool,
    bio: Option<String>,
    profile_image_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_profile(self, social_links: Vec<SocialLink>) -> Profile {
        Profile {
            user_id: UserId::from_uuid(self.user_id),
            name: self.display_name,
            username: UserName::from_db(self.username),
            email: Email::from_db(self.email),
            email_verified: self.email_verified,
            bio: self.bio,
            profile_image_url: self.profile_image_url.map(WebUrl::from_db),
            social_links,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SocialLinkRow {
    social_link_id: Uuid,
    platform: String,
    url: String,
}

impl SocialLinkRow {
    fn into_social_link(self) -> SocialLink {
        SocialLink {
            social_link_id: SocialLinkId::from_uuid(self.social_link_id),
            platform: self.platform,
            url: WebUrl::from_db(self.url),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    category_id: Uuid,
    user_id: Uuid,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            category_id: CategoryId::from_uuid(self.category_id),
            user_id: UserId::from_uuid(self.user_id),
            name: self.name,
            slug: self.slug,
            created_at: self.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    item_id: Uuid,
    user_id: Uuid,
    name: String,
    slug: String,
    description: Option<String>,
    url: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_id: Uuid,
    category_name: String,
    category_slug: String,
    category_created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, affiliate_links: Vec<AffiliateLink>) -> Item {
        let user_id = UserId::from_uuid(self.user_id);
        Item {
            item_id: ItemId::from_uuid(self.item_id),
            user_id,
            category: Category {
                category_id: CategoryId::from_uuid(self.category_id),
                user_id,
                name: self.category_name,
                slug: self.category_slug,
                created_at: self.category_created_at,
            },
            name: self.name,
            slug: self.slug,
            description: self.description,
            url: self.url.map(WebUrl::from_db),
            image: self.image.map(WebUrl::from_db),
            affiliate_links,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AffiliateLinkRow {
    affiliate_link_id: Uuid,
    item_id: Uuid,
    url: String,
}

impl AffiliateLinkRow {
    fn into_affiliate_link(self) -> AffiliateLink {
        AffiliateLink {
            affiliate_link_id: AffiliateLinkId::from_uuid(self.affiliate_link_id),
            url: WebUrl::from_db(self.url),
        }
    }
}
