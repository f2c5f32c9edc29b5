//! User Entity
//!
//! Identity record shared by password and OAuth sign-in. Profile fields
//! (`bio`, avatar) are owned by the profile pages; auth only seeds them.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    email::Email, user_id::UserId, user_name::UserName, user_password::UserPassword,
};

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Unique, case-insensitive
    pub email: Email,
    /// Unique on its canonical form
    pub username: UserName,
    pub display_name: Option<String>,
    /// `None` for accounts created through an OAuth provider
    pub password_hash: Option<UserPassword>,
    pub email_verified: bool,
    pub profile_image_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create an unverified account with a password (sign-up)
    pub fn new(email: Email, username: UserName, password_hash: UserPassword) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            username,
            display_name: None,
            password_hash: Some(password_hash),
            email_verified: false,
            profile_image_url: None,
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a pre-verified account vouched for by an OAuth provider
    pub fn from_provider(
        email: Email,
        username: UserName,
        display_name: Option<String>,
        profile_image_url: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            username,
            display_name,
            password_hash: None,
            email_verified: true,
            profile_image_url,
            bio: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply what a provider reported on a returning sign-in
    ///
    /// Only fields the provider actually supplied are overwritten.
    pub fn refresh_from_provider(
        &mut self,
        display_name: Option<&str>,
        profile_image_url: Option<&str>,
    ) {
        if let Some(name) = display_name {
            self.display_name = Some(name.to_string());
        }
        if let Some(url) = profile_image_url {
            self.profile_image_url = Some(url.to_string());
        }
        self.updated_at = Utc::now();
    }

    /// Take over an unverified account for the provider that vouched for its email
    ///
    /// Whoever registered the address without confirming it loses the
    /// password they chose. Returns false when the account was already
    /// verified and nothing changed.
    pub fn claim_for_provider(&mut self) -> bool {
        if self.email_verified {
            return false;
        }
        self.password_hash = None;
        self.email_verified = true;
        self.updated_at = Utc::now();
        true
    }

    pub fn mark_email_verified(&mut self) {
        self.email_verified = true;
        self.updated_at = Utc::now();
    }

    pub fn set_password(&mut self, password_hash: UserPassword) {
        self.password_hash = Some(password_hash);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn provider_user() -> User {
        User::from_provider(
            Email::new("octo@example.com").unwrap(),
            UserName::new("octocat").unwrap(),
            Some("Octo Cat".to_string()),
            None,
        )
    }

    fn password_user() -> User {
        let raw = RawPassword::new("correct horse battery staple".to_string(), "password").unwrap();
        User::new(
            Email::new("jane@example.com").unwrap(),
            UserName::new("jane").unwrap(),
            UserPassword::from_raw(&raw).unwrap(),
        )
    }

    #[test]
    fn test_provider_user_is_verified_without_password() {
        let user = provider_user();
        assert!(user.email_verified);
        assert!(user.password_hash.is_none());
    }

    #[test]
    fn test_refresh_keeps_missing_fields() {
        let mut user = provider_user();
        user.refresh_from_provider(None, Some("https://example.com/a.png"));

        assert_eq!(user.display_name.as_deref(), Some("Octo Cat"));
        assert_eq!(
            user.profile_image_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn test_refresh_leaves_verification_alone() {
        let mut user = password_user();
        user.refresh_from_provider(Some("Jane"), None);
        assert!(!user.email_verified);
        assert!(user.password_hash.is_some());
    }

    #[test]
    fn test_claim_drops_unverified_password() {
        let mut user = password_user();
        assert!(user.claim_for_provider());
        assert!(user.email_verified);
        assert!(user.password_hash.is_none());

        assert!(!user.claim_for_provider());
    }
}
