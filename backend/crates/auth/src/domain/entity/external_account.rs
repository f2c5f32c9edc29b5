//! External Account Entity
//!
//! Link between a local user and a provider identity, at most one per
//! (user, provider).

use chrono::{DateTime, Utc};

use crate::domain::value_object::{oauth_provider::OAuthProviderKind, user_id::UserId};

#[derive(Debug, Clone)]
pub struct ExternalAccount {
    pub user_id: UserId,
    pub provider: OAuthProviderKind,
    pub provider_account_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
