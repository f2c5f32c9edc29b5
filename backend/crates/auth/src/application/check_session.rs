//! Check Session Use Case
//!
//! Summarises the signed-in user for the client.

use serde::Serialize;

use crate::application::session_manager::ValidatedSession;
use crate::domain::entity::user::User;

/// User summary returned by `GET /api/auth/check`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub profile_image_url: Option<String>,
    pub is_email_verified: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.to_string(),
            username: user.username.original().to_string(),
            email: user.email.as_str().to_string(),
            name: user.display_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            is_email_verified: user.email_verified,
        }
    }
}

/// Check session use case
///
/// Session resolution already happened once for the request; this only
/// shapes the answer.
pub struct CheckSessionUseCase;

impl CheckSessionUseCase {
    pub fn execute(session: Option<&ValidatedSession>) -> Option<UserSummary> {
        session.map(|validated| UserSummary::from(&validated.user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{email::Email, user_name::UserName};

    #[test]
    fn test_summary_json_shape() {
        let user = User::from_provider(
            Email::new("octo@example.com").unwrap(),
            UserName::new("OctoCat").unwrap(),
            Some("Octo".to_string()),
            Some("https://example.com/a.png".to_string()),
        );

        let json = serde_json::to_value(UserSummary::from(&user)).unwrap();
        assert_eq!(json["id"], user.user_id.to_string());
        assert_eq!(json["username"], "OctoCat");
        assert_eq!(json["email"], "octo@example.com");
        assert_eq!(json["name"], "Octo");
        assert_eq!(json["profileImageUrl"], "https://example.com/a.png");
        assert_eq!(json["isEmailVerified"], true);
    }

    #[test]
    fn test_no_session() {
        assert!(CheckSessionUseCase::execute(None).is_none());
    }
}
