//! Password Reset Record

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::user_id::UserId;

/// Random bytes in a reset token (hex encoded)
pub const RESET_TOKEN_BYTES: usize = 10;

#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        Self {
            user_id,
            token: platform::crypto::random_hex(RESET_TOKEN_BYTES),
            expires_at: Utc::now() + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reset() {
        let reset = PasswordReset::new(UserId::new(), Duration::hours(1));
        assert_eq!(reset.token.len(), RESET_TOKEN_BYTES * 2);
        assert!(!reset.is_expired_at(Utc::now()));
        assert!(reset.is_expired_at(Utc::now() + Duration::hours(2)));
    }
}
