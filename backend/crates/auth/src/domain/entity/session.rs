//! Session Entity
//!
//! Server-side half of an authenticated session. The cookie only proves
//! knowledge of `session_id` and an expiry signed by the server.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::value_object::user_id::UserId;

#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// TTL is provided by the application layer (config), not hard-coded here.
    pub fn new(user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Less than half of `ttl` remains
    pub fn needs_rotation(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.expires_at - now < ttl / 2
    }

    /// Push expiry out to `now + ttl`
    pub fn extend(&mut self, ttl: Duration, now: DateTime<Utc>) {
        self.expires_at = now + ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_does_not_rotate() {
        let ttl = Duration::days(30);
        let session = Session::new(UserId::new(), ttl);
        let now = Utc::now();

        assert!(!session.is_expired_at(now));
        assert!(!session.needs_rotation(ttl, now));
    }

    #[test]
    fn test_rotation_after_half_life() {
        let ttl = Duration::days(30);
        let mut session = Session::new(UserId::new(), ttl);
        let later = Utc::now() + Duration::days(16);

        assert!(session.needs_rotation(ttl, later));
        session.extend(ttl, later);
        assert_eq!(session.expires_at, later + ttl);
        assert!(!session.needs_rotation(ttl, later));
    }

    #[test]
    fn test_expired() {
        let session = Session::new(UserId::new(), Duration::seconds(-1));
        assert!(session.is_expired_at(Utc::now()));
    }
}
