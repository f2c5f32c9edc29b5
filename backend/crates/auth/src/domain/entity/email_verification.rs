//! Email Verification Record
//!
//! One pending record per user. Re-issuing overwrites the code, which
//! invalidates every link emailed before it.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::user_id::UserId;

/// Random bytes in a verification code (hex encoded)
pub const VERIFICATION_CODE_BYTES: usize = 6;

#[derive(Debug, Clone)]
pub struct EmailVerification {
    pub user_id: UserId,
    pub code: String,
    pub sent_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            code: platform::crypto::random_hex(VERIFICATION_CODE_BYTES),
            sent_at: Utc::now(),
        }
    }

    /// Whole seconds left before another email may be sent, rounded up
    pub fn cooldown_remaining(&self, cooldown: Duration, now: DateTime<Utc>) -> Option<u64> {
        let remaining = self.sent_at + cooldown - now;
        if remaining <= Duration::zero() {
            return None;
        }

        let millis = u64::try_from(remaining.num_milliseconds()).unwrap_or(0);
        Some(millis.div_ceil(1000).max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let record = EmailVerification::new(UserId::new());
        assert_eq!(record.code.len(), VERIFICATION_CODE_BYTES * 2);
        assert!(record.code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cooldown_rounds_up() {
        let record = EmailVerification::new(UserId::new());
        let now = record.sent_at + Duration::milliseconds(500);
        assert_eq!(record.cooldown_remaining(Duration::seconds(60), now), Some(60));

        let now = record.sent_at + Duration::seconds(59);
        assert_eq!(record.cooldown_remaining(Duration::seconds(60), now), Some(1));
    }

    #[test]
    fn test_cooldown_elapsed() {
        let record = EmailVerification::new(UserId::new());
        let now = record.sent_at + Duration::seconds(60);
        assert_eq!(record.cooldown_remaining(Duration::seconds(60), now), None);
    }
}
