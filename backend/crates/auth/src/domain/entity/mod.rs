//! Domain Entities

pub mod email_verification;
pub mod external_account;
pub mod password_reset;
pub mod session;
pub mod user;
