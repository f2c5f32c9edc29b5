//! Value Object Module

pub mod email;
pub mod oauth_provider;
pub mod session_token;
pub mod user_name;
pub mod user_password;

pub mod user_id {
    pub use kernel::id::UserId;
}
