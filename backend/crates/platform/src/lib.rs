//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations, free of auth domain vocabulary:
//! - Password hashing (Argon2id with pinned parameters)
//! - Random material and constant-time comparison
//! - Cookie policy

pub mod cookie;
pub mod crypto;
pub mod password;
