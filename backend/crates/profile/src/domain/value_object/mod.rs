//! Value Object Module

pub mod ids;
pub mod slug;
pub mod text;
pub mod web_url;
