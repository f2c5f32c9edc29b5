//! Entity Module

pub mod category;
pub mod item;
pub mod profile;
