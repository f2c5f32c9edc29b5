//! Free-text fields

use crate::error::{ProfileError, ProfileResult};

/// Trim `value`; blank becomes `None`
pub fn optional_text(
    field: &'static str,
    value: Option<String>,
    max_chars: usize,
) -> ProfileResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > max_chars {
        return Err(ProfileError::validation(
            field,
            format!("Must be at most {max_chars} characters"),
        ));
    }
    Ok(Some(value.to_string()))
}

/// Trimmed and non-blank
pub fn required_text(field: &'static str, value: String, max_chars: usize) -> ProfileResult<String> {
    optional_text(field, Some(value), max_chars)?
        .ok_or_else(|| ProfileError::validation(field, "Required"))
}
