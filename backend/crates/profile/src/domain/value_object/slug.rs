//! Slugs
//!
//! Item and category slugs are derived from their names: lowercase ASCII
//! letters and digits, runs of anything else collapsed to one `-`, no
//! leading or trailing `-`. Item slugs are unique per owner; a taken slug
//! gets a numbered suffix.

/// Slug used when a name has no ASCII letters or digits
const FALLBACK_SLUG: &str = "item";

/// Numbered suffixes tried after the bare slug
pub const MAX_SLUG_SUFFIX: u32 = 100;

/// Derive a slug from a display name; may be empty
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Item slugs to try in order: `base`, then `base-1` through `base-100`
pub fn item_slug_candidates(name: &str) -> Vec<String> {
    let base = match slugify(name) {
        slug if slug.is_empty() => FALLBACK_SLUG.to_string(),
        slug => slug,
    };

    std::iter::once(base.clone())
        .chain((1..=MAX_SLUG_SUFFIX).map(|n| format!("{base}-{n}")))
        .collect()
}
