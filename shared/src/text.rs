//! Text helpers for post content: slugs and reading time

use chrono::Utc;
use uuid::Uuid;

/// Average reading speed used for read-time estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Fallback slug base when a title has no word characters at all
const EMPTY_SLUG_BASE: &str = "post";

/// Estimated reading time in whole minutes, never below one.
pub fn calculate_read_time(content: &str) -> i32 {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// Normalize a title into the readable part of a slug.
///
/// Lowercases and trims, collapses every run of non-word characters into a
/// single hyphen, and strips hyphens from both ends.
pub fn slug_base(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.trim().to_lowercase().chars() {
        if c.is_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Generate a slug that is unique by construction.
///
/// The readable base is followed by a base-36 millisecond timestamp and a
/// random token, so two calls with the same title never collide.
pub fn generate_slug(title: &str) -> String {
    let base = slug_base(title);
    let base = if base.is_empty() { EMPTY_SLUG_BASE.to_string() } else { base };

    let timestamp = to_base36(Utc::now().timestamp_millis().unsigned_abs());
    let random = Uuid::new_v4().simple().to_string();

    format!("{}-{}{}", base, timestamp, &random[..8])
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
