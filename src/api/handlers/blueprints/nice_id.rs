//! Nice id normalization for sites.
//!
//! Nice ids are lowercase `a-z0-9-` with collapsed separators.

pub(super) const NICE_ID_MIN: usize = 2;
pub(super) const NICE_ID_MAX: usize = 64;

/// Normalize user input into a nice id within `min..=max` characters.
/// Returns `None` when nothing usable remains.
pub(super) fn normalize_nice_id(input: &str, min: usize, max: usize) -> Option<String> {
    let mut nice_id = String::new();
    let mut prev_dash = false;
    for ch in input.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            nice_id.push(ch);
            prev_dash = false;
        } else if !prev_dash {
            nice_id.push('-');
            prev_dash = true;
        }
    }
    let truncated: String = nice_id.trim_matches('-').chars().take(max).collect();
    let normalized = truncated.trim_matches('-');
    if normalized.len() < min {
        return None;
    }
    Some(normalized.to_string())
}
