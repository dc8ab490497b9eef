/// Link list operations: validation, add, remove, reorder
///
/// Every operation takes the current list by reference and returns a new
/// list; the caller decides when to persist it.

use crate::error::SidebarError;
use url::Url;

/// Validate a candidate link and return the trimmed string that gets stored
pub fn validate_url(candidate: &str) -> Result<String, SidebarError> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return Err(SidebarError::Validation("Please enter a URL".to_string()));
    }

    match Url::parse(trimmed) {
        Ok(url) if !url.cannot_be_a_base() => Ok(trimmed.to_string()),
        _ => Err(SidebarError::Validation(
            "Please enter a valid URL (e.g. https://example.com)".to_string(),
        )),
    }
}

/// Append a link to the end of the list
pub fn add_link(links: &[String], candidate: &str) -> Result<Vec<String>, SidebarError> {
    let url = validate_url(candidate)?;

    if links.contains(&url) {
        return Err(SidebarError::Duplicate);
    }

    let mut updated = links.to_vec();
    updated.push(url);
    Ok(updated)
}

/// Remove the exact match for `url`; `None` when it is not in the list
pub fn remove_link(links: &[String], url: &str) -> Option<Vec<String>> {
    let index = links.iter().position(|link| link == url)?;
    let mut updated = links.to_vec();
    updated.remove(index);
    Some(updated)
}

/// Move the entry at `from` so that it ends up at index `to`
///
/// Returns `None` for a drop onto its own index or an out-of-range index.
pub fn move_link(links: &[String], from: usize, to: usize) -> Option<Vec<String>> {
    if from == to || from >= links.len() || to >= links.len() {
        return None;
    }

    let mut updated = links.to_vec();
    let moved = updated.remove(from);
    updated.insert(to, moved);
    Some(updated)
}
