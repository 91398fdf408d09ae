//! Utility functions and helpers.

pub mod dom;
pub mod http;
#[cfg(test)]
pub mod mock;

use url::Url;

/// Schemes an anchor may keep after normalization.
const LINK_SCHEMES: &[&str] = &["http", "https", "mailto", "ftp"];

/// Schemes an image source may keep after normalization.
const IMAGE_SCHEMES: &[&str] = &["http", "https", "data"];

/// Resolve a potentially relative URL against a base URL.
///
/// Absolute inputs come back unchanged; `None` when the result cannot be
/// parsed at all.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(href).ok(),
        Err(_) => None,
    }
}

/// Resolve an anchor target, keeping only navigable schemes.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    resolve_url(base, href).filter(|u| LINK_SCHEMES.contains(&u.scheme()))
}

/// Resolve an image source, keeping only renderable schemes.
pub fn resolve_image(base: &Url, src: &str) -> Option<Url> {
    if src.trim().is_empty() {
        return None;
    }
    resolve_url(base, src).filter(|u| IMAGE_SCHEMES.contains(&u.scheme()))
}

/// Collect items into a vector, dropping later duplicates.
pub fn dedup_ordered<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
