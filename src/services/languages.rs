// src/services/languages.rs

//! Language trial order.

use crate::models::LanguageCode;
use crate::utils::dedup_ordered;

/// Requested language first, then the configured defaults, without repeats.
pub fn language_order(requested: Option<&LanguageCode>, defaults: &[String]) -> Vec<LanguageCode> {
    let defaults = defaults.iter().filter_map(|code| LanguageCode::parse(code));
    dedup_ordered(requested.cloned().into_iter().chain(defaults))
}
