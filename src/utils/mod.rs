//! Utility functions and helpers.

pub mod http;

use regex::Regex;
use url::Url;

use crate::models::ItemId;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Build the URL of one search result page.
///
/// Any existing `page` parameter is replaced.
pub fn page_url(search_url: &Url, page: u32) -> Url {
    let pairs: Vec<(String, String)> = search_url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = search_url.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("page", &page.to_string());
    url
}

/// Extract the numeric item id from a URL using the first capture group.
pub fn extract_item_id(pattern: &Regex, href: &str) -> Option<ItemId> {
    pattern
        .captures(href)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
