// src/services/listings.rs

//! Search page listing fetcher.
//!
//! Turns one page of storefront search results into candidates.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Candidate, ItemId, SearchConfig, parse_selector};
use crate::utils::http::fetch_document;
use crate::utils::{extract_item_id, page_url, resolve_url};

/// Source of raw listings, one search page at a time.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    /// Fetch page `page` (1-based).
    ///
    /// An empty vector is a valid page without results; errors are
    /// reserved for HTTP and parse failures.
    async fn fetch_page(&self, page: u32) -> Result<Vec<Candidate>>;
}

/// Compiled extraction rules for search result pages.
#[derive(Debug, Clone)]
pub struct ListingParser {
    item_selector: Selector,
    item_id_pattern: Regex,
    price_pattern: Regex,
    fallback_title: String,
}

impl ListingParser {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            item_selector: parse_selector(&config.item_selector)?,
            item_id_pattern: Regex::new(&config.item_id_pattern)?,
            price_pattern: Regex::new(&config.price_pattern)?,
            fallback_title: config.fallback_title.clone(),
        })
    }

    /// Extract listings from a parsed search page.
    ///
    /// A listing usually appears as several anchors (thumbnail, title); these
    /// are folded into one candidate per id, in first-seen order.
    pub fn parse(&self, document: &Html, base_url: &Url) -> Vec<Candidate> {
        let mut listings: Vec<Candidate> = Vec::new();
        let mut positions: HashMap<ItemId, usize> = HashMap::new();

        for anchor in document.select(&self.item_selector) {
            let Some(listing) = self.parse_anchor(&anchor, base_url) else {
                continue;
            };

            match positions.get(&listing.id) {
                Some(&pos) => self.fold(&mut listings[pos], listing),
                None => {
                    positions.insert(listing.id, listings.len());
                    listings.push(listing);
                }
            }
        }

        listings
    }

    fn parse_anchor(&self, anchor: &ElementRef, base_url: &Url) -> Option<Candidate> {
        let href = anchor.value().attr("href")?;
        let id = extract_item_id(&self.item_id_pattern, href)?;

        let text = normalize_whitespace(&anchor.text().collect::<String>());
        let title = if text.is_empty() {
            self.fallback_title.clone()
        } else {
            text
        };

        let price = anchor
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| {
                let text = normalize_whitespace(&parent.text().collect::<Vec<_>>().join(" "));
                self.price_pattern
                    .find(&text)
                    .map(|m| m.as_str().to_string())
            });

        Some(Candidate {
            id,
            title,
            url: resolve_url(base_url, href),
            price,
            shop: None,
        })
    }

    fn fold(&self, existing: &mut Candidate, other: Candidate) {
        if existing.title == self.fallback_title && other.title != self.fallback_title {
            existing.title = other.title;
        }
        if existing.price.is_none() {
            existing.price = other.price;
        }
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetches search result pages over HTTP.
pub struct SearchPageFetcher {
    client: Client,
    search_url: Url,
    parser: ListingParser,
}

impl SearchPageFetcher {
    pub fn new(client: Client, config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client,
            search_url: Url::parse(&config.url)?,
            parser: ListingParser::new(config)?,
        })
    }
}

#[async_trait]
impl ListingFetcher for SearchPageFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Vec<Candidate>> {
        let url = page_url(&self.search_url, page);
        log::debug!("Fetching search page {}: {}", page, url);

        let document = fetch_document(&self.client, url.as_str())
            .await
            .map_err(|e| AppError::fetch(format!("search page {page}"), e))?;

        Ok(self.parser.parse(&document, &url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <ul>
            <li class="item-card">
              <a href="/ja/items/1001"><img src="thumb.png"></a>
              <div class="item-card__summary">
                <a href="/ja/items/1001">  Winter Coat
                  for Avatars </a>
                <div class="price">¥ 1,500</div>
              </div>
            </li>
            <li class="item-card">
              <div>
                <a href="https://booth.pm/ja/items/1002">Shader Pack</a>
              </div>
            </li>
            <li><a href="/ja/shops/77">Not an item</a></li>
            <li><div><a href="/ja/items/1003"></a></div></li>
          </ul>
        </body></html>
    "#;

    fn parser() -> ListingParser {
        ListingParser::new(&SearchConfig::default()).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://booth.pm/ja/search/VRChat?sort=new&page=1").unwrap()
    }

    #[test]
    fn parses_listings_from_search_page() {
        let document = Html::parse_document(SEARCH_PAGE);
        let listings = parser().parse(&document, &base());

        let ids: Vec<_> = listings.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1001, 1002, 1003]);

        assert_eq!(listings[0].title, "Winter Coat for Avatars");
        assert_eq!(listings[0].url, "https://booth.pm/ja/items/1001");
        assert_eq!(listings[0].price.as_deref(), Some("¥ 1,500"));

        assert_eq!(listings[1].price, None);
        assert_eq!(listings[2].title, "BOOTH item");
    }

    #[test]
    fn empty_page_yields_no_listings() {
        let document = Html::parse_document("<html><body><p>0件</p></body></html>");
        assert!(parser().parse(&document, &base()).is_empty());
    }

    #[test]
    fn rejects_invalid_selector() {
        let config = SearchConfig {
            item_selector: "[[invalid".into(),
            ..SearchConfig::default()
        };
        assert!(ListingParser::new(&config).is_err());
    }
}
