// src/services/enrich.rs

//! Detail page enrichment for selected candidates.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Candidate, EnrichmentConfig, Enrichment, SearchConfig, parse_selector};
use crate::utils::http::fetch_document;

/// Looks up supplementary fields for one candidate.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, candidate: &Candidate) -> Result<Enrichment>;
}

/// Enrich a candidate, keeping it unchanged on any failure.
pub async fn enrich_or_keep(enricher: &dyn Enricher, candidate: &Candidate) -> Candidate {
    match enricher.enrich(candidate).await {
        Ok(enrichment) => {
            if enrichment.is_empty() {
                log::debug!("No detail fields found for {}", candidate.url);
            }
            candidate.enriched(&enrichment)
        }
        Err(error) => {
            log::debug!("Enrichment skipped for {}: {}", candidate.url, error);
            candidate.clone()
        }
    }
}

/// Scrapes price and shop name from a listing's detail page.
pub struct DetailPageEnricher {
    client: Client,
    price_selector: Selector,
    shop_selector: Selector,
    price_pattern: Regex,
}

impl DetailPageEnricher {
    pub fn new(client: Client, config: &EnrichmentConfig, search: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client,
            price_selector: parse_selector(&config.price_selector)?,
            shop_selector: parse_selector(&config.shop_selector)?,
            price_pattern: Regex::new(&search.price_pattern)?,
        })
    }

    /// Extract the enrichment fields from a detail page.
    pub fn extract(&self, document: &Html) -> Enrichment {
        let shop = first_text(document, &self.shop_selector);

        let price = first_text(document, &self.price_selector)
            .and_then(|text| self.find_price(&text))
            .or_else(|| {
                let body = document.root_element().text().collect::<Vec<_>>().join(" ");
                self.find_price(&body)
            });

        Enrichment { price, shop }
    }

    fn find_price(&self, text: &str) -> Option<String> {
        self.price_pattern.find(text).map(|m| m.as_str().to_string())
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|text| !text.is_empty())
}

#[async_trait]
impl Enricher for DetailPageEnricher {
    async fn enrich(&self, candidate: &Candidate) -> Result<Enrichment> {
        let document = fetch_document(&self.client, &candidate.url)
            .await
            .map_err(|e| AppError::fetch(format!("item {}", candidate.id), e))?;
        Ok(self.extract(&document))
    }
}
