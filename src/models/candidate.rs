//! Listing data structures.

use serde::{Deserialize, Serialize};

/// Stable numeric identifier of a storefront listing.
pub type ItemId = u64;

/// A listing discovered on the search page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    /// Listing identifier taken from the item URL
    pub id: ItemId,

    /// Listing title as shown on the search page
    pub title: String,

    /// Absolute URL of the listing detail page
    pub url: String,

    /// Formatted price (e.g. `¥1,500`)
    #[serde(default)]
    pub price: Option<String>,

    /// Shop display name
    #[serde(default)]
    pub shop: Option<String>,
}

impl Candidate {
    /// Create a candidate without price or shop.
    pub fn new(id: ItemId, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            price: None,
            shop: None,
        }
    }

    /// Builder-style price setter.
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Builder-style shop setter.
    pub fn with_shop(mut self, shop: impl Into<String>) -> Self {
        self.shop = Some(shop.into());
        self
    }

    /// Return a copy with the enrichment fields merged in.
    ///
    /// Fields the enrichment did not find keep their current value.
    pub fn enriched(&self, enrichment: &Enrichment) -> Self {
        Self {
            price: enrichment.price.clone().or_else(|| self.price.clone()),
            shop: enrichment.shop.clone().or_else(|| self.shop.clone()),
            ..self.clone()
        }
    }
}

/// Supplementary fields scraped from a listing's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub price: Option<String>,
    pub shop: Option<String>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.shop.is_none()
    }
}
