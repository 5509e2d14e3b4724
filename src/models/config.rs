//! Application configuration structures.

use std::fs;
use std::path::Path;

use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Search page scanning
    #[serde(default)]
    pub search: SearchConfig,

    /// Detail page enrichment
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Rotation and sampling
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Message composition
    #[serde(default)]
    pub composer: ComposerConfig,

    /// Posting endpoint and pacing
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Persistent state location
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.search.pages == 0 {
            return Err(AppError::validation("search.pages must be > 0"));
        }
        url::Url::parse(&self.search.url)?;
        Regex::new(&self.search.item_id_pattern)?;
        Regex::new(&self.search.price_pattern)?;
        parse_selector(&self.search.item_selector)?;
        parse_selector(&self.enrichment.price_selector)?;
        parse_selector(&self.enrichment.shop_selector)?;

        if self.selection.sample_size == 0 {
            return Err(AppError::validation("selection.sample_size must be > 0"));
        }
        if self.selection.avoid_repeat_days == 0 {
            return Err(AppError::validation(
                "selection.avoid_repeat_days must be > 0",
            ));
        }

        self.composer.validate()?;

        url::Url::parse(&self.publisher.endpoint)?;
        if self.storage.state_file.trim().is_empty() {
            return Err(AppError::validation("storage.state_file is empty"));
        }
        Ok(())
    }
}

/// Parse a CSS selector, mapping failures into `AppError`.
pub fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between search page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Search result scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search URL; `page=<n>` is appended per page
    #[serde(default = "defaults::search_url")]
    pub url: String,

    /// Number of result pages to scan
    #[serde(default = "defaults::pages")]
    pub pages: u32,

    /// CSS selector for listing anchors
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Regex capturing the numeric item id from an href
    #[serde(default = "defaults::item_id_pattern")]
    pub item_id_pattern: String,

    /// Regex matching a formatted price
    #[serde(default = "defaults::price_pattern")]
    pub price_pattern: String,

    /// Title used when an anchor has no text
    #[serde(default = "defaults::fallback_title")]
    pub fallback_title: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: defaults::search_url(),
            pages: defaults::pages(),
            item_selector: defaults::item_selector(),
            item_id_pattern: defaults::item_id_pattern(),
            price_pattern: defaults::price_pattern(),
            fallback_title: defaults::fallback_title(),
        }
    }
}

/// Detail page enrichment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,

    /// CSS selector for the price on a detail page
    #[serde(default = "defaults::detail_price_selector")]
    pub price_selector: String,

    /// CSS selector for the shop name on a detail page
    #[serde(default = "defaults::detail_shop_selector")]
    pub shop_selector: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::enabled(),
            price_selector: defaults::detail_price_selector(),
            shop_selector: defaults::detail_shop_selector(),
        }
    }
}

/// Rotation and sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Listings posted per run
    #[serde(default = "defaults::sample_size")]
    pub sample_size: usize,

    /// Listings posted within this many days are skipped
    #[serde(default = "defaults::avoid_repeat_days")]
    pub avoid_repeat_days: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            sample_size: defaults::sample_size(),
            avoid_repeat_days: defaults::avoid_repeat_days(),
        }
    }
}

impl SelectionConfig {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.avoid_repeat_days))
    }
}

/// Message composition settings.
///
/// Templates may use the placeholders `{title}`, `{price}`, `{shop}`,
/// `{url}` and `{tags}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Character budget of the target platform
    #[serde(default = "defaults::max_chars")]
    pub max_chars: usize,

    /// Title limit for the first render
    #[serde(default = "defaults::title_limit")]
    pub title_limit: usize,

    /// Title limit for the corrective render
    #[serde(default = "defaults::strict_title_limit")]
    pub strict_title_limit: usize,

    /// Cut the message to the budget when the corrective render is still too long
    #[serde(default = "defaults::enabled")]
    pub hard_truncate: bool,

    #[serde(default = "defaults::templates")]
    pub templates: Vec<String>,

    /// Decorations appended to the title, one per message
    #[serde(default = "defaults::title_tails")]
    pub title_tails: Vec<String>,

    /// Tags present on every message
    #[serde(default = "defaults::mandatory_tags")]
    pub mandatory_tags: Vec<String>,

    /// Pool for the optional extra tag
    #[serde(default = "defaults::extra_tags")]
    pub extra_tags: Vec<String>,

    /// Chance of appending one extra tag
    #[serde(default = "defaults::extra_tag_probability")]
    pub extra_tag_probability: f64,

    /// Rendering of the price placeholder; `{price}` is the raw price
    #[serde(default = "defaults::price_format")]
    pub price_format: String,

    /// Rendering of the shop placeholder; `{shop}` is the shop name
    #[serde(default = "defaults::shop_format")]
    pub shop_format: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_chars: defaults::max_chars(),
            title_limit: defaults::title_limit(),
            strict_title_limit: defaults::strict_title_limit(),
            hard_truncate: defaults::enabled(),
            templates: defaults::templates(),
            title_tails: defaults::title_tails(),
            mandatory_tags: defaults::mandatory_tags(),
            extra_tags: defaults::extra_tags(),
            extra_tag_probability: defaults::extra_tag_probability(),
            price_format: defaults::price_format(),
            shop_format: defaults::shop_format(),
        }
    }
}

impl ComposerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_chars == 0 {
            return Err(AppError::validation("composer.max_chars must be > 0"));
        }
        if self.title_limit == 0 || self.strict_title_limit == 0 {
            return Err(AppError::validation("composer title limits must be > 0"));
        }
        if self.strict_title_limit > self.title_limit {
            return Err(AppError::validation(
                "composer.strict_title_limit must not exceed composer.title_limit",
            ));
        }
        if self.templates.is_empty() {
            return Err(AppError::validation("No composer templates defined"));
        }
        if let Some(t) = self.templates.iter().find(|t| !t.contains("{url}")) {
            return Err(AppError::validation(format!(
                "composer template has no {{url}} placeholder: {t:?}"
            )));
        }
        if self.title_tails.is_empty() {
            return Err(AppError::validation("No composer title tails defined"));
        }
        if !(0.0..=1.0).contains(&self.extra_tag_probability) {
            return Err(AppError::validation(
                "composer.extra_tag_probability must be within 0..=1",
            ));
        }
        Ok(())
    }
}

/// Posting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Post creation endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Pause between two posts in seconds
    #[serde(default = "defaults::post_delay")]
    pub post_delay_secs: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            post_delay_secs: defaults::post_delay(),
        }
    }
}

/// Persistent state settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Rotation file name, relative to the storage directory
    #[serde(default = "defaults::state_file")]
    pub state_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; rotator/0.1; +bot contact: youremail@example.com)".into()
    }
    pub fn timeout() -> u64 {
        25
    }
    pub fn request_delay() -> u64 {
        500
    }

    // Search defaults
    pub fn search_url() -> String {
        "https://booth.pm/ja/search/VRChat?sort=new&in_stock=true".into()
    }
    pub fn pages() -> u32 {
        5
    }
    pub fn item_selector() -> String {
        "a[href*='/items/']".into()
    }
    pub fn item_id_pattern() -> String {
        r"/items/(\d+)".into()
    }
    pub fn price_pattern() -> String {
        r"¥\s?[\d,]+".into()
    }
    pub fn fallback_title() -> String {
        "BOOTH item".into()
    }

    // Enrichment defaults
    pub fn enabled() -> bool {
        true
    }
    pub fn detail_price_selector() -> String {
        ".variation-price, .price".into()
    }
    pub fn detail_shop_selector() -> String {
        ".shop-name-label, .shop-name".into()
    }

    // Selection defaults
    pub fn sample_size() -> usize {
        2
    }
    pub fn avoid_repeat_days() -> u32 {
        14
    }

    // Composer defaults
    pub fn max_chars() -> usize {
        275
    }
    pub fn title_limit() -> usize {
        80
    }
    pub fn strict_title_limit() -> usize {
        60
    }
    pub fn templates() -> Vec<String> {
        vec![
            "🎲 BOOTHランダム [VRChat]\n{title}\n{price} {shop}\n{url}\n{tags}".into(),
            "今日のランダムピック🎲\n{title}\n{price}\n{shop}\n{url}\n{tags}".into(),
            "{title}\n{price} {shop}\n👉 {url}\n{tags}".into(),
            "VRChat向けアイテムをランダム紹介\n{title} {price}\n{shop}\n{url}\n{tags}".into(),
            "🔎 BOOTHで見つけた\n{title}\n{shop} {price}\n{url} {tags}".into(),
        ]
    }
    pub fn title_tails() -> Vec<String> {
        vec![
            " ".into(),
            " ✨".into(),
            " 💫".into(),
            " 🎀".into(),
            " 👀".into(),
        ]
    }
    pub fn mandatory_tags() -> Vec<String> {
        vec!["#VRChat".into(), "#booth_pm".into()]
    }
    pub fn extra_tags() -> Vec<String> {
        vec![
            "#VRChat衣装".into(),
            "#VRChatアバター".into(),
            "#VRChatワールド".into(),
            "#3Dモデル".into(),
            "#BOOTH".into(),
        ]
    }
    pub fn extra_tag_probability() -> f64 {
        0.4
    }
    pub fn price_format() -> String {
        "💴 {price}".into()
    }
    pub fn shop_format() -> String {
        "🏠 {shop}".into()
    }

    // Publisher defaults
    pub fn endpoint() -> String {
        "https://api.twitter.com/2/tweets".into()
    }
    pub fn post_delay() -> u64 {
        2
    }

    // Storage defaults
    pub fn state_file() -> String {
        "random_seen.json".into()
    }
}
