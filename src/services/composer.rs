// src/services/composer.rs

//! Message composition.
//!
//! A message is one of several templates filled with the listing's title,
//! price, shop, URL and tags. Surface variation (template, title tail, extra
//! tag) comes from the injected random source; rendering itself is
//! deterministic for a given [`Draft`].
//!
//! Lengths are counted in `char`s. Truncation never splits a grapheme
//! cluster, so emoji and combining marks survive intact.

use rand::Rng;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::Result;
use crate::models::{Candidate, ComposerConfig};

const ELLIPSIS: &str = "…";

/// Random choices for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draft {
    pub template: usize,
    pub tail: usize,
    pub extra_tag: Option<usize>,
}

/// Turns candidates into bounded-length messages.
#[derive(Debug, Clone)]
pub struct Composer {
    config: ComposerConfig,
}

impl Composer {
    pub fn new(config: ComposerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Compose a message with fresh random choices.
    pub fn compose<R: Rng + ?Sized>(&self, candidate: &Candidate, rng: &mut R) -> String {
        let draft = self.draft(rng);
        self.compose_with(candidate, &draft)
    }

    /// Draw template, title tail and optional extra tag.
    pub fn draft<R: Rng + ?Sized>(&self, rng: &mut R) -> Draft {
        let template = rng.gen_range(0..self.config.templates.len());
        let tail = rng.gen_range(0..self.config.title_tails.len());
        let extra_tag = if !self.config.extra_tags.is_empty()
            && rng.gen_bool(self.config.extra_tag_probability)
        {
            Some(rng.gen_range(0..self.config.extra_tags.len()))
        } else {
            None
        };

        Draft {
            template,
            tail,
            extra_tag,
        }
    }

    /// Render a draft within the character budget.
    ///
    /// The first render uses the primary title limit; an overlong result is
    /// rendered once more with the strict limit. If that is still too long
    /// and hard truncation is enabled, the title gives up the remaining
    /// overflow and, failing that, the whole message is cut at the budget.
    pub fn compose_with(&self, candidate: &Candidate, draft: &Draft) -> String {
        let max = self.config.max_chars;

        let text = self.render(candidate, draft, self.config.title_limit);
        if char_len(&text) <= max {
            return text;
        }

        let text = self.render(candidate, draft, self.config.strict_title_limit);
        let len = char_len(&text);
        if len <= max {
            return text;
        }
        if !self.config.hard_truncate {
            log::warn!(
                "Message for item {} is {} chars, over the {} budget",
                candidate.id,
                len,
                max
            );
            return text;
        }

        let title_len = char_len(&truncate(&candidate.title, self.config.strict_title_limit));
        let text = self.render(candidate, draft, title_len.saturating_sub(len - max));
        if char_len(&text) <= max {
            return text;
        }

        log::debug!("Cutting message for item {} to {} chars", candidate.id, max);
        truncate(&text, max)
    }

    /// Tags for a draft: the mandatory tags plus at most one extra.
    pub fn tags(&self, draft: &Draft) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .config
            .mandatory_tags
            .iter()
            .map(String::as_str)
            .collect();

        if let Some(extra) = draft.extra_tag.and_then(|i| self.config.extra_tags.get(i)) {
            if !tags.contains(&extra.as_str()) {
                tags.push(extra);
            }
        }
        tags
    }

    fn render(&self, candidate: &Candidate, draft: &Draft, title_limit: usize) -> String {
        let template = &self.config.templates[draft.template % self.config.templates.len()];
        let tail = &self.config.title_tails[draft.tail % self.config.title_tails.len()];

        let title = format!("{}{}", truncate(&candidate.title, title_limit), tail);
        let price = optional_field(&self.config.price_format, "price", candidate.price.as_deref());
        let shop = optional_field(&self.config.shop_format, "shop", candidate.shop.as_deref());
        let tags = self.tags(draft).join(" ");

        let filled = fill(template, |name| match name {
            "title" => Some(title.clone()),
            "price" => Some(price.clone()),
            "shop" => Some(shop.clone()),
            "url" => Some(candidate.url.clone()),
            "tags" => Some(tags.clone()),
            _ => None,
        });

        tidy_lines(&filled)
    }
}

/// Length as counted against the character budget.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Shorten `text` to at most `limit` chars, marking the cut with `…`.
///
/// The cut falls on a grapheme boundary; the marker counts toward the limit.
pub fn truncate(text: &str, limit: usize) -> String {
    if char_len(text) <= limit {
        return text.to_string();
    }
    if limit == 0 {
        return String::new();
    }

    let budget = limit - char_len(ELLIPSIS);
    let mut used = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let width = char_len(grapheme);
        if used + width > budget {
            break;
        }
        used += width;
        out.push_str(grapheme);
    }

    let mut out = out.trim_end().to_string();
    out.push_str(ELLIPSIS);
    out
}

/// Render an optional field through its format, or nothing when absent.
fn optional_field(format: &str, name: &str, value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => fill(format, |n| (n == name).then(|| value.to_string())),
        None => String::new(),
    }
}

/// Substitute `{name}` placeholders in one pass.
///
/// Unknown placeholders are left as written. Substituted values are never
/// scanned again, so a title containing `{url}` stays literal.
fn fill(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Collapse whitespace runs, trim lines and drop the ones left empty.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
