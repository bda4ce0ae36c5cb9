//! Keyword-based assignment of sections to navigation categories.
//!
//! Conversion uses the `[[categories]]` table with [`Categorizer::scored`],
//! which weighs title hits above content hits. Title repair and menu rebuilds
//! use the `[maintenance]` table through [`Categorizer::maintenance`]:
//! [`Categorizer::first_match`] takes the first category hit by the title and
//! [`Categorizer::with_hint`] also keeps pages pinned to the default category.

use tracing::trace;

use jekyllize_shared::{AppConfig, CategoryConfig};

/// Score added for every keyword found in the title.
const TITLE_WEIGHT: u32 = 10;
/// Score added for every keyword found in the content.
const CONTENT_WEIGHT: u32 = 3;

/// Assigns categories from the configured keyword table.
#[derive(Debug, Clone)]
pub struct Categorizer<'a> {
    categories: &'a [CategoryConfig],
    default: &'a str,
    /// Category for [`Categorizer::with_hint`] when the title matches nothing.
    fallback: &'a str,
    /// Lowercased keywords, parallel to `categories`.
    keywords: Vec<Vec<String>>,
}

impl<'a> Categorizer<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self::from_parts(&config.categories, &config.default_category)
    }

    /// Categorizer over the `[maintenance]` table.
    pub fn maintenance(config: &'a AppConfig) -> Self {
        let m = &config.maintenance;
        Self::from_parts(&m.categories, &m.default_category).with_fallback(&m.fallback_category)
    }

    pub fn from_parts(categories: &'a [CategoryConfig], default: &'a str) -> Self {
        let keywords = categories
            .iter()
            .map(|c| c.keywords.iter().map(|k| k.to_lowercase()).collect())
            .collect();
        Self {
            categories,
            default,
            fallback: default,
            keywords,
        }
    }

    pub fn with_fallback(mut self, fallback: &'a str) -> Self {
        self.fallback = fallback;
        self
    }

    /// The category used when nothing matches.
    pub fn default_category(&self) -> &'a str {
        self.default
    }

    /// Highest keyword score over title and content; ties go to the earlier
    /// category, and an all-zero score yields the default category.
    pub fn scored(&self, title: &str, content: &str) -> &'a str {
        let title = title.to_lowercase();
        let content = content.to_lowercase();

        let mut best: Option<(usize, u32)> = None;
        for (i, keywords) in self.keywords.iter().enumerate() {
            let score: u32 = keywords
                .iter()
                .map(|k| {
                    let mut s = 0;
                    if title.contains(k.as_str()) {
                        s += TITLE_WEIGHT;
                    }
                    if content.contains(k.as_str()) {
                        s += CONTENT_WEIGHT;
                    }
                    s
                })
                .sum();

            trace!(category = %self.categories[i].name, score, "category score");

            if best.is_none_or(|(_, top)| score > top) {
                best = Some((i, score));
            }
        }

        match best {
            Some((i, score)) if score > 0 => &self.categories[i].name,
            _ => self.default,
        }
    }

    /// First category (in configured order) with a keyword in the title.
    pub fn first_match(&self, title: &str) -> &'a str {
        self.title_match(title).unwrap_or(self.default)
    }

    /// Categorize a page that already carries a category.
    ///
    /// A hint naming the default category is kept as is; otherwise the title
    /// keywords decide, and a title matching nothing gets the fallback.
    pub fn with_hint(&self, title: &str, hint: &str) -> &'a str {
        if hint == self.default {
            return self.default;
        }
        self.title_match(title).unwrap_or(self.fallback)
    }

    fn title_match(&self, title: &str) -> Option<&'a str> {
        let title = title.to_lowercase();
        self.keywords
            .iter()
            .position(|keywords| keywords.iter().any(|k| title.contains(k.as_str())))
            .map(|i| self.categories[i].name.as_str())
    }
}
