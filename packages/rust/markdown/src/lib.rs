//! Text heuristics for migrating numbered Markdown sections to Jekyll pages.
//!
//! Title extraction and clean-up, slug derivation, front matter rendering and
//! parsing, and link rewriting. Everything here is pure string work; the
//! filesystem lives in `jekyllize-core`.

mod frontmatter;
mod links;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use jekyllize_shared::{TitleFixup, TitlesConfig};

pub use frontmatter::{
    ensure_heading, parse_front_matter, render_front_matter, replace_title, split_front_matter,
};
pub use links::{
    LinkTarget, asset_links, decode_spaces, internal_links, rewrite_asset_links,
    rewrite_section_links,
};

// ---------------------------------------------------------------------------
// Titles
// ---------------------------------------------------------------------------

/// A title as found in the source and its cleaned display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTitle {
    /// Extracted text before clean-up (used to match cross-section links).
    pub raw: String,
    /// Display title.
    pub title: String,
}

/// Derive a section title using the fallback chain:
/// content heading → directory name → configured "untitled" text.
pub fn derive_title(content: &str, dir_name: &str, titles: &TitlesConfig) -> DerivedTitle {
    let raw = extract_title(content)
        .or_else(|| {
            let from_dir = title_from_directory(dir_name);
            (!from_dir.is_empty()).then_some(from_dir)
        })
        .unwrap_or_else(|| titles.untitled.clone());

    let title = clean_title(&raw, &titles.fixups);
    debug!(raw = %raw, title = %title, "derived title");

    DerivedTitle { raw, title }
}

/// Extract a title from Markdown content.
///
/// Lines are scanned in order; the first H1 (`# ...`) or bold-only line
/// (`**...**`, inner text longer than 10 and shorter than 100 chars) wins.
pub fn extract_title(content: &str) -> Option<String> {
    static TRAILING_HASHES_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"#+$").expect("valid regex"));

    for line in content.lines() {
        let line = line.trim();

        if let Some(rest) = line.strip_prefix("# ") {
            let title = rest.trim().replace("**", "").replace("---", "");
            let title = TRAILING_HASHES_RE.replace(&title, "");
            let title = title.trim();
            if !title.is_empty() {
                return Some(title.to_string());
            }
            continue;
        }

        if line.len() >= 4 && line.starts_with("**") && line.ends_with("**") {
            let inner = line[2..line.len() - 2].trim();
            let len = inner.chars().count();
            if len > 10 && len < 100 {
                return Some(inner.to_string());
            }
        }
    }

    None
}

/// Build a human-readable title from a section directory name.
///
/// `"07 - product-and software security"` → `"Product and Software Security"`.
pub fn title_from_directory(dir_name: &str) -> String {
    const SMALL_WORDS: [&str; 7] = ["and", "the", "for", "of", "in", "on", "with"];

    let title = match dir_name.split_once(" - ") {
        Some((_, rest)) => rest,
        None => dir_name,
    };

    title
        .replace('-', " ")
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && SMALL_WORDS.contains(&lower.as_str()) {
                return lower;
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.as_str())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clean a title for navigation display.
///
/// Strips Markdown emphasis characters and `---`, collapses whitespace, then
/// repairs the first matching truncated suffix.
pub fn clean_title(title: &str, fixups: &[TitleFixup]) -> String {
    static MD_CHARS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[*#_]+").expect("valid regex"));
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let title = MD_CHARS_RE.replace_all(title, "");
    let title = title.replace("---", "");
    let title = WS_RE.replace_all(&title, " ");
    let mut title = title.trim().to_string();

    if let Some(fix) = fixups
        .iter()
        .find(|f| !f.suffix.is_empty() && title.ends_with(f.suffix.as_str()))
    {
        title.truncate(title.len() - fix.suffix.len());
        title.push_str(&fix.replacement);
    }

    title
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Convert a title to a URL-friendly slug, then apply exact-match overrides.
pub fn slugify(title: &str, overrides: &BTreeMap<String, String>) -> String {
    static INVALID_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid regex"));
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

    let slug = title.to_lowercase();
    let slug = INVALID_RE.replace_all(&slug, "");
    let slug = WS_RE.replace_all(&slug, "-");
    let slug = DASHES_RE.replace_all(&slug, "-");
    let slug = slug.trim_matches('-');

    match overrides.get(slug) {
        Some(special) => special.clone(),
        None => slug.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
