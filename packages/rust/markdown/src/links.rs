//! Link rewriting passes for migrated pages.
//!
//! Each pass is a function `&str -> String`. Asset links are pointed at the
//! site's `assets/<ext>/` tree and links that mention another section's title
//! are pointed at that section's permalink.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use jekyllize_shared::Section;

/// Generic inline link `[text](target)`.
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").expect("valid regex"));

/// A section that other pages may link to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    /// Titles whose presence in link text identifies the section.
    pub titles: Vec<String>,
    /// Permalink slug of the section.
    pub slug: String,
}

impl From<&Section> for LinkTarget {
    fn from(section: &Section) -> Self {
        let mut titles = vec![section.raw_title.clone()];
        if section.title != section.raw_title {
            titles.push(section.title.clone());
        }
        Self {
            titles,
            slug: section.slug.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pass 1: Asset links
// ---------------------------------------------------------------------------

/// Point document links (`.pdf`, `.doc(x)`, `.xls(x)`) at `/assets/<ext>/`.
///
/// The asset file name is taken from the link text with spaces encoded as
/// `%20`; anything after the extension (query, anchor) is kept.
pub fn rewrite_asset_links(content: &str) -> String {
    static ASSET_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)\[([^\]]*)\]\([^)]*\.(pdf|docx?|xlsx?)([^)]*)\)").expect("valid regex")
    });

    ASSET_RE
        .replace_all(content, |caps: &Captures| {
            let text = &caps[1];
            let ext = &caps[2];
            let suffix = &caps[3];
            let file = text.replace(' ', "%20");
            format!("[{text}](/assets/{ext}/{file}.{ext}{suffix})")
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Cross-section links
// ---------------------------------------------------------------------------

/// Point relative links whose text mentions a section title at that section.
///
/// When several titles occur in the same link text the longest one wins.
/// Images, external URLs, anchors and asset links are left alone.
pub fn rewrite_section_links(content: &str, targets: &[LinkTarget]) -> String {
    LINK_RE
        .replace_all(content, |caps: &Captures| {
            let whole = caps.get(0).expect("group 0 always present");
            let text = &caps[1];
            let href = &caps[2];

            let start = whole.start();
            if start > 0 && content.as_bytes()[start - 1] == b'!' {
                return caps[0].to_string();
            }
            if is_external(href) || href.starts_with("/assets/") {
                return caps[0].to_string();
            }

            let best = targets
                .iter()
                .flat_map(|t| t.titles.iter().map(move |title| (title, &t.slug)))
                .filter(|(title, _)| !title.is_empty() && text.contains(title.as_str()))
                .max_by_key(|(title, _)| title.len());

            match best {
                Some((_, slug)) => format!("[{text}](/{slug})"),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

// ---------------------------------------------------------------------------
// Link extraction
// ---------------------------------------------------------------------------

/// All `[text](/assets/<path>)` links as `(text, path)` pairs.
pub fn asset_links(content: &str) -> Vec<(String, String)> {
    static ASSET_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[([^\]]*)\]\(/assets/([^)]+)\)").expect("valid regex")
    });

    ASSET_LINK_RE
        .captures_iter(content)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

/// Root-relative link targets (`/slug`, `/slug/#anchor`), excluding assets.
pub fn internal_links(content: &str) -> Vec<String> {
    LINK_RE
        .captures_iter(content)
        .map(|c| c[2].trim().to_string())
        .filter(|href| {
            href.starts_with('/') && !href.starts_with("//") && !href.starts_with("/assets/")
        })
        .collect()
}

/// Undo the `%20` encoding applied by [`rewrite_asset_links`].
pub fn decode_spaces(path: &str) -> String {
    path.replace("%20", " ")
}

fn is_external(href: &str) -> bool {
    href.starts_with("http://")
        || href.starts_with("https://")
        || href.starts_with("mailto:")
        || href.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(titles: &[&str], slug: &str) -> LinkTarget {
        LinkTarget {
            titles: titles.iter().map(|t| t.to_string()).collect(),
            slug: slug.into(),
        }
    }

    #[test]
    fn asset_link_rewritten_from_text() {
        let input = "See [Risk Register Template](./files/register_v2.xlsx) for details.";
        assert_eq!(
            rewrite_asset_links(input),
            "See [Risk Register Template](/assets/xlsx/Risk%20Register%20Template.xlsx) for details."
        );
    }

    #[test]
    fn asset_link_keeps_suffix_and_case() {
        let input = "[Policy](Policy.PDF#page=2)";
        assert_eq!(
            rewrite_asset_links(input),
            "[Policy](/assets/PDF/Policy.PDF#page=2)"
        );
    }

    #[test]
    fn asset_link_rewrite_is_idempotent() {
        let once = rewrite_asset_links("[Plan](plan.docx)");
        assert_eq!(rewrite_asset_links(&once), once);
    }

    #[test]
    fn non_document_links_untouched() {
        let input = "[Site](https://example.com/page.html) ![Logo](logo.png)";
        assert_eq!(rewrite_asset_links(input), input);
    }

    #[test]
    fn section_link_rewritten() {
        let targets = vec![target(&["Security Awareness"], "security-awareness")];
        let input = "Read [the Security Awareness chapter](../13%20-%20Security%20Awareness/Readme.md).";
        assert_eq!(
            rewrite_section_links(input, &targets),
            "Read [the Security Awareness chapter](/security-awareness)."
        );
    }

    #[test]
    fn section_link_longest_title_wins() {
        let targets = vec![
            target(&["Risk"], "understanding-business-risk"),
            target(&["Vulnerability Management and Risk"], "vulnerability-management-and-risk"),
        ];
        let input = "[Vulnerability Management and Risk](../18/Readme.md)";
        assert_eq!(
            rewrite_section_links(input, &targets),
            "[Vulnerability Management and Risk](/vulnerability-management-and-risk)"
        );
    }

    #[test]
    fn section_link_skips_external_images_and_assets() {
        let targets = vec![target(&["Frameworks"], "frameworks-and-standards")];
        let input = "[NIST Frameworks](https://nist.gov) ![Frameworks](fw.png) [Frameworks](/assets/pdf/Frameworks.pdf)";
        assert_eq!(rewrite_section_links(input, &targets), input);
    }

    #[test]
    fn section_link_ignores_empty_titles() {
        let targets = vec![target(&[""], "everything")];
        let input = "[Anything](other.md)";
        assert_eq!(rewrite_section_links(input, &targets), input);
    }

    #[test]
    fn extracts_asset_links() {
        let links = asset_links("[A](/assets/pdf/A%20B.pdf) and [C](/other)");
        assert_eq!(links, vec![("A".to_string(), "pdf/A%20B.pdf".to_string())]);
    }

    #[test]
    fn extracts_internal_links() {
        let links = internal_links(
            "[a](/getting-started) [b](/assets/pdf/x.pdf) [c](https://x.y) [d](//cdn.x) [e](/resources/)",
        );
        assert_eq!(links, vec!["/getting-started".to_string(), "/resources/".to_string()]);
    }

    #[test]
    fn decode_spaces_reverses_encoding() {
        assert_eq!(decode_spaces("pdf/Risk%20Register.pdf"), "pdf/Risk Register.pdf");
    }
}
