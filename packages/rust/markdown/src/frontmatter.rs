//! Jekyll front matter rendering, parsing, and in-place edits.
//!
//! Generated pages start with a `---` delimited block of `key: value` lines.
//! Only the handful of keys this tool writes are understood; anything else in
//! the block is carried through untouched by the editing helpers.

use jekyllize_shared::{FrontMatter, JekyllizeError, Result};

/// Render a front matter block, including both `---` delimiters and a
/// trailing newline.
pub fn render_front_matter(fm: &FrontMatter) -> String {
    let mut out = String::from("---\n");
    out.push_str(&format!("layout: {}\n", fm.layout));
    out.push_str(&format!("title: \"{}\"\n", escape_yaml_string(&fm.title)));
    out.push_str(&format!("permalink: /{}\n", fm.permalink));
    out.push_str(&format!(
        "nav_category: \"{}\"\n",
        escape_yaml_string(&fm.nav_category)
    ));
    if let Some(n) = fm.section_number {
        out.push_str(&format!("section_number: {n}\n"));
    }
    out.push_str("---\n");
    out
}

/// Split a page into its front matter block (without delimiters) and body.
///
/// Returns `None` when the text does not open with a `---` line or the block
/// is never closed.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

/// Parse the keys of a front matter block produced by [`split_front_matter`].
///
/// A missing `nav_category` falls back to `default_category`; a missing
/// `permalink` is left empty for the caller to fill from the file name.
pub fn parse_front_matter(block: &str, default_category: &str) -> Result<FrontMatter> {
    let mut fm = FrontMatter {
        layout: String::new(),
        title: String::new(),
        permalink: String::new(),
        nav_category: default_category.to_string(),
        section_number: None,
    };

    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = unquote(value.trim());

        match key.trim() {
            "layout" => fm.layout = value,
            "title" => fm.title = value,
            "permalink" => fm.permalink = value.trim_matches('/').to_string(),
            "nav_category" if !value.is_empty() => fm.nav_category = value,
            "section_number" => {
                let n = value.parse::<u32>().map_err(|e| {
                    JekyllizeError::parse(format!("invalid section_number '{value}': {e}"))
                })?;
                fm.section_number = Some(n);
            }
            _ => {}
        }
    }

    Ok(fm)
}

/// Rewrite the `title:` line of a page's front matter.
///
/// Only the front matter block is touched; a `title:` line in the body stays
/// as it is. Pages without front matter are returned unchanged.
pub fn replace_title(text: &str, title: &str) -> String {
    let Some((block, body)) = split_front_matter(text) else {
        return text.to_string();
    };

    let title_line = format!("title: \"{}\"", escape_yaml_string(title));
    let mut replaced = false;
    let mut lines: Vec<String> = block
        .lines()
        .map(|line| {
            if !replaced && line.trim_start().starts_with("title:") {
                replaced = true;
                title_line.clone()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !replaced {
        lines.push(title_line);
    }

    let mut out = String::from("---\n");
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(body);
    out
}

/// Insert `# <title>` at the top of the body unless it already opens with an H1.
pub fn ensure_heading(text: &str, title: &str) -> String {
    let (head, body) = match split_front_matter(text) {
        Some((block, body)) => (Some(block), body),
        None => (None, text),
    };

    if body.trim_start().starts_with("# ") {
        return text.to_string();
    }

    let rest = body.trim_start_matches(['\n', '\r']);
    match head {
        Some(block) => format!("---\n{block}---\n\n# {title}\n\n{rest}"),
        None => format!("# {title}\n\n{rest}"),
    }
}

/// Escape special characters in a YAML double-quoted string value.
fn escape_yaml_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Strip one layer of surrounding double quotes and undo [`escape_yaml_string`].
fn unquote(value: &str) -> String {
    match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrontMatter {
        FrontMatter {
            layout: "page".into(),
            title: "Security Leadership".into(),
            permalink: "security-leadership".into(),
            nav_category: "Security Program".into(),
            section_number: Some(11),
        }
    }

    #[test]
    fn render_matches_jekyll_layout() {
        let expected = "---\nlayout: page\ntitle: \"Security Leadership\"\npermalink: /security-leadership\nnav_category: \"Security Program\"\nsection_number: 11\n---\n";
        assert_eq!(render_front_matter(&sample()), expected);
    }

    #[test]
    fn render_escapes_quotes() {
        let mut fm = sample();
        fm.title = "The \"Human\" Firewall".into();
        let out = render_front_matter(&fm);
        assert!(out.contains("title: \"The \\\"Human\\\" Firewall\""));
    }

    #[test]
    fn render_then_parse_preserves_fields() {
        let mut fm = sample();
        fm.title = "Risk & \"Threat\"".into();
        let page = format!("{}# Body\n", render_front_matter(&fm));
        let (block, body) = split_front_matter(&page).expect("front matter");
        assert_eq!(body, "# Body\n");
        let parsed = parse_front_matter(block, "Getting Started").expect("parse");
        assert_eq!(parsed, fm);
    }

    #[test]
    fn split_requires_opening_delimiter() {
        assert!(split_front_matter("# Title\n---\n").is_none());
        assert!(split_front_matter("---\ntitle: \"x\"\n").is_none());
    }

    #[test]
    fn split_handles_closing_at_end_of_file() {
        let (block, body) = split_front_matter("---\nlayout: page\n---").expect("split");
        assert_eq!(block, "layout: page\n");
        assert_eq!(body, "");
    }

    #[test]
    fn parse_defaults_missing_category() {
        let fm = parse_front_matter("title: \"Resources\"\n", "Getting Started").unwrap();
        assert_eq!(fm.nav_category, "Getting Started");
        assert_eq!(fm.section_number, None);
        assert!(fm.permalink.is_empty());
    }

    #[test]
    fn parse_rejects_bad_section_number() {
        let err = parse_front_matter("section_number: seven\n", "Getting Started").unwrap_err();
        assert!(err.to_string().contains("seven"));
    }

    #[test]
    fn parse_keeps_colons_in_values() {
        let fm = parse_front_matter("title: \"CIS18: Basic Controls\"\n", "x").unwrap();
        assert_eq!(fm.title, "CIS18: Basic Controls");
    }

    #[test]
    fn replace_title_only_touches_front_matter() {
        let page = "---\nlayout: page\ntitle: \"Old\"\n---\n\ntitle: \"Old\" stays in body\n";
        let out = replace_title(page, "New");
        assert_eq!(
            out,
            "---\nlayout: page\ntitle: \"New\"\n---\n\ntitle: \"Old\" stays in body\n"
        );
    }

    #[test]
    fn replace_title_adds_missing_line() {
        let out = replace_title("---\nlayout: page\n---\nBody\n", "Added");
        assert_eq!(out, "---\nlayout: page\ntitle: \"Added\"\n---\nBody\n");
    }

    #[test]
    fn replace_title_without_front_matter_is_noop() {
        assert_eq!(replace_title("# Plain\n", "X"), "# Plain\n");
    }

    #[test]
    fn ensure_heading_inserts_after_front_matter() {
        let page = "---\ntitle: \"Cyber Insurance\"\n---\n\nSome intro.\n";
        let out = ensure_heading(page, "Cyber Insurance");
        assert_eq!(
            out,
            "---\ntitle: \"Cyber Insurance\"\n---\n\n# Cyber Insurance\n\nSome intro.\n"
        );
    }

    #[test]
    fn ensure_heading_keeps_existing_h1() {
        let page = "---\ntitle: \"A\"\n---\n\n# A\n\nBody\n";
        assert_eq!(ensure_heading(page, "A"), page);
    }

    #[test]
    fn ensure_heading_without_front_matter() {
        assert_eq!(ensure_heading("Body\n", "T"), "# T\n\nBody\n");
    }
}
