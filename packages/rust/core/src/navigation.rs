//! Navigation menu builder.
//!
//! Groups pages into the configured categories, renders the `navbar-links:`
//! YAML block, and splices it into the site's `_config.yml`.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use jekyllize_shared::{
    CategoryConfig, JekyllizeError, NavGroup, NavLink, Navigation, NavigationConfig, Result,
    Section,
};

/// Comment line that opens the navigation block in the site config.
pub const NAV_MARKER: &str = "# Navigation Bar\nnavbar-links:";

/// One page as it should appear in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavEntry {
    pub number: Option<u32>,
    pub title: String,
    pub slug: String,
    pub category: String,
}

impl From<&Section> for NavEntry {
    fn from(section: &Section) -> Self {
        Self {
            number: Some(section.number),
            title: section.title.clone(),
            slug: section.slug.clone(),
            category: section.category.clone(),
        }
    }
}

/// Ordering of entries inside a category group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOrder {
    /// By section number; unnumbered entries last.
    Number,
    /// Alphabetically by title, ignoring case; exact case breaks ties.
    Title,
}

/// Outcome of writing a navigation block into the site config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavUpdate {
    Updated,
    MissingFile,
    MissingMarker,
}

impl NavUpdate {
    pub fn is_updated(self) -> bool {
        self == NavUpdate::Updated
    }

    /// Human-readable warning for the non-updated outcomes.
    pub fn warning(self, path: &Path) -> Option<String> {
        match self {
            NavUpdate::Updated => None,
            NavUpdate::MissingFile => Some(format!(
                "{} not found; navigation was not written",
                path.display()
            )),
            NavUpdate::MissingMarker => Some(format!(
                "no '# Navigation Bar' block in {}; navigation was not written",
                path.display()
            )),
        }
    }
}

/// Build a categorized menu.
///
/// Groups follow the configured category order and empty categories are
/// skipped. Entries whose category is not configured get groups of their own
/// after the configured ones, in first-seen order.
#[instrument(skip_all, fields(entries = entries.len()))]
pub fn build_navigation(
    entries: &[NavEntry],
    categories: &[CategoryConfig],
    order: NavOrder,
    nav_config: &NavigationConfig,
    trailing_slash: bool,
) -> Navigation {
    let mut labels: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    for entry in entries {
        if !labels.contains(&entry.category.as_str()) {
            warn!(category = %entry.category, slug = %entry.slug, "entry uses unconfigured category");
            labels.push(&entry.category);
        }
    }

    let mut groups = Vec::new();
    for label in labels {
        let mut members: Vec<&NavEntry> =
            entries.iter().filter(|e| e.category == label).collect();
        if members.is_empty() {
            continue;
        }
        sort_entries(&mut members, order);

        groups.push(NavGroup {
            label: label.to_string(),
            links: members
                .iter()
                .map(|e| NavLink {
                    title: e.title.clone(),
                    url: page_url(&e.slug, trailing_slash),
                })
                .collect(),
        });
    }

    let resources = (!nav_config.resources.is_empty()).then(|| NavGroup {
        label: nav_config.resources_label.clone(),
        links: nav_config
            .resources
            .iter()
            .map(|r| NavLink {
                title: r.label.clone(),
                url: resource_url(&r.url, trailing_slash),
            })
            .collect(),
    });

    debug!(groups = groups.len(), "navigation built");

    Navigation { groups, resources }
}

/// Render the navigation block, starting with the `# Navigation Bar` marker.
pub fn render_navigation(nav: &Navigation) -> String {
    let mut out = format!("{NAV_MARKER}\n");

    for group in &nav.groups {
        out.push_str(&format!("  \"{}\":\n", escape(&group.label)));
        for link in &group.links {
            out.push_str(&format!(
                "    - \"{}\": \"{}\"\n",
                escape(&link.title),
                escape(&link.url)
            ));
        }
    }

    if let Some(resources) = &nav.resources {
        out.push_str(&format!("  {}:\n", yaml_key(&resources.label)));
        for link in &resources.links {
            out.push_str(&format!(
                "    - {}: \"{}\"\n",
                yaml_key(&link.title),
                escape(&link.url)
            ));
        }
    }

    out
}

/// Replace the navigation block inside a site config.
///
/// The block runs from [`NAV_MARKER`] up to the first blank line or comment
/// line after it, or to the end of the text. Returns `None` when the marker
/// is absent.
pub fn splice_navigation(config_text: &str, nav_yaml: &str) -> Option<String> {
    let start = config_text.find(NAV_MARKER)?;
    let after = start + NAV_MARKER.len();
    let tail = &config_text[after..];

    let end = [tail.find("\n\n"), tail.find("\n#")]
        .into_iter()
        .flatten()
        .min()
        .map(|i| after + i)
        .unwrap_or(config_text.len());

    Some(format!(
        "{}{}{}",
        &config_text[..start],
        nav_yaml.trim(),
        &config_text[end..]
    ))
}

/// Read the site config, splice in `nav`, and write it back.
///
/// A missing file or marker is reported through [`NavUpdate`] rather than as
/// an error, since the pages themselves are still usable.
#[instrument(skip(nav), fields(path = %path.display()))]
pub fn update_site_config(path: &Path, nav: &Navigation) -> Result<NavUpdate> {
    if !path.exists() {
        warn!("site config not found");
        return Ok(NavUpdate::MissingFile);
    }

    let text = std::fs::read_to_string(path).map_err(|e| JekyllizeError::io(path, e))?;

    let Some(updated) = splice_navigation(&text, &render_navigation(nav)) else {
        warn!("navigation marker not found in site config");
        return Ok(NavUpdate::MissingMarker);
    };

    std::fs::write(path, updated).map_err(|e| JekyllizeError::io(path, e))?;
    info!(groups = nav.groups.len(), "site config navigation updated");

    Ok(NavUpdate::Updated)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sort_entries(entries: &mut [&NavEntry], order: NavOrder) {
    match order {
        NavOrder::Number => entries.sort_by(|a, b| {
            let a_key = a.number.unwrap_or(u32::MAX);
            let b_key = b.number.unwrap_or(u32::MAX);
            a_key.cmp(&b_key).then_with(|| a.title.cmp(&b.title))
        }),
        NavOrder::Title => entries.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| a.title.cmp(&b.title))
        }),
    }
}

fn page_url(slug: &str, trailing_slash: bool) -> String {
    if trailing_slash && !slug.is_empty() {
        format!("/{slug}/")
    } else {
        format!("/{slug}")
    }
}

fn resource_url(url: &str, trailing_slash: bool) -> String {
    if trailing_slash && url.starts_with('/') && !url.ends_with('/') {
        format!("{url}/")
    } else {
        url.to_string()
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Plain keys stay bare (`GitHub Repo:`); anything else is quoted.
fn yaml_key(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '-' || c == '_');
    if plain {
        s.to_string()
    } else {
        format!("\"{}\"", escape(s))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;
    use jekyllize_shared::AppConfig;

    fn entry(number: u32, title: &str, slug: &str, category: &str) -> NavEntry {
        NavEntry {
            number: Some(number),
            title: title.into(),
            slug: slug.into(),
            category: category.into(),
        }
    }

    fn entries() -> Vec<NavEntry> {
        vec![
            entry(3, "Understanding the Adversary", "understanding-the-adversary", "Risk & Threat Management"),
            entry(1, "Getting Started", "getting-started", "Getting Started"),
            entry(2, "Business Risk", "business-risk", "Risk & Threat Management"),
        ]
    }

    #[test]
    fn groups_follow_category_order_and_skip_empty() {
        let config = AppConfig::default();
        let nav = build_navigation(
            &entries(),
            &config.categories,
            NavOrder::Number,
            &config.navigation,
            false,
        );

        let labels: Vec<&str> = nav.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Getting Started", "Risk & Threat Management"]);
        assert_eq!(nav.groups[1].links[0].title, "Business Risk");
        assert_eq!(nav.groups[1].links[0].url, "/business-risk");
    }

    #[test]
    fn title_order_and_trailing_slash() {
        let config = AppConfig::default();
        let mut list = entries();
        list[2].number = Some(9);
        let nav = build_navigation(
            &list,
            &config.categories,
            NavOrder::Title,
            &config.navigation,
            true,
        );

        let risk = &nav.groups[1];
        assert_eq!(risk.links[0].title, "Business Risk");
        assert_eq!(risk.links[1].url, "/understanding-the-adversary/");
        let resources = nav.resources.expect("resources group");
        assert_eq!(resources.links[0].url, "/contributing/");
        assert_eq!(
            resources.links[1].url,
            "https://github.com/CroodSolutions/CISOinaBox"
        );
    }

    #[test]
    fn title_order_ignores_case() {
        let config = AppConfig::default();
        let list = vec![
            entry(1, "Risk Register", "b", "Risk & Threat Management"),
            entry(2, "adversary Basics", "a", "Risk & Threat Management"),
            entry(3, "Risk register", "c", "Risk & Threat Management"),
        ];
        let nav = build_navigation(
            &list,
            &config.categories,
            NavOrder::Title,
            &config.navigation,
            false,
        );

        let titles: Vec<&str> = nav.groups[0].links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["adversary Basics", "Risk Register", "Risk register"]);
    }

    #[test]
    fn unconfigured_category_gets_trailing_group() {
        let config = AppConfig::default();
        let list = vec![entry(5, "Odd", "odd", "Elsewhere")];
        let nav = build_navigation(
            &list,
            &config.categories,
            NavOrder::Number,
            &config.navigation,
            false,
        );
        assert_eq!(nav.groups.len(), 1);
        assert_eq!(nav.groups[0].label, "Elsewhere");
    }

    #[test]
    fn render_matches_jekyll_config_shape() {
        let config = AppConfig::default();
        let nav = build_navigation(
            &entries()[1..2],
            &config.categories,
            NavOrder::Number,
            &config.navigation,
            false,
        );

        let yaml = render_navigation(&nav);
        let expected = "# Navigation Bar\nnavbar-links:\n  \"Getting Started\":\n    - \"Getting Started\": \"/getting-started\"\n  Resources:\n    - Contributing: \"/contributing\"\n    - GitHub Repo: \"https://github.com/CroodSolutions/CISOinaBox\"\n";
        assert_eq!(yaml, expected);
    }

    #[test]
    fn splice_stops_at_blank_line() {
        let config = "title: Site\n\n# Navigation Bar\nnavbar-links:\n  Old:\n    - A: \"/a\"\n\n# Footer\nfooter: x\n";
        let out = splice_navigation(config, "# Navigation Bar\nnavbar-links:\n  New:\n").unwrap();
        assert_eq!(
            out,
            "title: Site\n\n# Navigation Bar\nnavbar-links:\n  New:\n\n# Footer\nfooter: x\n"
        );
    }

    #[test]
    fn splice_stops_at_comment_line() {
        let config = "# Navigation Bar\nnavbar-links:\n  Old:\n# Theme\ntheme: x";
        let out = splice_navigation(config, "# Navigation Bar\nnavbar-links:\n  New:\n").unwrap();
        assert_eq!(out, "# Navigation Bar\nnavbar-links:\n  New:\n# Theme\ntheme: x");
    }

    #[test]
    fn splice_runs_to_end_of_text() {
        let config = "a: 1\n# Navigation Bar\nnavbar-links:\n  Old:\n    - A: \"/a\"";
        let out = splice_navigation(config, "# Navigation Bar\nnavbar-links:\n  New:").unwrap();
        assert_eq!(out, "a: 1\n# Navigation Bar\nnavbar-links:\n  New:");
    }

    #[test]
    fn splice_is_idempotent() {
        let config = "# Navigation Bar\nnavbar-links:\n  Old:\n\nrest: 1\n";
        let yaml = "# Navigation Bar\nnavbar-links:\n  \"New\":\n    - \"A\": \"/a\"\n";
        let once = splice_navigation(config, yaml).unwrap();
        let twice = splice_navigation(&once, yaml).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn splice_without_marker() {
        assert!(splice_navigation("title: x\n", "# Navigation Bar\n").is_none());
    }

    #[test]
    fn update_site_config_outcomes() {
        let dir = temp_dir("nav-config");
        let path = dir.join("_config.yml");
        let nav = Navigation::default();

        assert_eq!(update_site_config(&path, &nav).unwrap(), NavUpdate::MissingFile);

        std::fs::write(&path, "title: x\n").unwrap();
        assert_eq!(update_site_config(&path, &nav).unwrap(), NavUpdate::MissingMarker);

        std::fs::write(&path, "title: x\n\n# Navigation Bar\nnavbar-links:\n  Old:\n").unwrap();
        assert_eq!(update_site_config(&path, &nav).unwrap(), NavUpdate::Updated);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "title: x\n\n# Navigation Bar\nnavbar-links:");
    }

    #[test]
    fn yaml_key_quotes_when_needed() {
        assert_eq!(yaml_key("GitHub Repo"), "GitHub Repo");
        assert_eq!(yaml_key("Docs: Extra"), "\"Docs: Extra\"");
    }
}
