//! Maintenance passes that work on the generated site alone.

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use jekyllize_shared::{AppConfig, JekyllizeError, Navigation, Result};

use crate::categorize::Categorizer;
use crate::navigation::{NavEntry, NavOrder, NavUpdate, build_navigation, update_site_config};
use crate::site::{SiteLayout, SitePage, load_pages};

/// Menu produced by a maintenance pass and what happened to the site config.
#[derive(Debug, Clone)]
pub struct NavRebuild {
    pub navigation: Navigation,
    /// `None` when the config was not touched (dry run).
    pub outcome: Option<NavUpdate>,
    pub warnings: Vec<String>,
}

/// A page removed because its body matched an earlier page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    pub file_name: String,
    pub kept: String,
}

/// Outcome of [`dedupe`].
#[derive(Debug, Clone)]
pub struct DedupeReport {
    /// Listed pages that were found and removed.
    pub removed: Vec<String>,
    /// Listed pages that did not exist.
    pub missing: Vec<String>,
    pub duplicates: Vec<Duplicate>,
    pub dry_run: bool,
    pub rebuild: NavRebuild,
}

/// Rebuild the menu from the pages in `docs/`.
///
/// Pages are grouped with the `[maintenance]` table: one recorded under the
/// default category stays there, the rest follow their title keywords or
/// land in the fallback category. Entries are ordered by title.
#[instrument(skip(app), fields(site = %site_dir.display()))]
pub fn rebuild_navigation(site_dir: &Path, app: &AppConfig) -> Result<NavRebuild> {
    let site = SiteLayout::new(site_dir, &app.site);
    let (pages, warnings) = load_pages(&site, &app.default_category)?;
    let categorizer = Categorizer::maintenance(app);

    let entries: Vec<NavEntry> = pages
        .iter()
        .map(|page| {
            let title = display_title(page);
            NavEntry {
                number: page.front_matter.section_number,
                category: categorizer
                    .with_hint(&title, &page.front_matter.nav_category)
                    .to_string(),
                title,
                slug: page.slug.clone(),
            }
        })
        .collect();

    let navigation = build_navigation(
        &entries,
        &app.maintenance.categories,
        NavOrder::Title,
        &app.maintenance_navigation(),
        false,
    );
    write_navigation(&site, navigation, warnings, false)
}

/// Remove listed and duplicate pages, then rebuild the menu from the rest.
///
/// A page is a duplicate when it carries the same `section_number` (or none)
/// as a page whose file name sorts earlier and its body hashes the same.
/// Empty and placeholder bodies never count as duplicates. With `dry_run`
/// nothing is deleted or written.
#[instrument(skip(app), fields(site = %site_dir.display()))]
pub fn dedupe(site_dir: &Path, app: &AppConfig, dry_run: bool) -> Result<DedupeReport> {
    let site = SiteLayout::new(site_dir, &app.site);
    let docs_dir = site.docs_dir();

    let mut removed = Vec::new();
    let mut missing = Vec::new();
    for name in &app.dedupe.remove {
        let path = docs_dir.join(name);
        if !path.is_file() {
            missing.push(name.clone());
            continue;
        }
        if !dry_run {
            std::fs::remove_file(&path).map_err(|e| JekyllizeError::io(&path, e))?;
        }
        info!(file = %name, dry_run, "removed listed page");
        removed.push(name.clone());
    }

    let (pages, warnings) = load_pages(&site, &app.default_category)?;

    let placeholder = app.sections.placeholder.as_str();
    let mut seen: HashMap<(Option<u32>, String), &str> = HashMap::new();
    let mut duplicates = Vec::new();
    let mut remaining: Vec<&SitePage> = Vec::new();

    for page in pages.iter().filter(|p| !removed.contains(&p.file_name)) {
        let body = page.body();
        if body.trim().is_empty() || body.trim() == placeholder {
            remaining.push(page);
            continue;
        }

        let key = (page.front_matter.section_number, body_hash(body));
        if let Some(kept) = seen.get(&key) {
            if !dry_run {
                std::fs::remove_file(&page.path).map_err(|e| JekyllizeError::io(&page.path, e))?;
            }
            info!(file = %page.file_name, kept = %kept, dry_run, "removed duplicate page");
            duplicates.push(Duplicate {
                file_name: page.file_name.clone(),
                kept: kept.to_string(),
            });
            continue;
        }
        seen.insert(key, &page.file_name);
        remaining.push(page);
    }

    let entries: Vec<NavEntry> = remaining
        .iter()
        .map(|page| {
            let number = page.front_matter.section_number;
            let curated = number.and_then(|n| app.override_for(n));
            NavEntry {
                number,
                title: curated
                    .and_then(|o| o.title.clone())
                    .unwrap_or_else(|| display_title(page)),
                slug: page.slug.clone(),
                category: curated
                    .and_then(|o| o.category.clone())
                    .unwrap_or_else(|| page.front_matter.nav_category.clone()),
            }
        })
        .collect();

    let navigation = build_navigation(
        &entries,
        &app.maintenance.categories,
        NavOrder::Number,
        &app.maintenance_navigation(),
        false,
    );
    let rebuild = write_navigation(&site, navigation, warnings, dry_run)?;

    Ok(DedupeReport {
        removed,
        missing,
        duplicates,
        dry_run,
        rebuild,
    })
}

fn write_navigation(
    site: &SiteLayout,
    navigation: Navigation,
    mut warnings: Vec<String>,
    dry_run: bool,
) -> Result<NavRebuild> {
    if dry_run {
        return Ok(NavRebuild {
            navigation,
            outcome: None,
            warnings,
        });
    }

    let config_path = site.config_path();
    let outcome = update_site_config(&config_path, &navigation)?;
    warnings.extend(outcome.warning(&config_path));

    Ok(NavRebuild {
        navigation,
        outcome: Some(outcome),
        warnings,
    })
}

/// Front matter title, else the slug.
fn display_title(page: &SitePage) -> String {
    if page.front_matter.title.is_empty() {
        page.slug.clone()
    } else {
        page.front_matter.title.clone()
    }
}

fn body_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{ConvertConfig, SilentProgress, convert};
    use crate::test_support::{SITE_CONFIG, temp_dir, write_section};
    use jekyllize_shared::{SectionOverride, SectionsConfig};

    fn page(number: u32, title: &str, category: &str, body: &str) -> String {
        format!(
            "---\nlayout: page\ntitle: \"{title}\"\npermalink: /{slug}\nnav_category: \"{category}\"\nsection_number: {number}\n---\n{body}",
            slug = title.to_lowercase().replace(' ', "-"),
        )
    }

    fn site(label: &str) -> std::path::PathBuf {
        let root = temp_dir(label);
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::write(root.join("_config.yml"), SITE_CONFIG).unwrap();
        root
    }

    #[test]
    fn rebuild_orders_by_title_and_honours_hints() {
        let root = site("maint-rebuild");
        let docs = root.join("docs");
        std::fs::write(docs.join("b.markdown"), page(11, "Security Leadership", "Compliance & Resilience", "b")).unwrap();
        std::fs::write(docs.join("a.markdown"), page(10, "Security Awareness", "Security Program", "a")).unwrap();
        std::fs::write(docs.join("c.markdown"), page(1, "Welcome", "Getting Started", "c")).unwrap();

        let rebuild = rebuild_navigation(&root, &AppConfig::default()).unwrap();
        assert_eq!(rebuild.outcome, Some(NavUpdate::Updated));

        let groups: Vec<&str> = rebuild.navigation.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(groups, vec!["Getting Started", "Security Program"]);
        let titles: Vec<&str> = rebuild.navigation.groups[1]
            .links
            .iter()
            .map(|l| l.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Security Awareness", "Security Leadership"]);

        let config = std::fs::read_to_string(root.join("_config.yml")).unwrap();
        assert!(config.contains("    - \"Welcome\": \"/welcome\"\n"));
        assert!(config.contains(
            "  External Resources:\n    - GitHub Repo: \"https://github.com/CroodSolutions/CISOinaBox\"\n"
        ));
        assert!(!config.contains("Contributing"));
    }

    #[test]
    fn rebuild_moves_silent_titles_to_fallback() {
        let root = site("maint-rebuild-fallback");
        let docs = root.join("docs");
        std::fs::write(docs.join("a.markdown"), page(20, "Careers", "Advanced Topics", "a")).unwrap();
        std::fs::write(docs.join("b.markdown"), page(21, "Cyber Insurance", "Advanced Topics", "b")).unwrap();
        std::fs::write(docs.join("c.markdown"), page(22, "Odds and Ends", "Security Controls", "c")).unwrap();

        let rebuild = rebuild_navigation(&root, &AppConfig::default()).unwrap();

        let groups: Vec<(&str, Vec<&str>)> = rebuild
            .navigation
            .groups
            .iter()
            .map(|g| (g.label.as_str(), g.links.iter().map(|l| l.title.as_str()).collect()))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("Security Program", vec!["Careers"]),
                ("Compliance & Resilience", vec!["Cyber Insurance", "Odds and Ends"]),
            ]
        );
    }

    #[test]
    fn dedupe_removes_listed_and_identical_pages() {
        let root = site("maint-dedupe");
        let docs = root.join("docs");
        std::fs::write(docs.join("a-first.markdown"), page(4, "Mapping Attack Surface", "Risk & Threat Management", "same body\n")).unwrap();
        std::fs::write(docs.join("b-copy.markdown"), page(4, "Mapping Attack Surface Copy", "Risk & Threat Management", "same body\n")).unwrap();
        std::fs::write(docs.join("old.markdown"), page(9, "Old", "Getting Started", "old\n")).unwrap();
        std::fs::write(docs.join("keep.markdown"), page(2, "Business Risk", "Risk & Threat Management", "risk\n")).unwrap();

        let mut app = AppConfig::default();
        app.dedupe.remove = vec!["old.markdown".into(), "gone.markdown".into()];
        app.overrides.push(SectionOverride {
            number: 2,
            title: Some("Understanding Business Risk".into()),
            ..SectionOverride::default()
        });

        let report = dedupe(&root, &app, false).unwrap();

        assert_eq!(report.removed, vec!["old.markdown".to_string()]);
        assert_eq!(report.missing, vec!["gone.markdown".to_string()]);
        assert_eq!(
            report.duplicates,
            vec![Duplicate {
                file_name: "b-copy.markdown".into(),
                kept: "a-first.markdown".into(),
            }]
        );
        assert!(!docs.join("old.markdown").exists());
        assert!(!docs.join("b-copy.markdown").exists());
        assert!(docs.join("a-first.markdown").exists());

        let group = &report.rebuild.navigation.groups[0];
        assert_eq!(group.label, "Risk & Threat Management");
        let titles: Vec<&str> = group.links.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Understanding Business Risk", "Mapping Attack Surface"]);
    }

    #[test]
    fn dedupe_dry_run_changes_nothing() {
        let root = site("maint-dedupe-dry");
        let docs = root.join("docs");
        std::fs::write(docs.join("a.markdown"), page(1, "One", "Getting Started", "x")).unwrap();
        std::fs::write(docs.join("b.markdown"), page(1, "One Again", "Getting Started", "x")).unwrap();

        let report = dedupe(&root, &AppConfig::default(), true).unwrap();

        assert_eq!(report.duplicates.len(), 1);
        assert!(report.rebuild.outcome.is_none());
        assert!(docs.join("b.markdown").exists());
        assert_eq!(std::fs::read_to_string(root.join("_config.yml")).unwrap(), SITE_CONFIG);
    }

    #[test]
    fn identical_bodies_of_different_sections_are_kept() {
        let root = site("maint-dedupe-sections");
        let docs = root.join("docs");
        std::fs::write(docs.join("a.markdown"), page(3, "Alpha", "Getting Started", "shared\n")).unwrap();
        std::fs::write(docs.join("b.markdown"), page(4, "Beta", "Getting Started", "shared\n")).unwrap();

        let report = dedupe(&root, &AppConfig::default(), false).unwrap();

        assert!(report.duplicates.is_empty());
        assert!(docs.join("b.markdown").exists());
    }

    #[test]
    fn converted_placeholder_sections_survive_dedupe() {
        let root = temp_dir("maint-dedupe-placeholder");
        let source = root.join("source");
        write_section(&source, "21 - Cyber Insurance", "Placeholder");
        write_section(&source, "22 - Resources", "Placeholder");
        std::fs::create_dir_all(root.join("site")).unwrap();
        std::fs::write(root.join("site/_config.yml"), SITE_CONFIG).unwrap();

        let mut app = AppConfig::default();
        app.sections = SectionsConfig {
            first: 21,
            last: 22,
            ..SectionsConfig::default()
        };
        let config = ConvertConfig {
            source_dir: source,
            site_dir: root.join("site"),
            app,
        };
        convert(&config, &SilentProgress).unwrap();

        let report = dedupe(&config.site_dir, &config.app, false).unwrap();

        assert!(report.duplicates.is_empty());
        let docs = root.join("site/docs");
        assert!(docs.join("cyber-insurance.markdown").exists());
        assert!(docs.join("resources.markdown").exists());
        let titles: Vec<&str> = report
            .rebuild
            .navigation
            .groups
            .iter()
            .flat_map(|g| g.links.iter().map(|l| l.title.as_str()))
            .collect();
        assert_eq!(titles, vec!["Cyber Insurance", "Resources"]);
    }

    #[test]
    fn body_hash_is_hex_sha256() {
        let hash = body_hash("");
        assert_eq!(hash.len(), 64);
        assert!(hash.starts_with("e3b0c442"));
    }
}
