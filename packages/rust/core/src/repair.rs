//! Repair passes over an already generated site.
//!
//! `fix_titles` re-derives titles from the source and patches existing pages;
//! `generate_missing` writes pages for sections that never made it to `docs/`.

use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use jekyllize_markdown::{derive_title, ensure_heading, replace_title, rewrite_asset_links};
use jekyllize_shared::{JekyllizeError, Result};

use crate::categorize::Categorizer;
use crate::discovery::{find_sections, read_section_content};
use crate::navigation::{NavEntry, NavOrder, build_navigation, update_site_config};
use crate::pipeline::{ConvertConfig, ProgressReporter, derive_section};
use crate::site::{SitePage, load_pages, write_page};

/// Characters of normalized content compared when matching a page by body.
const MATCH_PREFIX_CHARS: usize = 200;
/// Source content shorter than this is never matched by body.
const MATCH_MIN_CONTENT: usize = 100;

/// One page whose title was rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleFix {
    pub number: u32,
    pub file_name: String,
    pub title: String,
}

/// Outcome of [`fix_titles`].
#[derive(Debug, Default)]
pub struct FixTitlesReport {
    pub fixed: Vec<TitleFix>,
    /// Section numbers with no matching page.
    pub unmatched: Vec<u32>,
    pub navigation_updated: bool,
    pub warnings: Vec<String>,
}

/// Outcome of [`generate_missing`].
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub created: Vec<PathBuf>,
    /// Page files left alone because they already exist.
    pub skipped: Vec<String>,
    pub warnings: Vec<String>,
}

/// Re-derive section titles and patch the matching generated pages.
///
/// Pages are matched by `section_number` first, then by comparing the first
/// characters of source and page body with whitespace removed. Each page is
/// matched at most once. The menu is rebuilt from the fixed pages, with
/// first-match categories, ordered by title.
#[instrument(skip_all, fields(source = %config.source_dir.display(), site = %config.site_dir.display()))]
pub fn fix_titles(config: &ConvertConfig, progress: &dyn ProgressReporter) -> Result<FixTitlesReport> {
    let app = &config.app;
    let site = config.site();

    progress.phase("Matching sections to pages");
    let discovery = find_sections(&config.source_dir, &app.sections)?;
    let (pages, load_warnings) = load_pages(&site, &app.default_category)?;

    let mut report = FixTitlesReport::default();
    report.warnings.extend(discovery.warnings);
    report.warnings.extend(load_warnings);

    let mut claimed = vec![false; pages.len()];
    let mut entries = Vec::new();
    let total = discovery.sections.len();

    for (i, src) in discovery.sections.iter().enumerate() {
        progress.section_started(src.number, &src.name, i + 1, total);

        let content = read_section_content(&src.path, &app.sections.readme_names)?
            .map(|(_, content)| content)
            .unwrap_or_default();
        let title = derive_title(&content, &src.name, &app.titles).title;

        let Some(idx) = match_page(&pages, &claimed, src.number, &content) else {
            debug!(number = src.number, "no page for section");
            report.unmatched.push(src.number);
            continue;
        };
        claimed[idx] = true;
        let page = &pages[idx];

        let mut text = replace_title(&page.text, &title);
        if !content.trim_start().starts_with("# ") {
            text = ensure_heading(&text, &title);
        }
        if text != page.text {
            std::fs::write(&page.path, &text).map_err(|e| JekyllizeError::io(&page.path, e))?;
            progress.page_written(&page.path);
        }

        entries.push(NavEntry {
            number: page.front_matter.section_number,
            title: title.clone(),
            slug: page.slug.clone(),
            category: String::new(),
        });
        report.fixed.push(TitleFix {
            number: src.number,
            file_name: page.file_name.clone(),
            title,
        });
    }

    progress.phase("Rebuilding navigation");
    let categorizer = Categorizer::maintenance(app);
    for entry in &mut entries {
        entry.category = categorizer.first_match(&entry.title).to_string();
    }

    let nav = build_navigation(
        &entries,
        &app.maintenance.categories,
        NavOrder::Title,
        &app.navigation,
        app.navigation.repair_trailing_slash,
    );
    let config_path = site.config_path();
    let outcome = update_site_config(&config_path, &nav)?;
    report.navigation_updated = outcome.is_updated();
    report.warnings.extend(outcome.warning(&config_path));

    progress.done(&format!("Fixed {} titles", report.fixed.len()));
    info!(
        fixed = report.fixed.len(),
        unmatched = report.unmatched.len(),
        "title repair complete"
    );

    Ok(report)
}

/// Write pages for sections whose page file does not exist yet, or for every
/// section when `force` is set.
///
/// Empty or placeholder content is replaced by a bare `# <title>` heading.
#[instrument(skip(config, progress), fields(source = %config.source_dir.display()))]
pub fn generate_missing(
    config: &ConvertConfig,
    force: bool,
    progress: &dyn ProgressReporter,
) -> Result<GenerateReport> {
    let app = &config.app;
    let site = config.site();
    let categorizer = Categorizer::new(app);

    progress.phase("Discovering sections");
    let discovery = find_sections(&config.source_dir, &app.sections)?;

    let mut report = GenerateReport {
        warnings: discovery.warnings,
        ..GenerateReport::default()
    };

    progress.phase("Generating pages");
    let total = discovery.sections.len();

    for (i, src) in discovery.sections.iter().enumerate() {
        progress.section_started(src.number, &src.name, i + 1, total);

        let (file, content) = read_section_content(&src.path, &app.sections.readme_names)?
            .unwrap_or_else(|| (src.path.clone(), String::new()));

        let section = derive_section(src, file, content, app, &categorizer);
        let path = site.page_path(&section.slug);

        if path.exists() && !force {
            report.skipped.push(site.page_file_name(&section.slug));
            continue;
        }

        let trimmed = section.content.trim();
        let body = if trimmed.is_empty() || trimmed == app.sections.placeholder {
            warn!(number = section.number, "placeholder content, writing heading only");
            format!("# {}\n\n", section.title)
        } else {
            rewrite_asset_links(&section.content)
        };

        let written = write_page(&site, &site.front_matter(&section), &format!("\n{body}"))?;
        progress.page_written(&written);
        report.created.push(written);
    }

    progress.done(&format!("Generated {} pages", report.created.len()));
    info!(
        created = report.created.len(),
        skipped = report.skipped.len(),
        "missing sections generated"
    );

    Ok(report)
}

/// Index of the first unclaimed page belonging to section `number`.
fn match_page(pages: &[SitePage], claimed: &[bool], number: u32, content: &str) -> Option<usize> {
    let by_number = pages
        .iter()
        .enumerate()
        .position(|(i, p)| !claimed[i] && p.front_matter.section_number == Some(number));
    if by_number.is_some() {
        return by_number;
    }

    if content.chars().count() <= MATCH_MIN_CONTENT {
        return None;
    }

    let source = normalized_prefix(content);
    pages.iter().enumerate().position(|(i, p)| {
        if claimed[i] {
            return false;
        }
        let body = normalized_prefix(p.body());
        !body.is_empty() && (body.contains(&source) || source.contains(&body))
    })
}

/// Lowercased text without spaces or newlines, cut to [`MATCH_PREFIX_CHARS`].
fn normalized_prefix(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\r'))
        .flat_map(char::to_lowercase)
        .take(MATCH_PREFIX_CHARS)
        .collect()
}
