//! End-to-end `convert` pipeline: source tree → sections → pages → navigation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument, warn};

use jekyllize_markdown::{derive_title, slugify};
use jekyllize_shared::{
    AppConfig, CategorySummary, ConversionReport, JekyllizeError, Result, RunId, Section,
    SectionSummary, SourceSection, ValidationReport,
};

use crate::categorize::Categorizer;
use crate::discovery::{find_sections, read_section_content};
use crate::navigation::{NavEntry, NavOrder, build_navigation, update_site_config};
use crate::site::{
    SiteLayout, copy_section_assets, update_cross_links, validate_site, write_section_page,
};

/// Paths and settings for a run that reads a source tree and writes a site.
///
/// Shared by `convert`, the repair passes and source-aware validation.
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Directory holding the numbered section directories.
    pub source_dir: PathBuf,
    /// Jekyll site root (receives `docs/`, `assets/`, owns `_config.yml`).
    pub site_dir: PathBuf,
    pub app: AppConfig,
}

impl ConvertConfig {
    pub fn site(&self) -> SiteLayout {
        SiteLayout::new(&self.site_dir, &self.app.site)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before a section is processed.
    fn section_started(&self, number: u32, name: &str, current: usize, total: usize);
    /// Called after a page file is written.
    fn page_written(&self, path: &Path);
    /// Called when the operation completes.
    fn done(&self, summary: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn section_started(&self, _number: u32, _name: &str, _current: usize, _total: usize) {}
    fn page_written(&self, _path: &Path) {}
    fn done(&self, _summary: &str) {}
}

/// Sections read and derived from a source tree.
#[derive(Debug, Default)]
pub struct CollectedSections {
    /// Sections paired with their source directory.
    pub sections: Vec<(SourceSection, Section)>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Discover and derive every section under `source_dir`.
///
/// A section without a content file is recorded as an error and skipped; the
/// rest of the run continues.
#[instrument(skip(app), fields(source = %source_dir.display()))]
pub fn collect_sections(source_dir: &Path, app: &AppConfig) -> Result<CollectedSections> {
    let discovery = find_sections(source_dir, &app.sections)?;
    let categorizer = Categorizer::new(app);

    let mut collected = CollectedSections {
        warnings: discovery.warnings,
        ..CollectedSections::default()
    };

    for src in discovery.sections {
        match read_section_content(&src.path, &app.sections.readme_names) {
            Ok(Some((file, content))) => {
                let section = derive_section(&src, file, content, app, &categorizer);
                collected.sections.push((src, section));
            }
            Ok(None) => {
                warn!(number = src.number, "no content file");
                collected
                    .errors
                    .push(format!("No content file found in {}", src.path.display()));
            }
            Err(e) => collected.errors.push(e.to_string()),
        }
    }

    let mut seen: HashMap<&str, u32> = HashMap::new();
    for (_, section) in &collected.sections {
        if let Some(first) = seen.insert(&section.slug, section.number) {
            collected.warnings.push(format!(
                "Sections {first:02} and {:02} share the slug '{}'",
                section.number, section.slug
            ));
        }
    }

    Ok(collected)
}

/// Derive title, slug and category for one section.
///
/// A configured override for the section number wins over each derived value.
pub(crate) fn derive_section(
    src: &SourceSection,
    source_file: PathBuf,
    content: String,
    app: &AppConfig,
    categorizer: &Categorizer<'_>,
) -> Section {
    let derived = derive_title(&content, &src.name, &app.titles);
    let overrides = app.override_for(src.number);

    let title = overrides
        .and_then(|o| o.title.clone())
        .unwrap_or(derived.title);

    let slug = overrides
        .and_then(|o| o.slug.clone())
        .unwrap_or_else(|| slugify(&title, &app.slugs.overrides));
    let slug = if slug.is_empty() {
        format!("section-{:02}", src.number)
    } else {
        slug
    };

    let category = overrides
        .and_then(|o| o.category.clone())
        .unwrap_or_else(|| categorizer.scored(&title, &content).to_string());

    Section {
        number: src.number,
        dir_name: src.name.clone(),
        raw_title: derived.raw,
        title,
        slug,
        category,
        source_file,
        content,
    }
}

/// Run the full conversion.
///
/// 1. Discover sections
/// 2. Derive and write one page per section, copying its assets
/// 3. Rewrite cross-section links
/// 4. Build the navigation menu and splice it into the site config
/// 5. Validate the generated site
#[instrument(skip_all, fields(source = %config.source_dir.display(), site = %config.site_dir.display()))]
pub fn convert(config: &ConvertConfig, progress: &dyn ProgressReporter) -> Result<ConversionReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    let app = &config.app;
    let site = config.site();

    info!(%run_id, "starting conversion");

    // --- Phase 1: Discovery ---
    progress.phase("Discovering sections");
    let collected = collect_sections(&config.source_dir, app)?;
    if collected.sections.is_empty() && collected.errors.is_empty() {
        return Err(JekyllizeError::validation(format!(
            "no numbered section directories found in {}",
            config.source_dir.display()
        )));
    }
    let mut errors = collected.errors;
    let mut warnings = collected.warnings;

    // --- Phase 2: Pages and assets ---
    progress.phase("Writing pages");
    let total = collected.sections.len();
    let mut sections = Vec::with_capacity(total);

    for (i, (src, section)) in collected.sections.into_iter().enumerate() {
        progress.section_started(section.number, &section.title, i + 1, total);

        match copy_section_assets(&src.path, &site, &app.sections.asset_extensions) {
            Ok(asset_warnings) => warnings.extend(asset_warnings),
            Err(e) => warnings.push(format!("Could not copy assets for {}: {e}", src.name)),
        }

        match write_section_page(&site, &section) {
            Ok(path) => {
                progress.page_written(&path);
                sections.push(section);
            }
            Err(e) => {
                warn!(number = section.number, error = %e, "page write failed");
                errors.push(format!("Error processing {}: {e}", src.name));
            }
        }
    }

    // --- Phase 3: Cross links ---
    progress.phase("Updating cross-section links");
    update_cross_links(&site, &sections)?;

    // --- Phase 4: Navigation ---
    progress.phase("Building navigation");
    let entries: Vec<NavEntry> = sections.iter().map(NavEntry::from).collect();
    let nav = build_navigation(
        &entries,
        &app.categories,
        NavOrder::Number,
        &app.navigation,
        false,
    );
    let config_path = site.config_path();
    let outcome = update_site_config(&config_path, &nav)?;
    warnings.extend(outcome.warning(&config_path));

    // --- Phase 5: Validation ---
    progress.phase("Validating site");
    let validation = validate_site(&site, &sections)?;

    let categories = summarize_categories(app, &sections);

    let report = ConversionReport {
        run_id,
        generated_at: chrono::Utc::now(),
        sections_processed: sections.len(),
        categories_created: categories.len(),
        navigation_updated: outcome.is_updated(),
        errors,
        warnings,
        validation,
        sections,
        categories,
    };

    progress.done(&format!(
        "Converted {} sections into {} categories",
        report.sections_processed, report.categories_created
    ));

    info!(
        run_id = %report.run_id,
        sections = report.sections_processed,
        errors = report.errors.len(),
        issues = report.validation.total_issues(),
        elapsed_ms = start.elapsed().as_millis(),
        "conversion complete"
    );

    Ok(report)
}

/// Validate an existing site against the sections derived from `source_dir`.
#[instrument(skip_all, fields(site = %config.site_dir.display()))]
pub fn validate(config: &ConvertConfig) -> Result<ValidationReport> {
    let collected = collect_sections(&config.source_dir, &config.app)?;
    let sections: Vec<Section> = collected.sections.into_iter().map(|(_, s)| s).collect();
    validate_site(&config.site(), &sections)
}

/// Non-empty categories in configured order, each with its sections by number.
fn summarize_categories(app: &AppConfig, sections: &[Section]) -> Vec<CategorySummary> {
    app.categories
        .iter()
        .filter_map(|category| {
            let mut members: Vec<&Section> = sections
                .iter()
                .filter(|s| s.category == category.name)
                .collect();
            if members.is_empty() {
                return None;
            }
            members.sort_by_key(|s| s.number);

            Some(CategorySummary {
                name: category.name.clone(),
                count: members.len(),
                sections: members
                    .iter()
                    .map(|s| SectionSummary {
                        number: s.number,
                        title: s.title.clone(),
                        slug: s.slug.clone(),
                    })
                    .collect(),
            })
        })
        .collect()
}
