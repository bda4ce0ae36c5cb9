//! Jekyll site writer and reader.
//!
//! Writes generated pages and copied assets into the site directory, reads
//! pages back for maintenance passes, and validates the result.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use jekyllize_markdown::{
    LinkTarget, asset_links, decode_spaces, internal_links, parse_front_matter,
    render_front_matter, rewrite_asset_links, rewrite_section_links, split_front_matter,
};
use jekyllize_shared::{
    FrontMatter, JekyllizeError, Result, Section, SiteConfig, ValidationReport,
};

/// Resolved paths of a Jekyll site.
///
/// ```text
/// <root>/
/// ├── _config.yml
/// ├── docs/
/// │   ├── getting-started.markdown
/// │   └── ...
/// └── assets/
///     ├── pdf/
///     └── xlsx/
/// ```
#[derive(Debug, Clone)]
pub struct SiteLayout {
    pub root: PathBuf,
    docs_dir: String,
    extension: String,
    config_file: String,
    layout: String,
}

impl SiteLayout {
    pub fn new(root: impl Into<PathBuf>, config: &SiteConfig) -> Self {
        Self {
            root: root.into(),
            docs_dir: config.docs_dir.clone(),
            extension: config.extension.clone(),
            config_file: config.config_file.clone(),
            layout: config.layout.clone(),
        }
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.root.join(&self.docs_dir)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(&self.config_file)
    }

    /// `<docs>/<slug>.<ext>`
    pub fn page_path(&self, slug: &str) -> PathBuf {
        self.docs_dir().join(self.page_file_name(slug))
    }

    pub fn page_file_name(&self, slug: &str) -> String {
        format!("{slug}.{}", self.extension)
    }

    /// Layout name written into front matter.
    pub fn layout(&self) -> &str {
        &self.layout
    }

    /// Front matter for a derived section.
    pub fn front_matter(&self, section: &Section) -> FrontMatter {
        FrontMatter {
            layout: self.layout.clone(),
            title: section.title.clone(),
            permalink: section.slug.clone(),
            nav_category: section.category.clone(),
            section_number: Some(section.number),
        }
    }

    fn is_page(&self, path: &Path) -> bool {
        path.is_file() && path.extension().is_some_and(|e| e == self.extension.as_str())
    }
}

/// A generated page read back from the docs directory.
#[derive(Debug, Clone)]
pub struct SitePage {
    pub path: PathBuf,
    pub file_name: String,
    /// Permalink from front matter, else the file stem.
    pub slug: String,
    pub front_matter: FrontMatter,
    /// Full file text, front matter included.
    pub text: String,
    /// Byte offset where the body starts in `text`.
    body_start: usize,
}

impl SitePage {
    pub fn body(&self) -> &str {
        &self.text[self.body_start..]
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write a converted section: front matter followed by its content, with
/// document links pointed at `/assets/`.
#[instrument(skip_all, fields(slug = %section.slug))]
pub fn write_section_page(site: &SiteLayout, section: &Section) -> Result<PathBuf> {
    let body = rewrite_asset_links(&section.content);
    write_page(site, &site.front_matter(section), &body)
}

/// Write `<docs>/<permalink>.<ext>` from a front matter block and a body.
pub fn write_page(site: &SiteLayout, front_matter: &FrontMatter, body: &str) -> Result<PathBuf> {
    let docs_dir = site.docs_dir();
    std::fs::create_dir_all(&docs_dir).map_err(|e| JekyllizeError::io(&docs_dir, e))?;

    let path = site.page_path(&front_matter.permalink);
    let text = format!("{}{body}", render_front_matter(front_matter));
    std::fs::write(&path, text).map_err(|e| JekyllizeError::io(&path, e))?;

    debug!(path = %path.display(), title = %front_matter.title, "wrote page");
    Ok(path)
}

/// Copy every file with one of `extensions` from a section directory to
/// `<site>/assets/<ext>/`. Individual copy failures are returned as warnings.
#[instrument(skip(site, extensions), fields(dir = %section_dir.display()))]
pub fn copy_section_assets(
    section_dir: &Path,
    site: &SiteLayout,
    extensions: &[String],
) -> Result<Vec<String>> {
    let entries =
        std::fs::read_dir(section_dir).map_err(|e| JekyllizeError::io(section_dir, e))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| JekyllizeError::io(section_dir, e))?;
        files.push(entry.path());
    }
    files.sort();

    let mut warnings = Vec::new();
    for ext in extensions {
        for file in files
            .iter()
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == ext.as_str()))
        {
            let target_dir = site.assets_dir().join(ext);
            let Some(name) = file.file_name() else {
                continue;
            };
            let target = target_dir.join(name);

            let copied = std::fs::create_dir_all(&target_dir)
                .and_then(|_| std::fs::copy(file, &target));
            match copied {
                Ok(bytes) => debug!(asset = %target.display(), bytes, "copied asset"),
                Err(e) => {
                    warn!(asset = %file.display(), error = %e, "asset copy failed");
                    warnings.push(format!("Could not copy asset {}: {e}", file.display()));
                }
            }
        }
    }

    Ok(warnings)
}

/// Rewrite links between sections in every written page. A page never links
/// to itself. Returns the number of pages that changed.
#[instrument(skip_all, fields(sections = sections.len()))]
pub fn update_cross_links(site: &SiteLayout, sections: &[Section]) -> Result<usize> {
    let targets: Vec<LinkTarget> = sections.iter().map(LinkTarget::from).collect();
    let mut changed = 0;

    for section in sections {
        let path = site.page_path(&section.slug);
        if !path.exists() {
            continue;
        }

        let text = std::fs::read_to_string(&path).map_err(|e| JekyllizeError::io(&path, e))?;
        let (head, body) = match split_front_matter(&text) {
            Some((block, body)) => (format!("---\n{block}---\n"), body),
            None => (String::new(), text.as_str()),
        };

        let others: Vec<LinkTarget> = targets
            .iter()
            .filter(|t| t.slug != section.slug)
            .cloned()
            .collect();
        let rewritten = rewrite_section_links(body, &others);
        if rewritten != body {
            std::fs::write(&path, format!("{head}{rewritten}"))
                .map_err(|e| JekyllizeError::io(&path, e))?;
            changed += 1;
        }
    }

    info!(changed, "cross-section links updated");
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Page files in the docs directory, sorted by name.
pub fn page_files(site: &SiteLayout) -> Result<Vec<PathBuf>> {
    let docs_dir = site.docs_dir();
    if !docs_dir.exists() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(&docs_dir).map_err(|e| JekyllizeError::io(&docs_dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| JekyllizeError::io(&docs_dir, e))?.path();
        if site.is_page(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read and parse every generated page.
///
/// Pages without a readable front matter block are skipped and reported in
/// the returned warnings.
#[instrument(skip_all, fields(docs = %site.docs_dir().display()))]
pub fn load_pages(site: &SiteLayout, default_category: &str) -> Result<(Vec<SitePage>, Vec<String>)> {
    let mut pages = Vec::new();
    let mut warnings = Vec::new();

    for path in page_files(site)? {
        let text = std::fs::read_to_string(&path).map_err(|e| JekyllizeError::io(&path, e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some((block, body)) = split_front_matter(&text) else {
            warnings.push(format!("{file_name} has no front matter"));
            continue;
        };
        let body_start = text.len() - body.len();

        let front_matter = match parse_front_matter(block, default_category) {
            Ok(fm) => fm,
            Err(e) => {
                warnings.push(format!("{file_name}: {e}"));
                continue;
            }
        };

        let slug = if front_matter.permalink.is_empty() {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            front_matter.permalink.clone()
        };

        pages.push(SitePage {
            path,
            file_name,
            slug,
            front_matter,
            text,
            body_start,
        });
    }

    debug!(pages = pages.len(), skipped = warnings.len(), "pages loaded");
    Ok((pages, warnings))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check the generated site for missing pages, missing assets and internal
/// links that point nowhere.
#[instrument(skip_all, fields(root = %site.root.display()))]
pub fn validate_site(site: &SiteLayout, sections: &[Section]) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    for section in sections {
        let path = site.page_path(&section.slug);
        if !path.exists() {
            report.missing_files.push(path.display().to_string());
        }
    }

    let files = page_files(site)?;
    let mut permalinks: HashSet<String> = sections.iter().map(|s| s.slug.clone()).collect();
    let mut texts = Vec::with_capacity(files.len());

    for path in &files {
        let text = std::fs::read_to_string(path).map_err(|e| JekyllizeError::io(path, e))?;
        if let Some(stem) = path.file_stem() {
            permalinks.insert(stem.to_string_lossy().into_owned());
        }
        if let Some(fm) = split_front_matter(&text)
            .and_then(|(block, _)| parse_front_matter(block, "").ok())
        {
            if !fm.permalink.is_empty() {
                permalinks.insert(fm.permalink);
            }
        }
        texts.push(text);
    }

    for (path, text) in files.iter().zip(&texts) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for (_, asset_path) in asset_links(text) {
            let target = site.assets_dir().join(decode_spaces(strip_fragment(&asset_path)));
            if !target.exists() {
                report
                    .missing_assets
                    .push(format!("{asset_path} referenced in {file_name}"));
            }
        }

        for href in internal_links(text) {
            let target = strip_fragment(&href).trim_matches('/');
            if target.is_empty()
                || permalinks.contains(target)
                || site.root.join(decode_spaces(target)).exists()
            {
                continue;
            }
            report
                .broken_links
                .push(format!("{href} referenced in {file_name}"));
        }
    }

    info!(issues = report.total_issues(), "site validation complete");
    Ok(report)
}

/// Drop `#anchor` and `?query` parts of a link target.
fn strip_fragment(href: &str) -> &str {
    let end = href.find(['#', '?']).unwrap_or(href.len());
    &href[..end]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
