//! Core domain types for a documentation migration run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one migration run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// A numbered source directory found by discovery (e.g. `07 - Product Security`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSection {
    /// Section number parsed from the directory prefix.
    pub number: u32,
    /// Absolute or source-relative directory path.
    pub path: PathBuf,
    /// Directory name, as found on disk.
    pub name: String,
}

/// A fully derived section, ready to be written as a site page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub number: u32,
    /// Source directory name.
    pub dir_name: String,
    /// Title as extracted, before clean-up.
    pub raw_title: String,
    /// Display title.
    pub title: String,
    /// URL slug; also the page file stem.
    pub slug: String,
    /// Navigation category name.
    pub category: String,
    /// File the content was read from.
    pub source_file: PathBuf,
    /// Raw Markdown content of the source file.
    #[serde(skip)]
    pub content: String,
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// The Jekyll front matter block written at the top of every generated page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub layout: String,
    pub title: String,
    /// Permalink without the leading `/`.
    pub permalink: String,
    pub nav_category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_number: Option<u32>,
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// A single `- "Title": "/url"` menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub title: String,
    pub url: String,
}

/// One labelled group of menu entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavGroup {
    pub label: String,
    pub links: Vec<NavLink>,
}

/// Root structure for the `navbar-links:` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    /// Category groups in menu order (empty categories omitted).
    pub groups: Vec<NavGroup>,
    /// Trailing group of fixed links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<NavGroup>,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Problems found when validating a generated site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub missing_files: Vec<String>,
    pub broken_links: Vec<String>,
    pub missing_assets: Vec<String>,
}

impl ValidationReport {
    /// Total number of issues across all kinds.
    pub fn total_issues(&self) -> usize {
        self.missing_files.len() + self.broken_links.len() + self.missing_assets.len()
    }

    /// Issues grouped by kind, in a stable display order.
    pub fn by_kind(&self) -> [(&'static str, &[String]); 3] {
        [
            ("missing_files", &self.missing_files),
            ("broken_links", &self.broken_links),
            ("missing_assets", &self.missing_assets),
        ]
    }
}

/// Short description of a section inside a category summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub number: u32,
    pub title: String,
    pub slug: String,
}

/// Sections assigned to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub name: String,
    pub count: usize,
    pub sections: Vec<SectionSummary>,
}

/// Outcome of a full conversion run, serialized to `--report` as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub sections_processed: usize,
    pub categories_created: usize,
    pub navigation_updated: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub validation: ValidationReport,
    pub sections: Vec<Section>,
    pub categories: Vec<CategorySummary>,
}
