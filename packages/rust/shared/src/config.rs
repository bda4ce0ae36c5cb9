//! Application configuration for jekyllize.
//!
//! User config lives at `~/.jekyllize/jekyllize.toml`; `--config` points at
//! another file. Every field has a default, so an absent file (or an absent
//! table) reproduces the built-in CISO-in-a-Box migration rules.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{JekyllizeError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "jekyllize.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".jekyllize";

// ---------------------------------------------------------------------------
// Config structs (matching jekyllize.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Category used when no keyword matches.
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Output site layout.
    #[serde(default)]
    pub site: SiteConfig,

    /// Source section discovery.
    #[serde(default)]
    pub sections: SectionsConfig,

    /// Title clean-up rules.
    #[serde(default)]
    pub titles: TitlesConfig,

    /// Slug special cases.
    #[serde(default)]
    pub slugs: SlugsConfig,

    /// Navigation menu settings.
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Duplicate clean-up settings.
    #[serde(default)]
    pub dedupe: DedupeConfig,

    /// Categories and resources used by title repair and menu rebuilds.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Navigation categories, in menu order.
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,

    /// Hand-curated per-section values that win over derived ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<SectionOverride>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            site: SiteConfig::default(),
            sections: SectionsConfig::default(),
            titles: TitlesConfig::default(),
            slugs: SlugsConfig::default(),
            navigation: NavigationConfig::default(),
            dedupe: DedupeConfig::default(),
            maintenance: MaintenanceConfig::default(),
            categories: default_categories(),
            overrides: Vec::new(),
        }
    }
}

fn default_category() -> String {
    "Getting Started".into()
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Directory (relative to the site root) that receives generated pages.
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// File extension of generated pages.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Site configuration file holding the navigation block.
    #[serde(default = "default_config_file")]
    pub config_file: String,

    /// Jekyll layout written into front matter.
    #[serde(default = "default_layout")]
    pub layout: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            extension: default_extension(),
            config_file: default_config_file(),
            layout: default_layout(),
        }
    }
}

fn default_docs_dir() -> String {
    "docs".into()
}
fn default_extension() -> String {
    "markdown".into()
}
fn default_config_file() -> String {
    "_config.yml".into()
}
fn default_layout() -> String {
    "page".into()
}

/// `[sections]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsConfig {
    /// First section number to look for.
    #[serde(default = "default_first")]
    pub first: u32,

    /// Last section number to look for (inclusive).
    #[serde(default = "default_last")]
    pub last: u32,

    /// Content file names tried in order inside each section directory.
    #[serde(default = "default_readme_names")]
    pub readme_names: Vec<String>,

    /// File extensions copied into `assets/<ext>/`.
    #[serde(default = "default_asset_extensions")]
    pub asset_extensions: Vec<String>,

    /// Content treated as empty when generating missing pages.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            first: default_first(),
            last: default_last(),
            readme_names: default_readme_names(),
            asset_extensions: default_asset_extensions(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_first() -> u32 {
    1
}
fn default_last() -> u32 {
    22
}
fn default_readme_names() -> Vec<String> {
    vec!["Readme.md".into(), "README.md".into(), "readme.md".into()]
}
fn default_asset_extensions() -> Vec<String> {
    ["pdf", "doc", "docx", "xls", "xlsx", "png", "jpg", "jpeg"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_placeholder() -> String {
    "Placeholder".into()
}

/// `[titles]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitlesConfig {
    /// Title used when neither content nor directory name yields one.
    #[serde(default = "default_untitled")]
    pub untitled: String,

    /// Truncated suffixes repaired after cleaning; first match wins.
    #[serde(default = "default_fixups")]
    pub fixups: Vec<TitleFixup>,
}

impl Default for TitlesConfig {
    fn default() -> Self {
        Self {
            untitled: default_untitled(),
            fixups: default_fixups(),
        }
    }
}

/// A truncated title suffix and its full form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleFixup {
    pub suffix: String,
    pub replacement: String,
}

fn default_untitled() -> String {
    "Untitled Section".into()
}
fn default_fixups() -> Vec<TitleFixup> {
    [
        ("Manageme", "Management"),
        ("Cont", "Controls"),
        ("Ove", "Overview"),
        ("Guid", "Guide"),
        ("Stra", "Strategy"),
        ("Prog", "Program"),
        ("Fir", "Firewall"),
    ]
    .into_iter()
    .map(|(suffix, replacement)| TitleFixup {
        suffix: suffix.into(),
        replacement: replacement.into(),
    })
    .collect()
}

/// `[slugs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugsConfig {
    /// Exact slug → replacement slug.
    #[serde(default = "default_slug_overrides")]
    pub overrides: BTreeMap<String, String>,
}

impl Default for SlugsConfig {
    fn default() -> Self {
        Self {
            overrides: default_slug_overrides(),
        }
    }
}

fn default_slug_overrides() -> BTreeMap<String, String> {
    [
        ("secops", "security-operations---soc"),
        ("ir", "response---ir"),
        ("bcp", "business-continuity-planning---bcp"),
        ("dr", "disaster-recovery---dr"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// `[navigation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Label of the trailing resources group.
    #[serde(default = "default_resources_label")]
    pub resources_label: String,

    /// Links listed under the resources group.
    #[serde(default = "default_resources")]
    pub resources: Vec<NavResource>,

    /// Whether repaired menus use `/slug/` instead of `/slug`.
    #[serde(default = "default_true")]
    pub repair_trailing_slash: bool,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            resources_label: default_resources_label(),
            resources: default_resources(),
            repair_trailing_slash: true,
        }
    }
}

/// A fixed link in the resources group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavResource {
    pub label: String,
    pub url: String,
}

fn default_resources_label() -> String {
    "Resources".into()
}
fn default_resources() -> Vec<NavResource> {
    vec![
        NavResource {
            label: "Contributing".into(),
            url: "/contributing".into(),
        },
        NavResource {
            label: "GitHub Repo".into(),
            url: "https://github.com/CroodSolutions/CISOinaBox".into(),
        },
    ]
}
fn default_true() -> bool {
    true
}

/// `[dedupe]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupeConfig {
    /// Page file names always removed by `dedupe`.
    #[serde(default)]
    pub remove: Vec<String>,
}

/// `[[categories]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Display name, also written into `nav_category`.
    pub name: String,
    /// Lowercase keywords matched against titles and content.
    pub keywords: Vec<String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

fn default_categories() -> Vec<CategoryConfig> {
    let table: [(&str, &[&str], &str); 6] = [
        (
            "Getting Started",
            &["getting started", "overview", "introduction"],
            "Basic introduction and getting started guide",
        ),
        (
            "Risk & Threat Management",
            &["risk", "threat", "adversary", "attack surface"],
            "Risk assessment and threat intelligence",
        ),
        (
            "Security Controls",
            &[
                "cis18",
                "controls",
                "architecture",
                "engineering",
                "product security",
                "business process",
            ],
            "Technical security controls and architecture",
        ),
        (
            "Security Program",
            &[
                "management",
                "leadership",
                "awareness",
                "operations",
                "incident response",
            ],
            "Security program management and operations",
        ),
        (
            "Compliance & Resilience",
            &[
                "governance",
                "compliance",
                "continuity",
                "disaster recovery",
                "vulnerability",
            ],
            "Compliance, governance, and resilience planning",
        ),
        (
            "Advanced Topics",
            &["frameworks", "careers", "cyber insurance", "resources"],
            "Advanced topics and career development",
        ),
    ];

    category_table(&table)
}

fn category_table(table: &[(&str, &[&str], &str)]) -> Vec<CategoryConfig> {
    table
        .iter()
        .map(|(name, keywords, description)| CategoryConfig {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            description: description.to_string(),
        })
        .collect()
}

/// `[maintenance]` section.
///
/// Title repair and menu rebuilds run against sites that predate the
/// `Advanced Topics` group, so they keep a five-category table of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Categories matched against page titles, in menu order.
    #[serde(default = "default_maintenance_categories")]
    pub categories: Vec<CategoryConfig>,

    /// Category for unmatched titles in `fix-titles`; a page already recorded
    /// under it stays there in `rebuild-nav`.
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Category for pages whose title matches nothing in `rebuild-nav`.
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,

    /// Label of the resources group written by `rebuild-nav` and `dedupe`.
    #[serde(default = "default_maintenance_resources_label")]
    pub resources_label: String,

    /// Links of that resources group.
    #[serde(default = "default_maintenance_resources")]
    pub resources: Vec<NavResource>,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            categories: default_maintenance_categories(),
            default_category: default_category(),
            fallback_category: default_fallback_category(),
            resources_label: default_maintenance_resources_label(),
            resources: default_maintenance_resources(),
        }
    }
}

impl MaintenanceConfig {
    fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }
}

fn default_maintenance_categories() -> Vec<CategoryConfig> {
    let table: [(&str, &[&str], &str); 5] = [
        (
            "Getting Started",
            &["getting started", "overview"],
            "Basic introduction and getting started guide",
        ),
        (
            "Risk & Threat Management",
            &["risk", "threat", "adversary", "attack surface"],
            "Risk assessment and threat intelligence",
        ),
        (
            "Security Controls",
            &[
                "cis18",
                "controls",
                "architecture",
                "engineering",
                "product security",
                "business process",
            ],
            "Technical security controls and architecture",
        ),
        (
            "Security Program",
            &[
                "management",
                "leadership",
                "identity",
                "awareness",
                "operations",
                "incident response",
                "careers",
            ],
            "Security program management and operations",
        ),
        (
            "Compliance & Resilience",
            &[
                "governance",
                "compliance",
                "continuity",
                "disaster recovery",
                "vulnerability",
                "frameworks",
                "cyber insurance",
                "resources",
            ],
            "Compliance, governance, resilience and further resources",
        ),
    ];

    category_table(&table)
}

fn default_fallback_category() -> String {
    "Compliance & Resilience".into()
}
fn default_maintenance_resources_label() -> String {
    "External Resources".into()
}
fn default_maintenance_resources() -> Vec<NavResource> {
    vec![NavResource {
        label: "GitHub Repo".into(),
        url: "https://github.com/CroodSolutions/CISOinaBox".into(),
    }]
}

/// `[[overrides]]` entry: curated values for one section number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOverride {
    pub number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl AppConfig {
    /// Look up the curated override for a section number.
    pub fn override_for(&self, number: u32) -> Option<&SectionOverride> {
        self.overrides.iter().find(|o| o.number == number)
    }

    /// Whether `name` is one of the configured categories.
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }

    /// Navigation settings for `rebuild-nav` and `dedupe`: the maintenance
    /// resources group, everything else from `[navigation]`.
    pub fn maintenance_navigation(&self) -> NavigationConfig {
        NavigationConfig {
            resources_label: self.maintenance.resources_label.clone(),
            resources: self.maintenance.resources.clone(),
            ..self.navigation.clone()
        }
    }

    /// Check cross-field consistency after loading.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(JekyllizeError::config("at least one category is required"));
        }
        if !self.has_category(&self.default_category) {
            return Err(JekyllizeError::config(format!(
                "default_category '{}' is not a configured category",
                self.default_category
            )));
        }
        if self.sections.first > self.sections.last {
            return Err(JekyllizeError::config(format!(
                "section range {}..={} is empty",
                self.sections.first, self.sections.last
            )));
        }
        if self.sections.readme_names.is_empty() {
            return Err(JekyllizeError::config("sections.readme_names is empty"));
        }
        let maintenance = &self.maintenance;
        if maintenance.categories.is_empty() {
            return Err(JekyllizeError::config(
                "at least one maintenance category is required",
            ));
        }
        for name in [&maintenance.default_category, &maintenance.fallback_category] {
            if !maintenance.has_category(name) {
                return Err(JekyllizeError::config(format!(
                    "maintenance category '{name}' is not in maintenance.categories"
                )));
            }
        }
        for o in &self.overrides {
            if let Some(category) = &o.category {
                if !self.has_category(category) {
                    return Err(JekyllizeError::config(format!(
                        "override for section {} uses unknown category '{category}'",
                        o.number
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.jekyllize/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| JekyllizeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.jekyllize/jekyllize.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| JekyllizeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        JekyllizeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_dir()?.join(CONFIG_FILE_NAME);
    write_default_config(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| JekyllizeError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| JekyllizeError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| JekyllizeError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("docs_dir"));
        assert!(toml_str.contains("Risk & Threat Management"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.sections.last, 22);
        assert_eq!(parsed.categories.len(), 6);
        assert_eq!(parsed.slugs.overrides["secops"], "security-operations---soc");
        parsed.validate().expect("defaults are valid");
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert_eq!(config.default_category, "Getting Started");
        assert_eq!(config.site.extension, "markdown");
        assert_eq!(config.titles.fixups.len(), 7);
        assert_eq!(config.sections.readme_names[0], "Readme.md");
    }

    #[test]
    fn config_with_overrides() {
        let toml_str = r#"
[sections]
first = 1
last = 3

[[overrides]]
number = 16
title = "Business Continuity Planning"
category = "Compliance & Resilience"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sections.last, 3);
        let o = config.override_for(16).expect("override present");
        assert_eq!(o.title.as_deref(), Some("Business Continuity Planning"));
        assert!(o.slug.is_none());
        config.validate().expect("valid");
    }

    #[test]
    fn validate_rejects_unknown_default_category() {
        let config = AppConfig {
            default_category: "Nowhere".into(),
            ..AppConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Nowhere"));
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let mut config = AppConfig::default();
        config.sections.first = 5;
        config.sections.last = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_override_with_unknown_category() {
        let mut config = AppConfig::default();
        config.overrides.push(SectionOverride {
            number: 3,
            category: Some("Misc".into()),
            ..SectionOverride::default()
        });
        assert!(config.validate().unwrap_err().to_string().contains("Misc"));
    }

    #[test]
    fn written_defaults_load_back() {
        let dir = std::env::temp_dir().join(format!("jk-config-{}", uuid::Uuid::now_v7()));
        let path = dir.join("nested").join("jekyllize.toml");

        write_default_config(&path).expect("write defaults");
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.navigation.resources.len(), 2);
        assert!(config.overrides.is_empty());
        assert_eq!(config.maintenance.categories.len(), 5);
        assert_eq!(config.maintenance.fallback_category, "Compliance & Resilience");
    }

    #[test]
    fn maintenance_table_folds_advanced_topics_away() {
        let config = AppConfig::default();
        let keywords = |name: &str| {
            config
                .maintenance
                .categories
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.keywords.clone())
                .unwrap_or_default()
        };
        assert!(!config.maintenance.has_category("Advanced Topics"));
        assert!(keywords("Security Program").contains(&"careers".to_string()));
        assert!(keywords("Compliance & Resilience").contains(&"cyber insurance".to_string()));
        assert!(!keywords("Getting Started").contains(&"introduction".to_string()));
    }

    #[test]
    fn convert_table_has_no_identity_keyword() {
        let config = AppConfig::default();
        assert!(
            config
                .categories
                .iter()
                .all(|c| !c.keywords.iter().any(|k| k == "identity"))
        );
    }

    #[test]
    fn maintenance_navigation_swaps_resources_only() {
        let config = AppConfig::default();
        let nav = config.maintenance_navigation();
        assert_eq!(nav.resources_label, "External Resources");
        assert_eq!(nav.resources.len(), 1);
        assert_eq!(nav.resources[0].label, "GitHub Repo");
        assert!(nav.repair_trailing_slash);
    }

    #[test]
    fn validate_rejects_fallback_outside_maintenance_table() {
        let mut config = AppConfig::default();
        config.maintenance.fallback_category = "Advanced Topics".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Advanced Topics"));
    }
}
