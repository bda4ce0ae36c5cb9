//! Shared types, error model, and configuration for jekyllize.
//!
//! This crate is the foundation depended on by all other jekyllize crates.
//! It provides:
//! - [`JekyllizeError`], the unified error type
//! - Domain records ([`Section`], [`FrontMatter`], [`Navigation`], reports)
//! - Configuration ([`AppConfig`] and config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CategoryConfig, DedupeConfig, MaintenanceConfig, NavResource, NavigationConfig,
    SectionOverride, SectionsConfig, SiteConfig, SlugsConfig, TitleFixup, TitlesConfig,
    config_dir, config_file_path, init_config, load_config, load_config_from,
    write_default_config,
};
pub use error::{JekyllizeError, Result};
pub use types::{
    CategorySummary, ConversionReport, FrontMatter, NavGroup, NavLink, Navigation, RunId,
    Section, SectionSummary, SourceSection, ValidationReport,
};
