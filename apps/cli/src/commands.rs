//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use jekyllize_core::maintenance::{self, NavRebuild};
use jekyllize_core::pipeline::{self, ConvertConfig, ProgressReporter};
use jekyllize_core::repair;
use jekyllize_shared::{
    AppConfig, ConversionReport, Navigation, ValidationReport, init_config, load_config,
    load_config_from, write_default_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// jekyllize: turn numbered Markdown sections into a Jekyll site.
#[derive(Parser)]
#[command(
    name = "jekyllize",
    version,
    about = "Convert numbered Markdown section directories into Jekyll pages and navigation.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.jekyllize/jekyllize.toml).
    #[arg(long, global = true, env = "JEKYLLIZE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert every section into a page and rebuild the navigation.
    Convert {
        /// Directory holding the numbered section directories.
        #[arg(long)]
        source: PathBuf,

        /// Jekyll site root.
        #[arg(long)]
        site: PathBuf,

        /// Write the conversion report as JSON to this file.
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Re-derive titles from the source and patch existing pages.
    FixTitles {
        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        site: PathBuf,
    },

    /// Write pages for sections that have none yet.
    GenerateMissing {
        #[arg(long)]
        source: PathBuf,

        #[arg(long)]
        site: PathBuf,

        /// Regenerate pages that already exist.
        #[arg(long)]
        force: bool,
    },

    /// Rebuild the navigation menu from the pages in docs/.
    RebuildNav {
        #[arg(long)]
        site: PathBuf,
    },

    /// Remove listed and duplicate pages, then rebuild the navigation.
    Dedupe {
        #[arg(long)]
        site: PathBuf,

        /// Report what would be removed without touching any file.
        #[arg(long)]
        dry_run: bool,
    },

    /// Check a generated site for missing pages, assets and links.
    Validate {
        #[arg(long)]
        site: PathBuf,

        #[arg(long)]
        source: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "jekyllize=info",
        1 => "jekyllize=debug",
        _ => "jekyllize=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Convert {
            source,
            site,
            report,
        } => cmd_convert(config_path, source, site, report.as_deref()),
        Command::FixTitles { source, site } => cmd_fix_titles(config_path, source, site),
        Command::GenerateMissing {
            source,
            site,
            force,
        } => cmd_generate_missing(config_path, source, site, force),
        Command::RebuildNav { site } => cmd_rebuild_nav(config_path, &site),
        Command::Dedupe { site, dry_run } => cmd_dedupe(config_path, &site, dry_run),
        Command::Validate { site, source } => cmd_validate(config_path, source, site),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config from `--config` when given, else the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

fn convert_config(path: Option<&Path>, source: PathBuf, site: PathBuf) -> Result<ConvertConfig> {
    if !source.is_dir() {
        return Err(eyre!("source directory '{}' does not exist", source.display()));
    }
    Ok(ConvertConfig {
        source_dir: source,
        site_dir: site,
        app: resolve_config(path)?,
    })
}

fn require_site(site: &Path) -> Result<()> {
    if !site.is_dir() {
        return Err(eyre!("site directory '{}' does not exist", site.display()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_convert(
    config_path: Option<&Path>,
    source: PathBuf,
    site: PathBuf,
    report_path: Option<&Path>,
) -> Result<()> {
    let config = convert_config(config_path, source, site)?;

    info!(
        source = %config.source_dir.display(),
        site = %config.site_dir.display(),
        "converting sections"
    );

    let start = Instant::now();
    let reporter = CliProgress::new();
    let report = pipeline::convert(&config, &reporter)?;

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .map_err(|e| eyre!("cannot write report to '{}': {e}", path.display()))?;
        info!(path = %path.display(), "conversion report written");
    }

    print_conversion(&report);
    println!("  Time: {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

fn cmd_fix_titles(config_path: Option<&Path>, source: PathBuf, site: PathBuf) -> Result<()> {
    require_site(&site)?;
    let config = convert_config(config_path, source, site)?;

    let reporter = CliProgress::new();
    let report = repair::fix_titles(&config, &reporter)?;

    println!();
    println!("  Titles fixed: {}", report.fixed.len());
    for fix in &report.fixed {
        println!("    {:02} {} -> {}", fix.number, fix.file_name, fix.title);
    }
    if !report.unmatched.is_empty() {
        let numbers: Vec<String> = report.unmatched.iter().map(|n| format!("{n:02}")).collect();
        println!("  No page found for sections: {}", numbers.join(", "));
    }
    print_list("Warnings", &report.warnings);
    println!(
        "  Navigation: {}",
        if report.navigation_updated { "updated" } else { "not written" }
    );
    println!();

    Ok(())
}

fn cmd_generate_missing(
    config_path: Option<&Path>,
    source: PathBuf,
    site: PathBuf,
    force: bool,
) -> Result<()> {
    let config = convert_config(config_path, source, site)?;

    let reporter = CliProgress::new();
    let report = repair::generate_missing(&config, force, &reporter)?;

    println!();
    println!("  Pages created: {}", report.created.len());
    for path in &report.created {
        println!("    {}", path.display());
    }
    if !report.skipped.is_empty() {
        println!("  Already present: {}", report.skipped.len());
    }
    print_list("Warnings", &report.warnings);
    println!();

    Ok(())
}

fn cmd_rebuild_nav(config_path: Option<&Path>, site: &Path) -> Result<()> {
    require_site(site)?;
    let app = resolve_config(config_path)?;

    info!(site = %site.display(), "rebuilding navigation");
    let rebuild = maintenance::rebuild_navigation(site, &app)?;

    println!();
    print_rebuild(&rebuild);
    println!();

    Ok(())
}

fn cmd_dedupe(config_path: Option<&Path>, site: &Path, dry_run: bool) -> Result<()> {
    require_site(site)?;
    let app = resolve_config(config_path)?;

    info!(site = %site.display(), dry_run, "removing duplicate pages");
    let report = maintenance::dedupe(site, &app, dry_run)?;

    let verb = if report.dry_run { "Would remove" } else { "Removed" };

    println!();
    for name in &report.removed {
        println!("  {verb}: {name}");
    }
    for name in &report.missing {
        println!("  Not found: {name}");
    }
    for dup in &report.duplicates {
        println!("  {verb} duplicate: {} (same as {})", dup.file_name, dup.kept);
    }
    if report.removed.is_empty() && report.duplicates.is_empty() {
        println!("  No duplicates found");
    }
    print_rebuild(&report.rebuild);
    println!();

    Ok(())
}

fn cmd_validate(config_path: Option<&Path>, source: PathBuf, site: PathBuf) -> Result<()> {
    require_site(&site)?;
    let config = convert_config(config_path, source, site)?;

    let report = pipeline::validate(&config)?;

    println!();
    if report.total_issues() == 0 {
        println!("  No validation issues");
        println!();
        return Ok(());
    }

    print_issues(&report);
    println!();

    Err(eyre!("{} validation issues found", report.total_issues()))
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => {
            write_default_config(p)?;
            p.to_path_buf()
        }
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_conversion(report: &ConversionReport) {
    println!();
    println!("  Conversion complete ({})", report.run_id);
    println!("  Sections processed: {}", report.sections_processed);
    println!("  Categories created: {}", report.categories_created);
    println!(
        "  Navigation:         {}",
        if report.navigation_updated { "updated" } else { "not written" }
    );

    print_list("Errors", &report.errors);
    print_list("Warnings", &report.warnings);

    if report.validation.total_issues() > 0 {
        print_issues(&report.validation);
    }

    println!();
    println!("  Categories:");
    for category in &report.categories {
        println!("    {}: {} sections", category.name, category.count);
        for section in &category.sections {
            println!("      - {}", section.title);
        }
    }
}

/// Issue counts per kind with the first three entries of each.
fn print_issues(report: &ValidationReport) {
    println!();
    println!("  Validation issues ({}):", report.total_issues());
    for (kind, issues) in report.by_kind() {
        if issues.is_empty() {
            continue;
        }
        println!("    {kind}: {}", issues.len());
        for issue in issues.iter().take(3) {
            println!("      - {issue}");
        }
        if issues.len() > 3 {
            println!("      ... and {} more", issues.len() - 3);
        }
    }
}

fn print_rebuild(rebuild: &NavRebuild) {
    print_navigation(&rebuild.navigation);
    print_list("Warnings", &rebuild.warnings);
    match rebuild.outcome {
        Some(outcome) if outcome.is_updated() => println!("  Navigation: updated"),
        Some(_) => println!("  Navigation: not written"),
        None => println!("  Navigation: dry run, config untouched"),
    }
}

fn print_navigation(nav: &Navigation) {
    for group in &nav.groups {
        println!("  {}: {} sections", group.label, group.links.len());
        for link in &group.links {
            println!("    - {}", link.title);
        }
    }
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("  {label} ({}):", items.len());
    for item in items {
        println!("    - {item}");
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn section_started(&self, number: u32, name: &str, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Section {number:02} [{current}/{total}] {name}"
        ));
    }

    fn page_written(&self, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.spinner.println(format!("  wrote {name}"));
    }

    fn done(&self, _summary: &str) {
        self.spinner.finish_and_clear();
    }
}
