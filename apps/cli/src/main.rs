//! jekyllize CLI: migrate numbered Markdown sections into a Jekyll site.
//!
//! Converts section directories into front-matter pages, keeps the
//! `_config.yml` navigation menu in sync, and repairs earlier runs.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
