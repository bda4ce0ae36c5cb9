//! Source tree scanning: numbered section directories and their content files.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use jekyllize_shared::{JekyllizeError, Result, SectionsConfig, SourceSection};

/// Sections found in a source tree, plus warnings for gaps in the numbering.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Found sections, ordered by number.
    pub sections: Vec<SourceSection>,
    /// One `Section NN not found` entry per missing number.
    pub warnings: Vec<String>,
}

/// Find the numbered section directories under `source_dir`.
///
/// For each number in the configured range the first directory named
/// `"NN - *"` (zero-padded) is used, else `"N - *"`. Candidates are compared in
/// sorted name order so the choice is stable across platforms.
#[instrument(skip(config), fields(source = %source_dir.display()))]
pub fn find_sections(source_dir: &Path, config: &SectionsConfig) -> Result<Discovery> {
    let entries =
        std::fs::read_dir(source_dir).map_err(|e| JekyllizeError::io(source_dir, e))?;

    let mut dirs: Vec<(String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| JekyllizeError::io(source_dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut discovery = Discovery::default();

    for number in config.first..=config.last {
        let prefixes = [format!("{number:02} - "), format!("{number} - ")];

        let found = prefixes.iter().find_map(|prefix| {
            dirs.iter().find(|(name, _)| name.starts_with(prefix.as_str()))
        });

        match found {
            Some((name, path)) => {
                debug!(number, name = %name, "found section directory");
                discovery.sections.push(SourceSection {
                    number,
                    path: path.clone(),
                    name: name.clone(),
                });
            }
            None => {
                warn!(number, "section directory not found");
                discovery
                    .warnings
                    .push(format!("Section {number:02} not found"));
            }
        }
    }

    Ok(discovery)
}

/// First existing content file among `readme_names` inside `dir`.
pub fn find_content_file(dir: &Path, readme_names: &[String]) -> Option<PathBuf> {
    readme_names
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Read a section's content file, if it has one.
pub fn read_section_content(
    dir: &Path,
    readme_names: &[String],
) -> Result<Option<(PathBuf, String)>> {
    let Some(path) = find_content_file(dir, readme_names) else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(&path).map_err(|e| JekyllizeError::io(&path, e))?;
    Ok(Some((path, content)))
}
