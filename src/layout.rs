//! Projection of a section hierarchy onto the filesystem.
//!
//! Every section becomes a directory named after its sanitized title. The
//! directory holds a standalone document with the section's pages and one
//! subdirectory per subsection. Failures are recorded per section and never
//! stop the walk.

use crate::config::LayoutConfig;
use crate::document::{DocumentReader, Excerpt};
use crate::error::{DecomposeError, Result};
use crate::tree::Section;
use regex::{NoExpand, Regex};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Name used when nothing of a title survives sanitization.
const FALLBACK_NAME: &str = "section";

/// Characters that may not appear in directory or file names.
pub fn is_illegal_name_char(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control()
}

/// Turn a section title into a directory/file name.
///
/// Drops illegal characters, joins whitespace runs with `separator`, strips
/// trailing dots and truncates to `max_len` characters.
pub fn sanitize_title(title: &str, max_len: usize, separator: char) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .filter(|&c| c.is_whitespace() || !is_illegal_name_char(c))
        .collect();
    let separator = separator.to_string();
    let joined = WHITESPACE_RUN.replace_all(cleaned.trim(), NoExpand(&separator));
    let truncated: String = joined.trim_end_matches('.').chars().take(max_len).collect();
    let name = truncated.trim_end_matches('.');

    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// A section that could not be projected.
#[derive(Debug, Clone)]
pub struct ProjectionFailure {
    pub title: String,
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a projection run.
#[derive(Debug, Clone, Default)]
pub struct ProjectionReport {
    /// Section directories created or reused.
    pub directories: usize,
    /// Documents written.
    pub files: Vec<PathBuf>,
    /// Titles of sections whose page range was unusable.
    pub skipped: Vec<String>,
    /// Per-section I/O failures.
    pub failures: Vec<ProjectionFailure>,
}

impl ProjectionReport {
    /// True when every section produced its document.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failures.is_empty()
    }

    fn fail(&mut self, title: &str, path: &Path, err: &DecomposeError) {
        warn!(title, path = %path.display(), error = %err, "Section projection failed");
        self.failures.push(ProjectionFailure {
            title: title.to_string(),
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
}

/// Writes sections of one document into a directory tree.
pub struct Projector<'a, R: DocumentReader> {
    reader: &'a R,
    layout: &'a LayoutConfig,
}

impl<'a, R: DocumentReader> Projector<'a, R> {
    /// Projector reading pages from `reader`.
    pub fn new(reader: &'a R, layout: &'a LayoutConfig) -> Self {
        Self { reader, layout }
    }

    /// Project `sections` under `base`. Running it again on the same base
    /// reuses the directories and rewrites the same files.
    pub fn project(&self, sections: &[Section], base: &Path) -> ProjectionReport {
        let mut report = ProjectionReport::default();

        if let Err(e) = fs::create_dir_all(base) {
            report.fail("", base, &DecomposeError::io(base, e));
            return report;
        }

        self.project_level(sections, base, &mut report);
        info!(
            base = %base.display(),
            directories = report.directories,
            files = report.files.len(),
            failures = report.failures.len(),
            "Projection finished"
        );
        report
    }

    /// Directory name for a section.
    pub fn name_for(&self, section: &Section) -> String {
        sanitize_title(&section.title, self.layout.max_name_len, self.layout.separator)
    }

    fn project_level(&self, sections: &[Section], base: &Path, report: &mut ProjectionReport) {
        let mut seen = HashSet::new();

        for section in sections {
            let name = self.name_for(section);
            if !seen.insert(name.clone()) {
                warn!(title = %section.title, name = %name, "Sibling sections share a directory name");
            }

            let dir = base.join(&name);
            if let Err(e) = fs::create_dir_all(&dir) {
                report.fail(&section.title, &dir, &DecomposeError::io(&dir, e));
                continue;
            }
            report.directories += 1;

            if section.start_page <= section.end_page {
                let file = dir.join(format!("{}.{}", name, R::EXTENSION));
                match self.write_pages(section, &file) {
                    Ok(true) => report.files.push(file),
                    Ok(false) => {
                        warn!(title = %section.title, "No pages to save; skipping document");
                        report.skipped.push(section.title.clone());
                    }
                    Err(e) => report.fail(&section.title, &file, &e),
                }
            } else {
                warn!(
                    title = %section.title,
                    start_page = section.start_page,
                    end_page = section.end_page,
                    "Invalid page range; skipping document"
                );
                report.skipped.push(section.title.clone());
            }

            self.project_level(&section.subsections, &dir, report);
        }
    }

    fn write_pages(&self, section: &Section, file: &Path) -> Result<bool> {
        let mut excerpt = self
            .reader
            .extract_subrange(section.start_page, section.end_page)?;
        if excerpt.page_count() == 0 {
            return Ok(false);
        }
        excerpt.save(file)?;
        debug!(path = %file.display(), pages = excerpt.page_count(), "Saved section document");
        Ok(true)
    }
}

/// List everything below `base`, relative to it, in sorted order.
pub fn list_layout(base: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(base).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(base).to_path_buf();
            DecomposeError::io(path, e.into())
        })?;
        if let Ok(relative) = entry.path().strip_prefix(base) {
            entries.push(relative.to_path_buf());
        }
    }
    Ok(entries)
}
