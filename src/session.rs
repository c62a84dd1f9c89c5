//! Decomposition session.
//!
//! A session owns one opened document and the state a front-end builds up
//! around it: the loaded hierarchy and the chosen output directory. The
//! three front-end commands map onto [`Session::load`],
//! [`Session::select_output`] and [`Session::commit`].

use crate::config::Config;
use crate::document::{DocumentReader, PdfDocument};
use crate::error::{DecomposeError, Result};
use crate::layout::{ProjectionReport, Projector};
use crate::persistence::{record_path, save_record_with_format};
use crate::text::{TextFailure, attach_text, section_text};
use crate::tree::Hierarchy;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary of a commit.
#[derive(Debug)]
pub struct CommitReport {
    /// Leaves that received text.
    pub leaves_with_text: usize,
    /// Leaves whose text could not be extracted.
    pub text_failures: Vec<TextFailure>,
    /// Directory/file projection outcome.
    pub projection: ProjectionReport,
    /// Where the record was written.
    pub record_path: PathBuf,
}

/// State of one document being decomposed.
pub struct Session<R: DocumentReader> {
    config: Config,
    reader: R,
    hierarchy: Option<Hierarchy>,
    output_dir: Option<PathBuf>,
}

impl Session<PdfDocument> {
    /// Open a PDF and start a session for it.
    pub fn open(path: &Path, config: Config) -> Result<Self> {
        let reader = PdfDocument::open(path)?;
        Ok(Self::new(reader, config))
    }
}

impl<R: DocumentReader> Session<R> {
    /// Start a session over an already opened document.
    pub fn new(reader: R, config: Config) -> Self {
        Self {
            config,
            reader,
            hierarchy: None,
            output_dir: None,
        }
    }

    /// Settings the session was started with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The opened document.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Hierarchy built by the last [`Session::load`], if any.
    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    /// Output directory chosen with [`Session::select_output`].
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    /// Read the outline and rebuild the section hierarchy.
    pub fn load(&mut self) -> Result<&Hierarchy> {
        let outline = self.reader.outline()?;
        let hierarchy = Hierarchy::from_outline(
            self.reader.name(),
            &outline,
            self.reader.page_count(),
            &self.config.outline.anchor,
        );

        info!(
            document = %hierarchy.name,
            outline_entries = outline.len(),
            sections = hierarchy.node_count(),
            depth = hierarchy.max_depth(),
            "Hierarchy built"
        );

        Ok(self.hierarchy.insert(hierarchy))
    }

    /// Choose the directory that receives the section tree and the record.
    pub fn select_output(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        info!(output = %dir.display(), "Output directory selected");
        self.output_dir = Some(dir);
    }

    /// Text of the section with the given title, if there is one.
    pub fn section_text(&self, title: &str) -> Result<Option<String>> {
        let hierarchy = self.hierarchy.as_ref().ok_or(DecomposeError::NotLoaded)?;
        match hierarchy.find_by_title(title) {
            Some(section) => Ok(Some(section_text(section, &self.reader)?)),
            None => Ok(None),
        }
    }

    /// Attach leaf text, project the tree onto the output directory and
    /// write the record file.
    pub fn commit(&mut self) -> Result<CommitReport> {
        let output_dir = self
            .output_dir
            .clone()
            .ok_or(DecomposeError::NoOutputSelected)?;
        let hierarchy = self.hierarchy.as_mut().ok_or(DecomposeError::NotLoaded)?;

        if !hierarchy.anchor_found {
            warn!(
                anchor = %self.config.outline.anchor,
                "Committing an empty hierarchy; the outline has no anchor entry"
            );
        }

        let text = attach_text(&mut hierarchy.sections, &self.reader);

        let projection =
            Projector::new(&self.reader, &self.config.layout).project(&hierarchy.sections, &output_dir);

        let format = self.config.record.format;
        let record_path = record_path(&output_dir, &hierarchy.name, format);
        save_record_with_format(&hierarchy.sections, &record_path, format)?;

        info!(
            record = %record_path.display(),
            leaves = text.attached,
            text_failures = text.failures.len(),
            files = projection.files.len(),
            "Commit finished"
        );

        Ok(CommitReport {
            leaves_with_text: text.attached,
            text_failures: text.failures,
            projection,
            record_path,
        })
    }
}
