//! Document access.
//!
//! The pipeline only needs a handful of operations from a document: its
//! outline, its page count, text for a page range and a standalone copy of a
//! page range. [`DocumentReader`] captures that contract; [`PdfDocument`]
//! implements it on top of `lopdf` and [`TextDocument`] for paged plain text.
//!
//! Page numbers are 1-indexed and ranges are inclusive throughout.

use crate::error::{DecomposeError, Result};
use crate::outline::OutlineEntry;
use crate::pdf_outline::read_bookmarks;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Page separator used by paged text files.
pub const PAGE_DELIMITER: &str = "\u{000C}";

/// A standalone document holding a page range of its source.
pub trait Excerpt {
    /// Number of pages in the excerpt.
    fn page_count(&self) -> usize;

    /// Write the excerpt to `path`.
    fn save(&mut self, path: &Path) -> Result<()>;
}

/// Read access to an opened document.
///
/// The handle is released when the reader is dropped.
pub trait DocumentReader {
    /// Excerpt type produced by [`DocumentReader::extract_subrange`].
    type Excerpt: Excerpt;

    /// File extension (without dot) for saved excerpts.
    const EXTENSION: &'static str;

    /// Document name, usually the file stem.
    fn name(&self) -> &str;

    /// Outline entries in document order.
    fn outline(&self) -> Result<Vec<OutlineEntry>>;

    /// Total number of pages.
    fn page_count(&self) -> usize;

    /// Text of pages `start..=end`.
    fn extract_text(&self, start: usize, end: usize) -> Result<String>;

    /// Copy pages `start..=end` into a new standalone document.
    fn extract_subrange(&self, start: usize, end: usize) -> Result<Self::Excerpt>;
}

/// Clamp `start..=end` to the pages a document actually has.
fn clamp_range(start: usize, end: usize, page_count: usize) -> RangeInclusive<usize> {
    start.max(1)..=end.min(page_count)
}

/// Document name derived from a path.
fn stem_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("untitled")
        .to_string()
}

/// A PDF opened with `lopdf`.
#[derive(Debug)]
pub struct PdfDocument {
    name: String,
    path: PathBuf,
    document: lopdf::Document,
}

impl PdfDocument {
    /// Open a PDF file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DecomposeError::DocumentNotFound(path.to_path_buf()));
        }

        let document = lopdf::Document::load(path)
            .map_err(|e| DecomposeError::Pdf(format!("failed to open '{}': {}", path.display(), e)))?;

        debug!(path = %path.display(), pages = document.get_pages().len(), "Opened PDF");

        Ok(Self {
            name: stem_of(path),
            path: path.to_path_buf(),
            document,
        })
    }

    /// Path the document was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page_numbers(&self, start: usize, end: usize) -> Vec<u32> {
        let range = clamp_range(start, end, self.page_count());
        self.document
            .get_pages()
            .keys()
            .copied()
            .filter(|&n| range.contains(&(n as usize)))
            .collect()
    }
}

impl DocumentReader for PdfDocument {
    type Excerpt = PdfExcerpt;

    const EXTENSION: &'static str = "pdf";

    fn name(&self) -> &str {
        &self.name
    }

    fn outline(&self) -> Result<Vec<OutlineEntry>> {
        let walk = read_bookmarks(&self.document)
            .ok_or_else(|| DecomposeError::MissingOutline(self.path.clone()))?;

        for problem in &walk.skipped {
            warn!(path = %self.path.display(), "Outline entry skipped: {}", problem);
        }
        debug!(path = %self.path.display(), entries = walk.entries.len(), "Outline read");

        Ok(walk.entries)
    }

    fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    fn extract_text(&self, start: usize, end: usize) -> Result<String> {
        let pages = self.page_numbers(start, end);
        if pages.is_empty() {
            warn!(start, end, "No pages in range; extracted text is empty");
            return Ok(String::new());
        }
        Ok(self.document.extract_text(&pages)?)
    }

    fn extract_subrange(&self, start: usize, end: usize) -> Result<PdfExcerpt> {
        let keep = clamp_range(start, end, self.page_count());
        if keep.is_empty() {
            return Err(DecomposeError::InvalidPageRange {
                start,
                end,
                page_count: self.page_count(),
            });
        }

        let mut document = self.document.clone();
        let doomed: Vec<u32> = document
            .get_pages()
            .keys()
            .copied()
            .filter(|&n| !keep.contains(&(n as usize)))
            .collect();
        document.delete_pages(&doomed);

        // Bookmarks point at pages that no longer exist.
        if let Ok(catalog) = document.catalog_mut() {
            catalog.remove(b"Outlines");
        }
        document.prune_objects();
        document.renumber_objects();

        Ok(PdfExcerpt { document })
    }
}

/// A page range copied out of a [`PdfDocument`].
#[derive(Debug)]
pub struct PdfExcerpt {
    document: lopdf::Document,
}

impl Excerpt for PdfExcerpt {
    fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        self.document
            .save(path)
            .map_err(|e| DecomposeError::Pdf(format!("failed to save '{}': {}", path.display(), e)))?;
        Ok(())
    }
}

/// A single page of a [`TextDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-indexed page number.
    pub number: usize,
    /// Text content of the page.
    pub content: String,
}

impl Page {
    /// Create a new page.
    pub fn new(number: usize, content: impl Into<String>) -> Self {
        Self {
            number,
            content: content.into(),
        }
    }
}

/// A paged plain-text document with an explicit outline.
#[derive(Debug, Clone, Default)]
pub struct TextDocument {
    /// Document name/title.
    pub name: String,
    /// Original file path (if loaded from file).
    pub path: Option<PathBuf>,
    /// Pages in the document.
    pub pages: Vec<Page>,
    /// Outline entries.
    pub outline: Vec<OutlineEntry>,
}

impl TextDocument {
    /// Create a document from page texts, numbered from 1.
    pub fn from_pages<S: Into<String>>(name: impl Into<String>, pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            path: None,
            pages: pages
                .into_iter()
                .enumerate()
                .map(|(i, content)| Page::new(i + 1, content))
                .collect(),
            outline: Vec::new(),
        }
    }

    /// Load a text file, splitting pages on `delimiter`.
    pub fn from_text_file_with_delimiter(path: &Path, delimiter: &str) -> Result<Self> {
        if !path.is_file() {
            return Err(DecomposeError::DocumentNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| DecomposeError::io(path, e))?;

        let mut document = Self::from_pages(stem_of(path), content.split(delimiter));
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Load a text file whose pages are separated by form feeds.
    pub fn from_text_file(path: &Path) -> Result<Self> {
        Self::from_text_file_with_delimiter(path, PAGE_DELIMITER)
    }

    /// Attach an outline.
    pub fn with_outline(mut self, outline: Vec<OutlineEntry>) -> Self {
        self.outline = outline;
        self
    }

    /// Get a specific page by number (1-indexed).
    pub fn get_page(&self, number: usize) -> Option<&Page> {
        if number == 0 {
            None
        } else {
            self.pages.get(number - 1)
        }
    }

    fn pages_in(&self, start: usize, end: usize) -> &[Page] {
        let range = clamp_range(start, end, self.pages.len());
        if range.is_empty() {
            &[]
        } else {
            &self.pages[range.start() - 1..*range.end()]
        }
    }
}

impl DocumentReader for TextDocument {
    type Excerpt = TextExcerpt;

    const EXTENSION: &'static str = "txt";

    fn name(&self) -> &str {
        &self.name
    }

    fn outline(&self) -> Result<Vec<OutlineEntry>> {
        Ok(self.outline.clone())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_text(&self, start: usize, end: usize) -> Result<String> {
        Ok(self
            .pages_in(start, end)
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn extract_subrange(&self, start: usize, end: usize) -> Result<TextExcerpt> {
        let pages = self.pages_in(start, end);
        if pages.is_empty() {
            return Err(DecomposeError::InvalidPageRange {
                start,
                end,
                page_count: self.page_count(),
            });
        }
        Ok(TextExcerpt {
            pages: pages.to_vec(),
        })
    }
}

/// A page range copied out of a [`TextDocument`].
#[derive(Debug, Clone)]
pub struct TextExcerpt {
    pub pages: Vec<Page>,
}

impl Excerpt for TextExcerpt {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let content = self
            .pages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_DELIMITER);
        std::fs::write(path, content).map_err(|e| DecomposeError::io(path, e))
    }
}
