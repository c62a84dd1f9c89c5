//! Flat outline handling.
//!
//! A document's outline arrives as an ordered list of `(level, title, page)`
//! entries. This module drops the preamble before the anchor entry and turns
//! what remains into flat [`Section`] records with provisional page bounds.

use crate::tree::Section;
use serde::{Deserialize, Serialize};

/// One entry of a document outline (table of contents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Nesting level, 1 for top-level entries.
    pub level: usize,
    /// Entry title as stored in the document.
    pub title: String,
    /// Target page (1-indexed).
    pub page: usize,
}

impl OutlineEntry {
    /// Create a new outline entry.
    pub fn new(level: usize, title: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }

    /// Whether the title contains `anchor`, ignoring case.
    pub fn matches_anchor(&self, anchor: &str) -> bool {
        self.title.to_uppercase().contains(&anchor.to_uppercase())
    }
}

/// Outline entries kept after the anchor filter.
#[derive(Debug, Clone, Default)]
pub struct FilteredOutline {
    /// Entries from the anchor (inclusive) to the end of the outline.
    pub entries: Vec<OutlineEntry>,
    /// Position of the anchor in the unfiltered outline.
    pub anchor_index: Option<usize>,
}

impl FilteredOutline {
    /// Whether an entry matched the anchor.
    pub fn anchor_found(&self) -> bool {
        self.anchor_index.is_some()
    }

    /// Whether nothing survived the filter.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of kept entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Keep the outline entries starting at the first title that contains `anchor`.
///
/// Everything before the anchor is discarded, top-level entries included.
/// When no title matches, the result is empty.
pub fn filter_from_anchor(entries: &[OutlineEntry], anchor: &str) -> FilteredOutline {
    match entries.iter().position(|e| e.matches_anchor(anchor)) {
        Some(index) => FilteredOutline {
            entries: entries[index..].to_vec(),
            anchor_index: Some(index),
        },
        None => FilteredOutline::default(),
    }
}

/// Turn a flat outline into flat sections with provisional page bounds.
///
/// Each section starts on its entry's page and ends on the page before the
/// next entry. The last section ends on the last page of the document.
/// Bounds are 1-indexed and inclusive; inverted ranges are left for
/// [`crate::tree::propagate_boundaries`] to repair.
pub fn partition_sections(entries: &[OutlineEntry], page_count: usize) -> Vec<Section> {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let end_page = entries
                .get(i + 1)
                .map(|next| next.page.saturating_sub(1))
                .unwrap_or(page_count);

            Section::new(entry.level, &entry.title, entry.page, end_page)
        })
        .collect()
}
