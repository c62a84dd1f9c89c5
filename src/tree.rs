//! Section hierarchy reconstruction.
//!
//! This module holds the central data structure of the crate: a tree of
//! [`Section`]s, each covering an inclusive page range of the source
//! document. The tree is rebuilt from flat, level-tagged sections and then
//! corrected so that every ancestor covers its descendants.

use crate::outline::{OutlineEntry, filter_from_anchor, partition_sections};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A node in the section hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Section {
    /// Outline level of the originating entry.
    pub level: usize,

    /// Section title, unsanitized.
    pub title: String,

    /// First page (1-indexed).
    pub start_page: usize,

    /// Last page (1-indexed, inclusive).
    pub end_page: usize,

    /// Child sections in outline order.
    #[serde(default)]
    pub subsections: Vec<Section>,

    /// Extracted text, set on leaf sections only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Section {
    /// Create a new section without subsections or text.
    pub fn new(level: usize, title: impl Into<String>, start_page: usize, end_page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            start_page,
            end_page,
            subsections: Vec::new(),
            text: None,
        }
    }

    /// Add a subsection.
    pub fn add_subsection(&mut self, child: Section) {
        self.subsections.push(child);
    }

    /// Check if this section has subsections.
    pub fn has_subsections(&self) -> bool {
        !self.subsections.is_empty()
    }

    /// Leaves are the only sections that carry text.
    pub fn is_leaf(&self) -> bool {
        self.subsections.is_empty()
    }

    /// Get the page span (number of pages covered).
    pub fn page_span(&self) -> usize {
        if self.end_page >= self.start_page {
            self.end_page - self.start_page + 1
        } else {
            0
        }
    }

    /// Recursively count all sections in this subtree (including self).
    pub fn node_count(&self) -> usize {
        1 + self
            .subsections
            .iter()
            .map(|s| s.node_count())
            .sum::<usize>()
    }

    /// Find all leaf sections.
    pub fn leaves(&self) -> Vec<&Section> {
        if self.subsections.is_empty() {
            vec![self]
        } else {
            self.subsections.iter().flat_map(|s| s.leaves()).collect()
        }
    }

    /// Find a section by title (case-insensitive).
    pub fn find_by_title(&self, title: &str) -> Option<&Section> {
        if self.title.to_lowercase() == title.to_lowercase() {
            return Some(self);
        }
        self.subsections
            .iter()
            .find_map(|child| child.find_by_title(title))
    }

    /// Format the subtree as an indented listing.
    pub fn format_tree(&self, indent: usize) -> String {
        let prefix = "  ".repeat(indent);
        let mut result = format!(
            "{}[L{}] {} [pages {}-{}]\n",
            prefix, self.level, self.title, self.start_page, self.end_page
        );

        for child in &self.subsections {
            result.push_str(&child.format_tree(indent + 1));
        }

        result
    }
}

/// The reconstructed hierarchy of one document.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    /// Document name.
    pub name: String,

    /// Total page count of the source document.
    pub total_pages: usize,

    /// Root-level sections.
    pub sections: Vec<Section>,

    /// Whether the outline contained the anchor entry.
    pub anchor_found: bool,
}

impl Hierarchy {
    /// Create a hierarchy from already built root sections.
    pub fn new(name: impl Into<String>, sections: Vec<Section>, total_pages: usize) -> Self {
        Self {
            name: name.into(),
            total_pages,
            sections,
            anchor_found: true,
        }
    }

    /// Run the outline through the filter, partitioner, builder and
    /// boundary propagation.
    pub fn from_outline(
        name: impl Into<String>,
        outline: &[OutlineEntry],
        total_pages: usize,
        anchor: &str,
    ) -> Self {
        let name = name.into();
        let filtered = filter_from_anchor(outline, anchor);
        if !filtered.anchor_found() {
            warn!(document = %name, anchor, "No outline entry matches the anchor; hierarchy is empty");
        }

        let flat = partition_sections(&filtered.entries, total_pages);
        let mut sections = build_hierarchy(flat);
        propagate_boundaries(&mut sections);

        Self {
            name,
            total_pages,
            sections,
            anchor_found: filtered.anchor_found(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Get total section count.
    pub fn node_count(&self) -> usize {
        self.sections.iter().map(|s| s.node_count()).sum()
    }

    /// Get maximum depth of the tree.
    pub fn max_depth(&self) -> usize {
        fn depth(section: &Section) -> usize {
            1 + section.subsections.iter().map(depth).max().unwrap_or(0)
        }

        self.sections.iter().map(depth).max().unwrap_or(0)
    }

    /// All leaf sections in document order.
    pub fn leaves(&self) -> Vec<&Section> {
        self.sections.iter().flat_map(|s| s.leaves()).collect()
    }

    /// Find a section by title.
    pub fn find_by_title(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find_map(|s| s.find_by_title(title))
    }

    /// Format the entire hierarchy for display.
    pub fn format(&self) -> String {
        let mut result = format!(
            "Document: {} ({} pages, {} sections)\n",
            self.name,
            self.total_pages,
            self.node_count()
        );
        result.push_str(&"─".repeat(50));
        result.push('\n');

        for section in &self.sections {
            result.push_str(&section.format_tree(0));
        }

        result
    }
}

/// Fold flat sections into a tree using their levels.
///
/// Keeps a stack of open ancestors. An incoming section closes every open
/// section whose level is greater than or equal to its own, then becomes a
/// child of whatever remains on top, or a root if nothing does. Levels need
/// not be contiguous and the first section need not be level 1.
pub fn build_hierarchy(sections: Vec<Section>) -> Vec<Section> {
    let mut roots = Vec::new();
    let mut stack: Vec<Section> = Vec::new();

    for section in sections {
        while stack.last().is_some_and(|open| open.level >= section.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(section);
    }

    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    roots
}

/// Pop the innermost open section and link it into its parent (or the roots).
fn close_top(stack: &mut Vec<Section>, roots: &mut Vec<Section>) {
    if let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.add_subsection(done),
            None => roots.push(done),
        }
    }
}

/// Grow every section's end page to cover its descendants. Returns the
/// final end page of `section`.
pub fn expand_end_pages(section: &mut Section) -> usize {
    let mut end = section.end_page;
    for child in &mut section.subsections {
        end = end.max(expand_end_pages(child));
    }
    section.end_page = end;
    end
}

/// Clamp every inverted range in the subtree to a single page. Returns the
/// number of sections repaired.
pub fn repair_inverted_ranges(section: &mut Section) -> usize {
    debug!(
        title = %section.title,
        start_page = section.start_page,
        end_page = section.end_page,
        "Checking section range"
    );

    let mut repaired = 0;
    if section.end_page < section.start_page {
        warn!(
            title = %section.title,
            old_end = section.end_page,
            new_end = section.start_page,
            "Repairing inverted page range"
        );
        section.end_page = section.start_page;
        repaired += 1;
    }

    for child in &mut section.subsections {
        repaired += repair_inverted_ranges(child);
    }

    repaired
}

/// Apply both boundary passes to every root. Returns the number of repairs.
///
/// A repair can raise a child's end above its ancestors' ends, so the
/// expansion pass runs again for any tree that needed repairs.
pub fn propagate_boundaries(sections: &mut [Section]) -> usize {
    let mut repaired = 0;
    for section in sections.iter_mut() {
        expand_end_pages(section);
        let fixed = repair_inverted_ranges(section);
        if fixed > 0 {
            expand_end_pages(section);
        }
        repaired += fixed;
    }
    repaired
}
