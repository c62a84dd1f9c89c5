//! Attaching extracted text to leaf sections.

use crate::document::DocumentReader;
use crate::error::Result;
use crate::tree::Section;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Text of one leaf section, detached from the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafText {
    pub title: String,
    pub start_page: usize,
    pub end_page: usize,
    pub text: String,
}

/// A leaf whose text could not be extracted.
#[derive(Debug, Clone)]
pub struct TextFailure {
    pub title: String,
    pub start_page: usize,
    pub end_page: usize,
    pub message: String,
}

/// Outcome of attaching text to a tree.
#[derive(Debug, Clone, Default)]
pub struct TextReport {
    /// Leaves that received their extracted text.
    pub attached: usize,
    /// Leaves left with empty text because extraction failed.
    pub failures: Vec<TextFailure>,
}

/// Fill in `text` on every leaf of the given sections.
///
/// Internal sections are left without text. A leaf whose pages cannot be
/// read gets empty text and an entry in [`TextReport::failures`]; the walk
/// carries on with the remaining leaves.
pub fn attach_text<R: DocumentReader>(sections: &mut [Section], reader: &R) -> TextReport {
    let mut report = TextReport::default();
    attach_into(sections, reader, &mut report);
    report
}

fn attach_into<R: DocumentReader>(sections: &mut [Section], reader: &R, report: &mut TextReport) {
    for section in sections.iter_mut() {
        if !section.is_leaf() {
            attach_into(&mut section.subsections, reader, report);
            continue;
        }

        debug!(
            title = %section.title,
            start_page = section.start_page,
            end_page = section.end_page,
            "Extracting leaf text"
        );
        match reader.extract_text(section.start_page, section.end_page) {
            Ok(text) => {
                section.text = Some(text);
                report.attached += 1;
            }
            Err(e) => {
                warn!(
                    title = %section.title,
                    start_page = section.start_page,
                    end_page = section.end_page,
                    error = %e,
                    "Leaf text could not be extracted; leaving it empty"
                );
                section.text = Some(String::new());
                report.failures.push(TextFailure {
                    title: section.title.clone(),
                    start_page: section.start_page,
                    end_page: section.end_page,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Collect the text of every leaf without touching the tree.
pub fn leaf_texts<R: DocumentReader>(sections: &[Section], reader: &R) -> Result<Vec<LeafText>> {
    let mut out = Vec::new();
    for leaf in sections.iter().flat_map(|s| s.leaves()) {
        out.push(LeafText {
            title: leaf.title.clone(),
            start_page: leaf.start_page,
            end_page: leaf.end_page,
            text: reader.extract_text(leaf.start_page, leaf.end_page)?,
        });
    }
    Ok(out)
}

/// Text covering a whole section, subsections included.
pub fn section_text<R: DocumentReader>(section: &Section, reader: &R) -> Result<String> {
    reader.extract_text(section.start_page, section.end_page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;
    use crate::testing::FlakyReader;

    fn sample() -> (Vec<Section>, TextDocument) {
        let mut chapter = Section::new(1, "Chapter", 2, 4);
        chapter.add_subsection(Section::new(2, "Part A", 2, 3));
        chapter.add_subsection(Section::new(2, "Part B", 4, 4));
        let sections = vec![Section::new(1, "Intro", 1, 1), chapter];
        let doc = TextDocument::from_pages("doc", ["p1", "p2", "p3", "p4"]);
        (sections, doc)
    }

    #[test]
    fn test_attach_only_leaves() {
        let (mut sections, doc) = sample();
        let report = attach_text(&mut sections, &doc);

        assert_eq!(report.attached, 3);
        assert!(report.failures.is_empty());
        assert_eq!(sections[0].text.as_deref(), Some("p1"));
        assert!(sections[1].text.is_none());
        assert_eq!(sections[1].subsections[0].text.as_deref(), Some("p2\np3"));
        assert_eq!(sections[1].subsections[1].text.as_deref(), Some("p4"));
    }

    #[test]
    fn test_attach_empty() {
        let doc = TextDocument::from_pages("doc", ["p1"]);
        assert_eq!(attach_text(&mut [], &doc).attached, 0);
    }

    #[test]
    fn test_attach_continues_past_unreadable_leaf() {
        let (mut sections, doc) = sample();
        let reader = FlakyReader::new(doc, vec![3]);

        let report = attach_text(&mut sections, &reader);

        assert_eq!(report.attached, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].title, "Part A");
        assert_eq!((report.failures[0].start_page, report.failures[0].end_page), (2, 3));
        assert_eq!(sections[0].text.as_deref(), Some("p1"));
        assert_eq!(sections[1].subsections[0].text.as_deref(), Some(""));
        assert_eq!(sections[1].subsections[1].text.as_deref(), Some("p4"));
    }

    #[test]
    fn test_leaf_texts_leaves_tree_untouched() {
        let (sections, doc) = sample();
        let texts = leaf_texts(&sections, &doc).unwrap();

        let titles: Vec<_> = texts.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Intro", "Part A", "Part B"]);
        assert!(sections[0].text.is_none());
    }

    #[test]
    fn test_section_text_spans_children() {
        let (sections, doc) = sample();
        assert_eq!(section_text(&sections[1], &doc).unwrap(), "p2\np3\np4");
    }
}
