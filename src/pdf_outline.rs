//! Reading the bookmark tree of a PDF.
//!
//! Bookmarks are walked through their `/First` and `/Next` links so that
//! entries keep document order and repeated titles stay distinct. Each
//! bookmark's target is resolved to a 1-indexed page number through a direct
//! `/Dest`, a `GoTo` action or a named destination.

use crate::outline::OutlineEntry;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

/// Limit on named-destination indirection and name tree depth.
const MAX_INDIRECTION: usize = 16;

/// Outline entries plus the bookmarks that could not be used.
#[derive(Debug, Default)]
pub struct BookmarkWalk {
    /// Usable bookmarks in document order.
    pub entries: Vec<OutlineEntry>,
    /// Why each unusable bookmark was dropped.
    pub skipped: Vec<String>,
}

/// Walk the bookmarks of `document` in document order.
///
/// Returns `None` when the catalog has no `/Outlines` dictionary.
pub fn read_bookmarks(document: &Document) -> Option<BookmarkWalk> {
    let catalog = document.catalog().ok()?;
    let walker = Walker::new(document, catalog);
    let root = walker.dict(catalog.get(b"Outlines").ok()?)?;

    let mut walk = BookmarkWalk::default();
    walker.visit_children(root, 1, &mut walk, &mut HashSet::new());
    Some(walk)
}

struct Walker<'a> {
    document: &'a Document,
    catalog: &'a Dictionary,
    pages: HashMap<ObjectId, usize>,
}

impl<'a> Walker<'a> {
    fn new(document: &'a Document, catalog: &'a Dictionary) -> Self {
        let pages = document
            .get_pages()
            .into_iter()
            .map(|(number, id)| (id, number as usize))
            .collect();
        Self {
            document,
            catalog,
            pages,
        }
    }

    fn deref(&self, object: &'a Object) -> Option<&'a Object> {
        self.document.dereference(object).ok().map(|(_, object)| object)
    }

    fn dict(&self, object: &'a Object) -> Option<&'a Dictionary> {
        self.deref(object)?.as_dict().ok()
    }

    fn visit_children(
        &self,
        parent: &'a Dictionary,
        level: usize,
        walk: &mut BookmarkWalk,
        seen: &mut HashSet<ObjectId>,
    ) {
        let mut next = parent.get(b"First").ok();
        while let Some(object) = next {
            if let Ok(id) = object.as_reference() {
                if !seen.insert(id) {
                    walk.skipped.push(format!("bookmark loop at object {} {}", id.0, id.1));
                    return;
                }
            }
            let Some(item) = self.dict(object) else {
                walk.skipped.push("bookmark is not a dictionary".to_string());
                return;
            };

            match self.entry(item, level) {
                Ok(entry) => walk.entries.push(entry),
                Err(reason) => walk.skipped.push(reason),
            }
            self.visit_children(item, level + 1, walk, seen);
            next = item.get(b"Next").ok();
        }
    }

    fn entry(&self, item: &'a Dictionary, level: usize) -> Result<OutlineEntry, String> {
        let title = item
            .get(b"Title")
            .ok()
            .and_then(|t| self.deref(t))
            .ok_or_else(|| "bookmark without a title".to_string())?;
        let title = lopdf::decode_text_string(title)
            .map_err(|e| format!("bookmark title could not be decoded: {e}"))?;
        let page = self
            .target_page(item)
            .ok_or_else(|| format!("bookmark '{title}' does not point at a page"))?;
        Ok(OutlineEntry::new(level, title, page))
    }

    fn target_page(&self, item: &'a Dictionary) -> Option<usize> {
        let dest = match item.get(b"Dest") {
            Ok(dest) => dest,
            Err(_) => {
                let action = self.dict(item.get(b"A").ok()?)?;
                let kind = action.get(b"S").and_then(Object::as_name).ok()?;
                if kind != b"GoTo".as_slice() {
                    return None;
                }
                action.get(b"D").ok()?
            }
        };
        self.destination_page(dest, 0)
    }

    fn destination_page(&self, dest: &'a Object, depth: usize) -> Option<usize> {
        if depth > MAX_INDIRECTION {
            return None;
        }
        match self.deref(dest)? {
            Object::Array(items) => self.page_number(items.first()?),
            Object::Dictionary(dict) => self.destination_page(dict.get(b"D").ok()?, depth + 1),
            Object::Name(name) | Object::String(name, _) => {
                self.destination_page(self.named_destination(name)?, depth + 1)
            }
            _ => None,
        }
    }

    fn page_number(&self, target: &Object) -> Option<usize> {
        match target {
            Object::Reference(id) => self.pages.get(id).copied(),
            // Remote-style destinations carry a 0-based page index.
            Object::Integer(index) => usize::try_from(*index)
                .ok()
                .map(|i| i + 1)
                .filter(|&n| n <= self.pages.len()),
            _ => None,
        }
    }

    fn named_destination(&self, name: &[u8]) -> Option<&'a Object> {
        if let Some(dests) = self.catalog.get(b"Dests").ok().and_then(|d| self.dict(d)) {
            if let Ok(dest) = dests.get(name) {
                return Some(dest);
            }
        }
        let names = self.dict(self.catalog.get(b"Names").ok()?)?;
        let tree = self.dict(names.get(b"Dests").ok()?)?;
        self.search_name_tree(tree, name, 0)
    }

    fn search_name_tree(&self, node: &'a Dictionary, name: &[u8], depth: usize) -> Option<&'a Object> {
        if depth > MAX_INDIRECTION {
            return None;
        }
        if let Ok(pairs) = node.get(b"Names").and_then(Object::as_array) {
            for pair in pairs.chunks(2) {
                if let [key, value] = pair {
                    if self.deref(key).and_then(|k| k.as_str().ok()) == Some(name) {
                        return Some(value);
                    }
                }
            }
        }
        let kids = node.get(b"Kids").and_then(Object::as_array).ok()?;
        kids.iter()
            .filter_map(|kid| self.dict(kid))
            .find_map(|kid| self.search_name_tree(kid, name, depth + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Mark, PdfFixture};

    fn flat(walk: &BookmarkWalk) -> Vec<(usize, &str, usize)> {
        walk.entries
            .iter()
            .map(|e| (e.level, e.title.as_str(), e.page))
            .collect()
    }

    #[test]
    fn test_repeated_titles_keep_order() {
        let doc = PdfFixture::with_pages(["a", "b", "c"])
            .bookmarks(vec![
                Mark::new("Intro", 1),
                Mark::new("Summary", 2),
                Mark::new("Chapter", 2),
                Mark::new("Summary", 3),
            ])
            .build();

        let walk = read_bookmarks(&doc).unwrap();
        assert_eq!(
            flat(&walk),
            vec![(1, "Intro", 1), (1, "Summary", 2), (1, "Chapter", 2), (1, "Summary", 3)]
        );
        assert!(walk.skipped.is_empty());
    }

    #[test]
    fn test_nested_levels_and_unicode_titles() {
        let doc = PdfFixture::with_pages(["a", "b", "c", "d"])
            .bookmarks(vec![
                Mark::new("ВВЕДЕНИЕ", 1),
                Mark::new("ГЛАВА 1", 2).children(vec![
                    Mark::new("1.1", 2),
                    Mark::new("1.2", 3).children(vec![Mark::new("1.2.1", 4)]),
                ]),
            ])
            .build();

        let walk = read_bookmarks(&doc).unwrap();
        assert_eq!(
            flat(&walk),
            vec![
                (1, "ВВЕДЕНИЕ", 1),
                (1, "ГЛАВА 1", 2),
                (2, "1.1", 2),
                (2, "1.2", 3),
                (3, "1.2.1", 4),
            ]
        );
    }

    #[test]
    fn test_action_and_named_targets() {
        let doc = PdfFixture::with_pages(["a", "b", "c"])
            .bookmarks(vec![Mark::new("Direct", 1), Mark::action("Action", 2), Mark::named("Named", 3)])
            .build();

        let walk = read_bookmarks(&doc).unwrap();
        assert_eq!(flat(&walk), vec![(1, "Direct", 1), (1, "Action", 2), (1, "Named", 3)]);
    }

    #[test]
    fn test_unresolvable_target_is_skipped() {
        let doc = PdfFixture::with_pages(["a", "b"])
            .bookmarks(vec![Mark::new("Kept", 1), Mark::dangling("Lost"), Mark::new("Also kept", 2)])
            .build();

        let walk = read_bookmarks(&doc).unwrap();
        assert_eq!(flat(&walk), vec![(1, "Kept", 1), (1, "Also kept", 2)]);
        assert_eq!(walk.skipped.len(), 1);
        assert!(walk.skipped[0].contains("Lost"));
    }

    #[test]
    fn test_no_outline() {
        let doc = PdfFixture::with_pages(["a"]).build();
        assert!(read_bookmarks(&doc).is_none());
    }
}
