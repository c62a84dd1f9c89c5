//! Fixtures shared by unit tests: small PDFs built in memory and a reader
//! whose text extraction fails on chosen pages.

use crate::document::{DocumentReader, TextDocument, TextExcerpt};
use crate::error::{DecomposeError, Result};
use crate::outline::OutlineEntry;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::path::{Path, PathBuf};

enum Target {
    Direct(usize),
    Action(usize),
    Named(usize),
    Dangling,
}

/// One bookmark of a fixture outline.
pub struct Mark {
    title: String,
    target: Target,
    children: Vec<Mark>,
}

impl Mark {
    /// Bookmark with a direct `/Dest` to `page`.
    pub fn new(title: &str, page: usize) -> Self {
        Self::with_target(title, Target::Direct(page))
    }

    /// Bookmark using a `GoTo` action.
    pub fn action(title: &str, page: usize) -> Self {
        Self::with_target(title, Target::Action(page))
    }

    /// Bookmark using a named destination from the catalog `/Dests`.
    pub fn named(title: &str, page: usize) -> Self {
        Self::with_target(title, Target::Named(page))
    }

    /// Bookmark pointing at an object that is not a page.
    pub fn dangling(title: &str) -> Self {
        Self::with_target(title, Target::Dangling)
    }

    pub fn children(mut self, children: Vec<Mark>) -> Self {
        self.children = children;
        self
    }

    fn with_target(title: &str, target: Target) -> Self {
        Self {
            title: title.to_string(),
            target,
            children: Vec::new(),
        }
    }
}

struct FixturePage {
    text: String,
    readable: bool,
}

/// Builder for small single-font PDFs.
pub struct PdfFixture {
    pages: Vec<FixturePage>,
    marks: Vec<Mark>,
}

impl PdfFixture {
    pub fn with_pages<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|text| FixturePage {
                    text: text.into(),
                    readable: true,
                })
                .collect(),
            marks: Vec::new(),
        }
    }

    /// Render page `number` with an Identity-H font that has no ToUnicode map.
    pub fn unreadable(mut self, number: usize) -> Self {
        self.pages[number - 1].readable = false;
        self
    }

    pub fn bookmarks(mut self, marks: Vec<Mark>) -> Self {
        self.marks = marks;
        self
    }

    pub fn build(&self) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let plain_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let opaque_font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => "Opaque",
            "Encoding" => "Identity-H",
        });

        let mut page_ids = Vec::new();
        for page in &self.pages {
            let font = if page.readable { plain_font } else { opaque_font };
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(page.text.as_str())]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font } },
                "MediaBox" => vec![Object::from(0), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(page_id);
        }

        let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_ids.len() as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if !self.marks.is_empty() {
            let outlines_id = doc.new_object_id();
            let mut named = Dictionary::new();
            let (first, last) = add_marks(&mut doc, &self.marks, outlines_id, &page_ids, &mut named)
                .unwrap();
            doc.objects.insert(
                outlines_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Outlines",
                    "First" => first,
                    "Last" => last,
                }),
            );
            catalog.set("Outlines", outlines_id);
            if !named.is_empty() {
                catalog.set("Dests", named);
            }
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc
    }

    /// Build and save to `dir/name`, returning the path.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        self.build().save(&path).unwrap();
        path
    }
}

fn add_marks(
    doc: &mut Document,
    marks: &[Mark],
    parent: ObjectId,
    pages: &[ObjectId],
    named: &mut Dictionary,
) -> Option<(ObjectId, ObjectId)> {
    let ids: Vec<ObjectId> = marks.iter().map(|_| doc.new_object_id()).collect();
    let page_dest = |page: usize| Object::Array(vec![pages[page - 1].into(), "Fit".into()]);

    for (i, mark) in marks.iter().enumerate() {
        let mut item = dictionary! {
            "Title" => lopdf::text_string(&mark.title),
            "Parent" => parent,
        };
        match mark.target {
            Target::Direct(page) => item.set("Dest", page_dest(page)),
            Target::Action(page) => item.set(
                "A",
                dictionary! { "S" => "GoTo", "D" => page_dest(page) },
            ),
            Target::Named(page) => {
                let key = format!("dest{}.{}", ids[i].0, ids[i].1);
                named.set(key.as_str(), page_dest(page));
                item.set("Dest", Object::Name(key.into_bytes()));
            }
            Target::Dangling => item.set("Dest", vec![Object::Reference((9999, 0)), "Fit".into()]),
        }
        if i > 0 {
            item.set("Prev", ids[i - 1]);
        }
        if let Some(&next) = ids.get(i + 1) {
            item.set("Next", next);
        }
        if let Some((first, last)) = add_marks(doc, &mark.children, ids[i], pages, named) {
            item.set("First", first);
            item.set("Last", last);
            item.set("Count", mark.children.len() as i64);
        }
        doc.objects.insert(ids[i], Object::Dictionary(item));
    }

    Some((*ids.first()?, *ids.last()?))
}

/// A [`TextDocument`] whose text extraction fails whenever a range touches
/// one of `broken` pages.
pub struct FlakyReader {
    pub inner: TextDocument,
    pub broken: Vec<usize>,
}

impl FlakyReader {
    pub fn new(inner: TextDocument, broken: Vec<usize>) -> Self {
        Self { inner, broken }
    }
}

impl DocumentReader for FlakyReader {
    type Excerpt = TextExcerpt;

    const EXTENSION: &'static str = TextDocument::EXTENSION;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn outline(&self) -> Result<Vec<OutlineEntry>> {
        self.inner.outline()
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn extract_text(&self, start: usize, end: usize) -> Result<String> {
        if self.broken.iter().any(|p| (start..=end).contains(p)) {
            return Err(DecomposeError::Pdf("required dictionary key was not found".to_string()));
        }
        self.inner.extract_text(start, end)
    }

    fn extract_subrange(&self, start: usize, end: usize) -> Result<TextExcerpt> {
        self.inner.extract_subrange(start, end)
    }
}
