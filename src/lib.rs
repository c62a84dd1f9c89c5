//! TOC Decomposer - rebuilds a document's section hierarchy from its outline.
//!
//! A document's outline (table of contents) is a flat list of
//! `(level, title, page)` entries. This library turns it into a nested tree
//! of sections with correct page ranges, attaches text to the leaf
//! sections, and writes the result out both as a record file and as a
//! directory tree holding one document per section.
//!
//! # Quick Start
//!
//! ```no_run
//! use toc_decomposer::{config::Config, session::Session};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let mut session = Session::open(Path::new("book.pdf"), config)?;
//!     let hierarchy = session.load()?;
//!     println!("{}", hierarchy.format());
//!
//!     session.select_output("out");
//!     let report = session.commit()?;
//!     println!("record written to {}", report.record_path.display());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **outline**: anchor filter and flat section partitioning
//! - **tree**: hierarchy building and page boundary propagation
//! - **document**: the document reader contract, PDF and paged-text readers
//! - **pdf_outline**: PDF bookmark tree walking
//! - **text**: leaf text attachment
//! - **layout**: directory tree projection
//! - **persistence**: record file save/load
//! - **session**: load / select output / commit workflow

pub mod config;
pub mod document;
pub mod error;
pub mod layout;
pub mod outline;
pub mod pdf_outline;
pub mod persistence;
pub mod session;
pub mod text;
pub mod tree;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::Config;
pub use document::{DocumentReader, Excerpt, PdfDocument, TextDocument};
pub use error::{DecomposeError, Result};
pub use layout::{ProjectionReport, Projector, sanitize_title};
pub use outline::{OutlineEntry, filter_from_anchor, partition_sections};
pub use persistence::{RecordFormat, load_record, save_record};
pub use session::{CommitReport, Session};
pub use tree::{Hierarchy, Section, build_hierarchy, propagate_boundaries};
