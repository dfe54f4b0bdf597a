//! # fb2info
//!
//! Reads the title, first author and series of FictionBook2 e-books.
//!
//! | Container | File name | Notes |
//! |-----------|-----------|-------|
//! | Plain XML | `*.fb2` | parsed straight from disk |
//! | ZIP | `*.fb2.zip` | first `*.fb2` entry is loaded into memory |
//!
//! ## Quick Start
//!
//! ```no_run
//! use fb2info::{process, CancelToken, ExtractOptions, Outcome};
//! use std::path::Path;
//!
//! let outcome = process(
//!     Path::new("dune.fb2.zip"),
//!     &ExtractOptions::default(),
//!     &CancelToken::new(),
//! )?;
//! if let Outcome::Extracted(meta) = outcome {
//!     println!("{:?} by {:?}", meta.title, meta.author());
//! }
//! # Ok::<(), fb2info::ExtractionError>(())
//! ```
//!
//! Two parsing strategies are available through [`Mode`]: the default
//! streaming parser stops once `<title-info>` is closed, the DOM parser builds
//! the whole tree and resolves namespace-qualified paths.

pub mod container;
pub mod dom;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod pipeline;
pub mod streaming;
pub mod zip_entry;

pub use container::{classify, Container};
pub use error::{ExtractionError, ParseFailure, Result};
pub use extractor::{extract, ByteSource, ExtractOptions, MetadataExtractor, Mode, FB2_NAMESPACE};
pub use metadata::{format_metadata, BookMetadata, FieldLimits};
pub use pipeline::{process, CancelToken, Outcome};
