use crate::container::{classify, Container};
use crate::error::Result;
use crate::extractor::{extract, ByteSource, ExtractOptions};
use crate::metadata::BookMetadata;
use crate::zip_entry;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag for abandoning work that has not started yet.
///
/// Checked once before a file is touched; an extraction already under way
/// always runs to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Extracted(BookMetadata),
    /// Not an `.fb2` or `.fb2.zip` file; nothing was read
    Unsupported,
    Cancelled,
}

/// Classify `path` and extract its metadata.
pub fn process(path: &Path, options: &ExtractOptions, cancel: &CancelToken) -> Result<Outcome> {
    if cancel.is_cancelled() {
        log::debug!("Cancelled before start: {}", path.display());
        return Ok(Outcome::Cancelled);
    }

    let meta = match classify(path) {
        Container::PlainXml(path) => extract(ByteSource::Path(path), options)?,
        Container::ZippedXml(path) => {
            let bytes = zip_entry::locate_and_read(path)?;
            if bytes.is_empty() {
                // Zero-length entry: nothing to parse, nothing to report
                BookMetadata::default()
            } else {
                extract(ByteSource::Buffer(&bytes), options)?
            }
        }
        Container::Unsupported => return Ok(Outcome::Unsupported),
    };

    Ok(Outcome::Extracted(meta))
}
