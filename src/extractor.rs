use crate::dom::DomExtractor;
use crate::error::{ExtractionError, ParseFailure, Result};
use crate::metadata::{BookMetadata, FieldLimits};
use crate::streaming::StreamingExtractor;
use std::path::Path;

/// Default namespace of FictionBook 2.0 documents
pub const FB2_NAMESPACE: &str = "http://www.gribuser.ru/xml/fictionbook/2.0";

/// Where the XML bytes come from
#[derive(Debug, Clone, Copy)]
pub enum ByteSource<'a> {
    Path(&'a Path),
    Buffer(&'a [u8]),
}

impl ByteSource<'_> {
    /// Wrap a parse failure in the error kind matching this source
    pub(crate) fn fail(&self, source: ParseFailure) -> ExtractionError {
        match self {
            ByteSource::Path(path) => ExtractionError::InvalidDocument {
                path: path.to_path_buf(),
                source,
            },
            ByteSource::Buffer(_) => ExtractionError::BufferParseFailed { source },
        }
    }
}

/// Parsing strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Event-driven parse that stops after the metadata block
    #[default]
    Streaming,
    /// Whole-document parse followed by namespace-qualified path lookups
    Dom,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub mode: Mode,
    pub limits: FieldLimits,
    /// Streaming mode only: accept mismatched end tags, undecodable bytes and
    /// unknown entities instead of failing
    pub lenient: bool,
    /// Namespace bound for DOM-mode queries
    pub namespace: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Streaming,
            limits: FieldLimits::UNBOUNDED,
            lenient: false,
            namespace: FB2_NAMESPACE.to_string(),
        }
    }
}

/// Anything that can turn FB2 bytes into [`BookMetadata`]
pub trait MetadataExtractor {
    fn extract(&self, source: ByteSource<'_>) -> Result<BookMetadata>;
}

/// Build the extractor for `options.mode`, configured with the rest of `options`.
///
/// The DOM extractor borrows `options.namespace`, so the box cannot outlive them.
pub fn extractor_for(options: &ExtractOptions) -> Box<dyn MetadataExtractor + '_> {
    match options.mode {
        Mode::Streaming => Box::new(StreamingExtractor::new(options.limits, options.lenient)),
        Mode::Dom => Box::new(DomExtractor::new(&options.namespace, options.limits)),
    }
}

/// Extract metadata from one document with the strategy `options` selects
pub fn extract(source: ByteSource<'_>, options: &ExtractOptions) -> Result<BookMetadata> {
    extractor_for(options).extract(source)
}
