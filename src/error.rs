/// Error types for FB2 metadata extraction
use std::io;
use std::path::PathBuf;

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Why an XML byte stream could not be turned into metadata
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Dom(#[from] roxmltree::Error),

    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The bytes do not decode in the encoding the document declares
    #[error("document is not valid {0}")]
    Encoding(&'static str),

    /// The parser reached end of input without seeing a single element
    #[error("no XML elements found")]
    NoElements,
}

/// Every way an extraction can fail.
///
/// The set is closed: callers can match exhaustively, and each kind maps to a
/// stable numeric code (see [`ExtractionError::code`]).
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// A plain FB2 file could not be opened or parsed
    #[error("Invalid FB2 file: {}", path.display())]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: ParseFailure,
    },

    /// The ZIP container could not be opened
    #[error("can't open zip archive: {}", path.display())]
    CantOpenArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// The selected entry could not be opened for decompression
    #[error("can't open zip entry {name}")]
    ZipEntryOpenFailed {
        name: String,
        #[source]
        source: zip::result::ZipError,
    },

    /// Decompression failed, or fewer bytes came out than the header declared
    #[error("ZIP inner file read error in {name}: {reason}")]
    ZipReadError { name: String, reason: String },

    /// Releasing the archive failed
    #[error("can't close zip archive: {}", path.display())]
    ZipCloseFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An in-memory buffer could not be parsed
    #[error("unable to parse file from memory buffer")]
    BufferParseFailed {
        #[source]
        source: ParseFailure,
    },

    /// The namespace binding for path queries could not be set up
    #[error("unable to create XPath context: {0}")]
    XPathContextFailed(String),

    /// The entry's declared size cannot be held in memory on this platform
    #[error("zip entry {name} is too large ({size} bytes)")]
    EntryTooLarge { name: String, size: u64 },

    /// The archive holds no `.fb2` entry
    #[error("no .fb2 entry in zip archive: {}", path.display())]
    NoFb2EntryFound { path: PathBuf },
}

impl ExtractionError {
    /// Stable numeric kind. Codes 1 to 7 keep the numbering the file-manager
    /// extension used; 0 meant success there and is never returned.
    pub fn code(&self) -> u8 {
        match self {
            Self::InvalidDocument { .. } => 1,
            Self::CantOpenArchive { .. } => 2,
            Self::ZipEntryOpenFailed { .. } => 3,
            Self::ZipReadError { .. } => 4,
            Self::ZipCloseFailed { .. } => 5,
            Self::BufferParseFailed { .. } => 6,
            Self::XPathContextFailed(_) => 7,
            Self::EntryTooLarge { .. } => 8,
            Self::NoFb2EntryFound { .. } => 9,
        }
    }

    /// One-line failure string shown in place of metadata, e.g.
    /// `"Invalid FB2 file: book.fb2, Code: 1"`.
    pub fn render(&self) -> String {
        format!("{self}, Code: {}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            ExtractionError::InvalidDocument {
                path: PathBuf::from("a.fb2"),
                source: ParseFailure::NoElements,
            },
            ExtractionError::CantOpenArchive {
                path: PathBuf::from("a.fb2.zip"),
                source: zip::result::ZipError::FileNotFound,
            },
            ExtractionError::ZipEntryOpenFailed {
                name: "a.fb2".to_string(),
                source: zip::result::ZipError::FileNotFound,
            },
            ExtractionError::ZipReadError {
                name: "a.fb2".to_string(),
                reason: "short read".to_string(),
            },
            ExtractionError::ZipCloseFailed {
                path: PathBuf::from("a.fb2.zip"),
                source: io::Error::new(io::ErrorKind::Other, "close"),
            },
            ExtractionError::BufferParseFailed {
                source: ParseFailure::NoElements,
            },
            ExtractionError::XPathContextFailed("empty namespace".to_string()),
            ExtractionError::EntryTooLarge {
                name: "a.fb2".to_string(),
                size: u64::MAX,
            },
            ExtractionError::NoFb2EntryFound {
                path: PathBuf::from("a.fb2.zip"),
            },
        ];

        let mut codes: Vec<u8> = errors.iter().map(ExtractionError::code).collect();
        assert!(!codes.contains(&0));
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_render_appends_code() {
        let err = ExtractionError::BufferParseFailed {
            source: ParseFailure::NoElements,
        };
        assert_eq!(
            err.render(),
            "unable to parse file from memory buffer, Code: 6"
        );
    }
}
