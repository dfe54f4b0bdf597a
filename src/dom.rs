//! Whole-document extraction.
//!
//! Parses the entire document into a tree and looks the fields up with
//! namespace-qualified paths below `/FictionBook/description/title-info`.
//! Output matches [`crate::streaming`]; memory grows with document size.
//! The tree parser only reads UTF-8, so documents in other encodings are
//! transcoded first.

use crate::error::{ExtractionError, ParseFailure, Result};
use crate::extractor::{ByteSource, MetadataExtractor};
use crate::metadata::{capture, BookMetadata, FieldLimits};
use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node, ParsingOptions};
use std::borrow::Cow;

const TITLE_INFO_PATH: [&str; 3] = ["FictionBook", "description", "title-info"];

pub struct DomExtractor<'a> {
    namespace: &'a str,
    limits: FieldLimits,
}

impl<'a> DomExtractor<'a> {
    pub fn new(namespace: &'a str, limits: FieldLimits) -> Self {
        Self { namespace, limits }
    }

    fn parse<'input>(
        &self,
        text: &'input str,
    ) -> std::result::Result<Document<'input>, ParseFailure> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        Ok(Document::parse_with_options(text, options)?)
    }
}

impl MetadataExtractor for DomExtractor<'_> {
    fn extract(&self, source: ByteSource<'_>) -> Result<BookMetadata> {
        let bytes: Cow<'_, [u8]> = match source {
            ByteSource::Path(path) => {
                Cow::Owned(std::fs::read(path).map_err(|e| source.fail(e.into()))?)
            }
            ByteSource::Buffer(bytes) => Cow::Borrowed(bytes),
        };
        let text = decode_document(&bytes).map_err(|e| source.fail(e))?;
        let doc = self.parse(&text).map_err(|e| source.fail(e))?;

        let query = Query::bind(self.namespace)?;
        Ok(query.metadata(&doc, self.limits))
    }
}

/// Decode the document to UTF-8, going by its BOM first and then by the
/// `encoding` of its XML declaration. Without either it must already be UTF-8.
fn decode_document(bytes: &[u8]) -> std::result::Result<Cow<'_, str>, ParseFailure> {
    let (encoding, bom_len) = match Encoding::for_bom(bytes) {
        Some(found) => found,
        None => (declared_encoding(bytes).unwrap_or(UTF_8), 0),
    };
    let body = &bytes[bom_len..];

    if encoding == UTF_8 {
        return Ok(Cow::Borrowed(std::str::from_utf8(body)?));
    }
    log::debug!("Transcoding {} document to UTF-8", encoding.name());
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or(ParseFailure::Encoding(encoding.name()))
}

/// Encoding named by `<?xml ... encoding="..."?>` at the very start of the input
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let decl = bytes.strip_prefix(b"<?xml")?;
    let end = decl.windows(2).position(|w| w == b"?>")?;
    let decl = &decl[..end];

    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = skip_spaces(&decl[at + 8..]).strip_prefix(b"=")?;
    let rest = skip_spaces(rest);
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let label = &rest[..rest.iter().position(|&b| b == quote)?];

    let encoding = Encoding::for_label(label);
    if encoding.is_none() {
        log::warn!(
            "Unknown encoding {:?} in XML declaration, assuming UTF-8",
            String::from_utf8_lossy(label)
        );
    }
    encoding
}

fn skip_spaces(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Path lookups with the FB2 namespace bound to every step
struct Query<'a> {
    namespace: &'a str,
}

impl<'a> Query<'a> {
    fn bind(namespace: &'a str) -> Result<Self> {
        if namespace.trim().is_empty() {
            return Err(ExtractionError::XPathContextFailed(
                "empty namespace URI cannot be bound".to_string(),
            ));
        }
        Ok(Self { namespace })
    }

    fn metadata(&self, doc: &Document<'_>, limits: FieldLimits) -> BookMetadata {
        let mut meta = BookMetadata::default();
        let Some(title_info) = self.select(doc) else {
            log::debug!("No {} title-info block found", self.namespace);
            return meta;
        };

        if let Some(title) = self.child(title_info, "book-title") {
            meta.title = capture(&leading_text(title), limits.title);
        }

        if let Some(author) = self.child(title_info, "author") {
            let part = |name: &str, limit| {
                self.child(author, name)
                    .and_then(|node| capture(&leading_text(node), limit))
            };
            meta.first_name = part("first-name", limits.first_name);
            meta.middle_name = part("middle-name", limits.middle_name);
            meta.last_name = part("last-name", limits.last_name);
        }

        if let Some(sequence) = self.child(title_info, "sequence") {
            meta.sequence_name = sequence
                .attribute("name")
                .and_then(|name| capture(name, limits.sequence_name));
            meta.sequence_number = sequence
                .attribute("number")
                .and_then(|number| capture(number, limits.sequence_number));
        }

        meta
    }

    fn select<'d, 'input>(&self, doc: &'d Document<'input>) -> Option<Node<'d, 'input>> {
        let root = doc.root_element();
        let (first, rest) = TITLE_INFO_PATH.split_first()?;
        if !self.matches(root, first) {
            return None;
        }
        rest.iter().try_fold(root, |node, step| self.child(node, step))
    }

    fn child<'d, 'input>(&self, node: Node<'d, 'input>, name: &str) -> Option<Node<'d, 'input>> {
        node.children().find(|child| self.matches(*child, name))
    }

    fn matches(&self, node: Node<'_, '_>, name: &str) -> bool {
        node.is_element()
            && node.tag_name().name() == name
            && node.tag_name().namespace() == Some(self.namespace)
    }
}

/// Text before the first child element, as the streaming parser captures it
fn leading_text(node: Node<'_, '_>) -> String {
    node.children()
        .take_while(|child| !child.is_element())
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}
