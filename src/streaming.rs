//! Streaming metadata extraction.
//!
//! The document is read as a stream of XML events and fed to [`Fb2Visitor`],
//! a small state machine that captures only the fields we report. Reading
//! stops as soon as the `<title-info>` block closes, so the size of the book
//! body (often megabytes of base64 images) does not matter.
//!
//! Character data is decoded with the encoding the XML declaration (or a BOM)
//! names, so `windows-1251` and other legacy FB2 files come out as UTF-8.

use crate::error::{ParseFailure, Result};
use crate::extractor::{ByteSource, MetadataExtractor};
use crate::metadata::{capture, push_bounded, BookMetadata, FieldLimits};
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Decoder, Reader};
use std::fs::File;
use std::io::{BufRead, BufReader};

pub struct StreamingExtractor {
    limits: FieldLimits,
    lenient: bool,
}

impl StreamingExtractor {
    pub fn new(limits: FieldLimits, lenient: bool) -> Self {
        Self { limits, lenient }
    }

    fn run<R: BufRead>(&self, input: R) -> std::result::Result<BookMetadata, ParseFailure> {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().check_end_names = !self.lenient;

        let mut visitor = Fb2Visitor::new(self.limits);
        let mut buf = Vec::new();
        let mut saw_element = false;

        loop {
            let event = reader.read_event_into(&mut buf)?;
            // The declaration may switch the encoding, so look it up per event
            let text = TextDecoder {
                decoder: reader.decoder(),
                lenient: self.lenient,
            };
            match event {
                Event::Start(e) => {
                    saw_element = true;
                    visitor.start(&e, &text)?;
                }
                Event::Empty(e) => {
                    saw_element = true;
                    visitor.start(&e, &text)?;
                    visitor.end(e.local_name().as_ref());
                }
                Event::End(e) => visitor.end(e.local_name().as_ref()),
                Event::Text(e) if visitor.is_capturing() => visitor.text(&text.unescape(&e)?),
                Event::CData(e) if visitor.is_capturing() => visitor.text(&text.decode(&e)?),
                Event::Eof => break,
                _ => {}
            }

            if visitor.is_stopped() {
                break;
            }
            buf.clear();
        }

        if !saw_element {
            return Err(ParseFailure::NoElements);
        }
        Ok(visitor.finish())
    }
}

impl MetadataExtractor for StreamingExtractor {
    fn extract(&self, source: ByteSource<'_>) -> Result<BookMetadata> {
        let parsed = match source {
            ByteSource::Path(path) => File::open(path)
                .map_err(ParseFailure::from)
                .and_then(|file| self.run(BufReader::new(file))),
            ByteSource::Buffer(bytes) => self.run(bytes),
        };
        parsed.map_err(|e| source.fail(e))
    }
}

/// Turns raw character data into text using the document's encoding.
///
/// Strict mode fails on malformed byte sequences and unknown entities.
/// Lenient mode substitutes U+FFFD for bad bytes and keeps each reference it
/// cannot resolve literally, while still resolving the ones around it.
#[derive(Debug, Clone, Copy)]
pub struct TextDecoder {
    decoder: Decoder,
    lenient: bool,
}

impl TextDecoder {
    pub fn decode(&self, raw: &[u8]) -> std::result::Result<String, ParseFailure> {
        if self.lenient {
            let (text, _) = self.decoder.encoding().decode_without_bom_handling(raw);
            return Ok(text.into_owned());
        }
        let text = self.decoder.decode(raw).map_err(quick_xml::Error::from)?;
        Ok(text.into_owned())
    }

    pub fn unescape(&self, raw: &[u8]) -> std::result::Result<String, ParseFailure> {
        let text = self.decode(raw)?;
        if self.lenient {
            return Ok(unescape_each(&text));
        }
        let text = unescape(&text).map_err(quick_xml::Error::from)?;
        Ok(text.into_owned())
    }
}

/// Resolve `&...;` references one at a time, keeping unresolvable ones as written
fn unescape_each(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // A reference runs to the next ';' unless another '&' comes first
        match tail[1..].find(['&', ';']).map(|i| i + 1) {
            Some(end) if tail.as_bytes()[end] == b';' => {
                let reference = &tail[..=end];
                match unescape(reference) {
                    Ok(value) => out.push_str(&value),
                    Err(_) => out.push_str(reference),
                }
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    InTitle,
    InAuthor,
    InFirstName,
    InLastName,
    InMiddleName,
    Stopped,
}

/// Progress through the first `<author>` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthorScope {
    NotSeen,
    Inside,
    Done,
}

/// Event visitor that fills a [`BookMetadata`].
///
/// Every field is written at most once: a capture starts only while the field
/// is still `None`, and later occurrences of the same element are ignored.
#[derive(Debug)]
pub struct Fb2Visitor {
    state: State,
    author: AuthorScope,
    sequence_seen: bool,
    /// Character data gathered for the field being captured
    pending: String,
    limits: FieldLimits,
    meta: BookMetadata,
}

impl Fb2Visitor {
    pub fn new(limits: FieldLimits) -> Self {
        Self {
            state: State::Init,
            author: AuthorScope::NotSeen,
            sequence_seen: false,
            pending: String::new(),
            limits,
            meta: BookMetadata::default(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state == State::Stopped
    }

    /// Whether character data at this point belongs to a captured field
    pub fn is_capturing(&self) -> bool {
        matches!(
            self.state,
            State::InTitle | State::InFirstName | State::InLastName | State::InMiddleName
        )
    }

    pub fn start(
        &mut self,
        tag: &BytesStart<'_>,
        text: &TextDecoder,
    ) -> std::result::Result<(), ParseFailure> {
        if self.is_stopped() {
            return Ok(());
        }
        // A child element ends the text run of the field being captured
        self.commit();

        let in_author = self.author == AuthorScope::Inside;
        self.state = match tag.local_name().as_ref() {
            b"book-title" if self.meta.title.is_none() => State::InTitle,
            b"author" if self.author == AuthorScope::NotSeen => {
                self.author = AuthorScope::Inside;
                State::InAuthor
            }
            b"first-name" if in_author && self.meta.first_name.is_none() => State::InFirstName,
            b"last-name" if in_author && self.meta.last_name.is_none() => State::InLastName,
            b"middle-name" if in_author && self.meta.middle_name.is_none() => State::InMiddleName,
            b"sequence" => {
                self.read_sequence(tag, text)?;
                State::Init
            }
            b"body" => {
                log::debug!("Reached <body> before </title-info>, stopping");
                State::Stopped
            }
            _ => State::Init,
        };
        Ok(())
    }

    pub fn text(&mut self, text: &str) {
        let limit = match self.state {
            State::InTitle => self.limits.title,
            State::InFirstName => self.limits.first_name,
            State::InLastName => self.limits.last_name,
            State::InMiddleName => self.limits.middle_name,
            _ => return,
        };
        push_bounded(&mut self.pending, text, limit);
    }

    pub fn end(&mut self, local_name: &[u8]) {
        if self.is_stopped() {
            return;
        }
        self.commit();

        match local_name {
            b"author" if self.author == AuthorScope::Inside => {
                self.author = AuthorScope::Done;
                self.state = State::Init;
            }
            b"title-info" => {
                log::debug!("Reached </title-info>, stopping");
                self.state = State::Stopped;
                return;
            }
            _ => {
                self.state = if self.author == AuthorScope::Inside {
                    State::InAuthor
                } else {
                    State::Init
                };
            }
        }

        if self.meta.title.is_some() && self.author == AuthorScope::Done && self.sequence_seen {
            log::debug!("All fields captured, stopping");
            self.state = State::Stopped;
        }
    }

    /// Metadata captured so far. A field whose element was cut off by the end
    /// of input is left unset.
    pub fn finish(self) -> BookMetadata {
        self.meta
    }

    /// Move pending text into the field the current state captures.
    fn commit(&mut self) {
        let slot = match self.state {
            State::InTitle => &mut self.meta.title,
            State::InFirstName => &mut self.meta.first_name,
            State::InLastName => &mut self.meta.last_name,
            State::InMiddleName => &mut self.meta.middle_name,
            _ => return,
        };

        if slot.is_none() && !self.pending.is_empty() {
            *slot = Some(std::mem::take(&mut self.pending));
        }
        self.pending.clear();
    }

    fn read_sequence(
        &mut self,
        tag: &BytesStart<'_>,
        text: &TextDecoder,
    ) -> std::result::Result<(), ParseFailure> {
        if self.sequence_seen {
            return Ok(());
        }
        self.sequence_seen = true;

        for attr in tag.attributes().flatten() {
            let (slot, limit) = match attr.key.local_name().as_ref() {
                b"name" => (&mut self.meta.sequence_name, self.limits.sequence_name),
                b"number" => (&mut self.meta.sequence_number, self.limits.sequence_number),
                _ => continue,
            };
            if slot.is_some() {
                continue;
            }

            *slot = capture(&text.unescape(&attr.value)?, limit);
        }
        Ok(())
    }
}
