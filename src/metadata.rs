use serde::Serialize;

/// Metadata pulled from the `<title-info>` block of one FB2 document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookMetadata {
    pub title: Option<String>,
    /// Name parts of the first listed author only
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    /// Attributes of the first `<sequence>` only
    pub sequence_name: Option<String>,
    pub sequence_number: Option<String>,
}

impl BookMetadata {
    /// `"<name> - <number>"`, or just `"<name>"` when the number is missing.
    pub fn sequence(&self) -> Option<String> {
        let name = self.sequence_name.as_deref()?;
        match self.sequence_number.as_deref() {
            Some(number) => Some(format!("{} - {}", name, number)),
            None => Some(name.to_string()),
        }
    }

    pub fn author(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Optional per-field byte capacities.
///
/// `None` means unbounded. [`FieldLimits::LEGACY`] reproduces the column
/// widths of the old file-manager extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldLimits {
    pub title: Option<usize>,
    pub first_name: Option<usize>,
    pub last_name: Option<usize>,
    pub middle_name: Option<usize>,
    pub sequence_name: Option<usize>,
    pub sequence_number: Option<usize>,
}

impl FieldLimits {
    pub const UNBOUNDED: Self = Self {
        title: None,
        first_name: None,
        last_name: None,
        middle_name: None,
        sequence_name: None,
        sequence_number: None,
    };

    // middle-name had no column; it shares the first-name width
    pub const LEGACY: Self = Self {
        title: Some(240),
        first_name: Some(50),
        last_name: Some(20),
        middle_name: Some(50),
        sequence_name: Some(140),
        sequence_number: Some(4),
    };
}

/// Append `text` to `dest`, dropping NUL characters and anything that would
/// push `dest` past `limit` bytes. Cuts only on character boundaries.
pub(crate) fn push_bounded(dest: &mut String, text: &str, limit: Option<usize>) {
    for ch in text.chars().filter(|&c| c != '\0') {
        if let Some(limit) = limit {
            if dest.len() + ch.len_utf8() > limit {
                return;
            }
        }
        dest.push(ch);
    }
}

/// Bounded copy of `text`, or `None` when nothing is left to keep.
pub(crate) fn capture(text: &str, limit: Option<usize>) -> Option<String> {
    let mut captured = String::new();
    push_bounded(&mut captured, text, limit);
    if captured.is_empty() {
        None
    } else {
        Some(captured)
    }
}

/// Render metadata as the plain-text block printed for one file
pub fn format_metadata(meta: &BookMetadata) -> String {
    let mut lines = Vec::new();

    if let Some(title) = &meta.title {
        lines.push(format!("Title: {}", title));
    }

    if let Some(author) = meta.author() {
        lines.push(format!("Author: {}", author));
    }

    if let Some(sequence) = meta.sequence() {
        lines.push(format!("Sequence: {}", sequence));
    }

    if lines.is_empty() {
        lines.push("(no metadata)".to_string());
    }

    lines.join("\n")
}
