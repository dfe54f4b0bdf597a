use std::path::Path;

const FB2_SUFFIX: &str = ".fb2";
const FB2_ZIP_SUFFIX: &str = ".fb2.zip";

/// How an FB2 document is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container<'a> {
    PlainXml(&'a Path),
    ZippedXml(&'a Path),
    Unsupported,
}

/// Classify a file by the suffix of its name. No I/O is performed.
pub fn classify(path: &Path) -> Container<'_> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Container::Unsupported;
    };

    if has_fb2_suffix(name) {
        Container::PlainXml(path)
    } else if name.len() > FB2_ZIP_SUFFIX.len() && name.ends_with(FB2_ZIP_SUFFIX) {
        Container::ZippedXml(path)
    } else {
        Container::Unsupported
    }
}

/// Case-sensitive `.fb2` match; the bare suffix alone does not count.
pub(crate) fn has_fb2_suffix(name: &str) -> bool {
    name.len() > FB2_SUFFIX.len() && name.ends_with(FB2_SUFFIX)
}
