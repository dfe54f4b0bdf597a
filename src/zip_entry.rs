//! Locate the FB2 document inside a `.fb2.zip` container and load it into memory.

use crate::container::has_fb2_suffix;
use crate::error::{ExtractionError, Result};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Open `archive_path` and return the bytes of its first `.fb2` entry.
///
/// Entries are visited in archive order; directories are skipped. The archive
/// is closed when this function returns, on success or failure.
pub fn locate_and_read(archive_path: &Path) -> Result<Vec<u8>> {
    let file = File::open(archive_path).map_err(|e| ExtractionError::CantOpenArchive {
        path: archive_path.to_path_buf(),
        source: ZipError::Io(e),
    })?;

    let mut archive = ZipArchive::new(file).map_err(|e| ExtractionError::CantOpenArchive {
        path: archive_path.to_path_buf(),
        source: e,
    })?;

    match read_first_fb2(&mut archive)? {
        Some(bytes) => Ok(bytes),
        None => Err(ExtractionError::NoFb2EntryFound {
            path: archive_path.to_path_buf(),
        }),
    }
}

/// Read the first `.fb2` entry of an already opened archive, or `None` when
/// there is none.
pub fn read_first_fb2<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Option<Vec<u8>>> {
    let Some((index, name, size)) = find_fb2_entry(archive) else {
        return Ok(None);
    };
    log::debug!("Reading zip entry #{index} {name} ({size} bytes)");

    let mut buffer = allocate_entry_buffer(&name, size)?;
    if size == 0 {
        return Ok(Some(buffer));
    }

    let mut entry = archive
        .by_index(index)
        .map_err(|e| ExtractionError::ZipEntryOpenFailed {
            name: name.clone(),
            source: e,
        })?;

    entry
        .read_to_end(&mut buffer)
        .map_err(|e| ExtractionError::ZipReadError {
            name: name.clone(),
            reason: e.to_string(),
        })?;

    if buffer.len() as u64 != size {
        return Err(ExtractionError::ZipReadError {
            name,
            reason: format!("read {} of {} bytes", buffer.len(), size),
        });
    }

    Ok(Some(buffer))
}

/// Index, name and declared uncompressed size of the first `.fb2` entry
fn find_fb2_entry<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<(usize, String, u64)> {
    for i in 0..archive.len() {
        // Raw access reads the header only, nothing is decompressed
        let entry = match archive.by_index_raw(i) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable zip entry #{i}: {e}");
                continue;
            }
        };

        let name = entry.name();
        if name.ends_with('/') {
            continue;
        }
        if has_fb2_suffix(name) {
            return Some((i, name.to_string(), entry.size()));
        }
    }

    None
}

/// Reserve room for a whole entry without trusting the declared size to fit.
fn allocate_entry_buffer(name: &str, size: u64) -> Result<Vec<u8>> {
    let too_large = || ExtractionError::EntryTooLarge {
        name: name.to_string(),
        size,
    };

    let len = usize::try_from(size).map_err(|_| too_large())?;
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| too_large())?;
    Ok(buffer)
}
