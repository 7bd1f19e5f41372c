//! Safety and resource limit utilities.
//!
//! Entry paths are validated by [`ArchivePath`] before anything touches the
//! file system; this module resolves them below the scratch root and caps how
//! much data an input archive may expand to.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::{ArchivePath, Error, Result};

/// Resolves an archive entry below the extraction root.
///
/// `raw_name` is the name as stored in the archive and is only used for error
/// reporting. Returns [`Error::UnsafeEntryPath`] if the entry cannot be
/// represented as a relative path under `dest_root`.
pub(crate) fn validate_extract_path(
    enclosed: Option<&Path>,
    raw_name: &str,
    dest_root: &Path,
    entry_index: usize,
) -> Result<(ArchivePath, PathBuf)> {
    let unsafe_entry = || Error::UnsafeEntryPath {
        entry_index,
        path: raw_name.to_string(),
    };

    let relative = enclosed.ok_or_else(unsafe_entry)?;
    let archive_path = ArchivePath::from_relative_path(relative).map_err(|_| unsafe_entry())?;
    let full_path = archive_path.to_path_under(dest_root);

    // `.` and `..` are folded away by ArchivePath, so this holds by
    // construction; kept as a last check before writing.
    if !full_path.starts_with(dest_root) {
        return Err(unsafe_entry());
    }

    Ok((archive_path, full_path))
}

/// Tracks the total uncompressed bytes read from an archive.
///
/// Guards against compression bombs: once the configured budget is spent,
/// further reads fail with [`Error::ResourceLimitExceeded`].
#[derive(Debug, Clone)]
pub(crate) struct UnpackBudget {
    limit: Option<u64>,
    used: u64,
}

impl UnpackBudget {
    /// Creates a budget; `None` means unlimited.
    pub(crate) fn new(limit: Option<u64>) -> Self {
        Self { limit, used: 0 }
    }

    /// Returns the number of bytes read so far.
    pub(crate) fn used(&self) -> u64 {
        self.used
    }

    /// Reads `reader` to the end, charging every byte against the budget.
    ///
    /// Read failures are returned as plain I/O errors so the caller can
    /// attribute them to the archive.
    pub(crate) fn read_all<R: Read>(
        &mut self,
        reader: &mut R,
        size_hint: u64,
    ) -> std::result::Result<Vec<u8>, BudgetError> {
        let mut data = Vec::new();
        match self.limit {
            None => {
                data.reserve(usize::try_from(size_hint).unwrap_or(0));
                reader.read_to_end(&mut data).map_err(BudgetError::Read)?;
            }
            Some(limit) => {
                let remaining = limit.saturating_sub(self.used);
                data.reserve(usize::try_from(size_hint.min(remaining)).unwrap_or(0));
                // One extra byte tells "exactly at the limit" apart from "over it".
                reader
                    .take(remaining.saturating_add(1))
                    .read_to_end(&mut data)
                    .map_err(BudgetError::Read)?;
                if data.len() as u64 > remaining {
                    return Err(BudgetError::Exceeded { limit });
                }
            }
        }
        self.used += data.len() as u64;
        Ok(data)
    }
}

/// Failure while reading through an [`UnpackBudget`].
#[derive(Debug)]
pub(crate) enum BudgetError {
    /// The underlying reader failed.
    Read(std::io::Error),
    /// The budget was exhausted.
    Exceeded { limit: u64 },
}
