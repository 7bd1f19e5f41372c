//! Archive unpacking and document lookup.
//!
//! [`unpack`] extracts every entry of a zip container into a scratch
//! directory; [`locate_document`] then finds the KML document inside it,
//! either at the top level or nested below subfolders.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::progress::ProgressReporter;
use crate::safety::{BudgetError, UnpackBudget, validate_extract_path};
use crate::scratch::sorted_walk;
use crate::{ArchivePath, Error, RenameOptions, Result};

/// A file extracted from the input archive.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedEntry {
    /// Entry name in the archive.
    pub path: ArchivePath,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Modification time recorded in the archive, if any.
    pub modified: Option<zip::DateTime>,
}

/// Summary of an extracted archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnpackedArchive {
    /// Extracted files in archive order.
    pub files: Vec<UnpackedEntry>,
    /// Number of explicit directory entries.
    pub directories: usize,
    /// Total uncompressed bytes written to the scratch directory.
    pub total_bytes: u64,
}

impl UnpackedArchive {
    /// Returns the archive entry for `path`, if it was extracted.
    ///
    /// When an archive repeats a name the last entry wins, matching what ends
    /// up on disk.
    pub fn entry(&self, path: &ArchivePath) -> Option<&UnpackedEntry> {
        self.files.iter().rev().find(|e| &e.path == path)
    }
}

/// Extracts every entry of the zip archive at `input` into `dest`.
///
/// Directory entries become directories; every other entry is written as a
/// regular file with exactly the bytes stored in the archive.
///
/// # Errors
///
/// - [`Error::ArchiveUnreadable`] if the input cannot be opened, is not a zip
///   container, or an entry fails to decompress.
/// - [`Error::UnsafeEntryPath`] if an entry would land outside `dest`.
/// - [`Error::ResourceLimitExceeded`] if the archive expands beyond
///   [`RenameOptions::max_unpacked_size`].
/// - [`Error::Io`] if writing into `dest` fails.
pub fn unpack(
    input: &Path,
    dest: &Path,
    options: &RenameOptions,
    reporter: &mut dyn ProgressReporter,
) -> Result<UnpackedArchive> {
    let unreadable = |source: ZipError| Error::ArchiveUnreadable {
        path: input.to_path_buf(),
        source,
    };

    let file = File::open(input).map_err(|e| unreadable(ZipError::Io(e)))?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(unreadable)?;
    log::debug!(
        "opened '{}' with {} entries",
        input.display(),
        archive.len()
    );

    let mut budget = UnpackBudget::new(options.max_unpacked_size);
    let mut unpacked = UnpackedArchive::default();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(unreadable)?;
        let enclosed = entry.enclosed_name();
        // `./` style directory entries name the root itself.
        if entry.is_dir() && enclosed.as_deref().is_some_and(names_root) {
            continue;
        }
        let (archive_path, full_path) =
            validate_extract_path(enclosed.as_deref(), entry.name(), dest, index)?;

        if entry.is_dir() {
            fs::create_dir_all(&full_path)?;
            unpacked.directories += 1;
            continue;
        }

        let size_hint = entry.size();
        let modified = entry.last_modified();
        let data = budget
            .read_all(&mut entry, size_hint)
            .map_err(|e| match e {
                BudgetError::Read(e) => unreadable(ZipError::Io(e)),
                BudgetError::Exceeded { limit } => Error::ResourceLimitExceeded { limit },
            })?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, &data)?;

        let size = data.len() as u64;
        reporter.on_entry(&archive_path, size);
        unpacked.files.push(UnpackedEntry {
            path: archive_path,
            size,
            modified,
        });
    }

    unpacked.total_bytes = budget.used();
    log::debug!(
        "extracted {} files ({} bytes) and {} directories",
        unpacked.files.len(),
        unpacked.total_bytes,
        unpacked.directories
    );
    Ok(unpacked)
}

fn names_root(path: &Path) -> bool {
    path.components().all(|c| c == Component::CurDir)
}

/// Finds the KML document inside an extracted archive.
///
/// The conventional top-level location (`root/<document_name>`) is checked
/// first. Otherwise the tree is walked depth-first, at most
/// [`RenameOptions::max_scan_depth`] levels deep, and the first regular file
/// carrying the document name is used. Within a directory files are visited
/// before subdirectories, in name order, so the result is deterministic for a
/// given tree. No other precedence applies between several matches.
///
/// # Errors
///
/// Returns [`Error::DocumentNotFound`] if no file matches.
pub fn locate_document(root: &Path, options: &RenameOptions) -> Result<ArchivePath> {
    let name = options.document_name.as_str();

    if root.join(name).is_file() {
        log::debug!("document found at top level: {}", name);
        return ArchivePath::new(name);
    }

    for entry in sorted_walk(root, options.max_scan_depth) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() && entry.file_name() == OsStr::new(name) {
            let relative = entry.path().strip_prefix(root).map_err(|_| {
                Error::InvalidArchivePath(format!(
                    "'{}' is outside the scratch directory",
                    entry.path().display()
                ))
            })?;
            let found = ArchivePath::from_relative_path(relative)?;
            log::debug!("document found nested at {} (depth {})", found, found.depth());
            return Ok(found);
        }
    }

    Err(Error::DocumentNotFound {
        name: name.to_string(),
    })
}
