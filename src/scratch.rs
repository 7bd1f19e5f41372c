//! The scratch directory owned by one pipeline invocation.

use std::path::Path;

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::Result;

const SCRATCH_PREFIX: &str = "kmz-renamer-";

/// A uniquely named working directory, removed when dropped.
///
/// Each invocation creates its own directory, so concurrent invocations in
/// one process never see each other's files.
#[derive(Debug)]
pub(crate) struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Creates a fresh scratch directory under the system temporary directory.
    pub(crate) fn create() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
        log::debug!("created scratch directory '{}'", dir.path().display());
        Ok(Self { dir })
    }

    /// Returns the root of the scratch directory.
    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory, logging rather than failing if removal fails.
    pub(crate) fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::warn!(
                "Failed to remove scratch directory '{}': {}",
                path.display(),
                e
            );
        }
    }
}

/// Walks `root` depth-first in a fixed order.
///
/// Within each directory, files are visited before subdirectories and both are
/// sorted by name, so a shallower match always wins over a deeper one in the
/// same directory and repeated walks over the same tree agree.
pub(crate) fn sorted_walk(root: &Path, max_depth: usize) -> WalkDir {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
}
