//! Archive path type with validation for secure path handling.

use crate::{Error, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Maximum length for archive paths (in bytes).
///
/// The zip format stores name lengths in 16 bits, so nothing longer can be
/// written back out.
const MAX_PATH_LENGTH: usize = u16::MAX as usize;

/// A validated archive entry name.
///
/// `ArchivePath` uses forward slashes and validates that:
/// - No NUL bytes are present
/// - The path is not absolute (does not start with `/`)
/// - No empty segments exist (no `//` or trailing `/`)
/// - No `.` or `..` segments are present
///
/// Every entry extracted into the scratch directory and every file packed
/// back into the output archive passes through this type, so the two sides
/// agree on entry names.
///
/// # Examples
///
/// ```
/// use kmz_renamer::ArchivePath;
///
/// let path = ArchivePath::new("files/photo.jpg").unwrap();
/// assert_eq!(path.as_str(), "files/photo.jpg");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the path:
    /// - Contains NUL bytes
    /// - Is an absolute path (starts with `/`)
    /// - Contains empty segments (e.g., `a//b`) or a trailing slash
    /// - Contains `.` or `..` segments
    /// - Is empty
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Builds an archive path from a file system path relative to a root.
    ///
    /// Components are joined with `/` regardless of platform. `.` components
    /// are dropped and `..` removes the previous segment, so the result is
    /// the normalised location below the root. A `..` that would climb above
    /// the root is rejected, as are roots and prefixes.
    ///
    /// ```
    /// use kmz_renamer::ArchivePath;
    /// use std::path::Path;
    ///
    /// let path = ArchivePath::from_relative_path(Path::new("files/icon.png")).unwrap();
    /// assert_eq!(path.as_str(), "files/icon.png");
    ///
    /// let path = ArchivePath::from_relative_path(Path::new("files/../img/a.png")).unwrap();
    /// assert_eq!(path.as_str(), "img/a.png");
    ///
    /// assert!(ArchivePath::from_relative_path(Path::new("a/../../b")).is_err());
    /// ```
    pub fn from_relative_path(path: &Path) -> Result<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        Error::InvalidArchivePath(format!(
                            "non UTF-8 component in '{}'",
                            path.display()
                        ))
                    })?;
                    segments.push(name);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        return Err(Error::InvalidArchivePath(format!(
                            "'{}' escapes the root (path traversal)",
                            path.display()
                        )));
                    }
                }
                other => {
                    return Err(Error::InvalidArchivePath(format!(
                        "unexpected component {:?} in '{}'",
                        other,
                        path.display()
                    )));
                }
            }
        }
        Self::new(&segments.join("/"))
    }

    /// Validates an archive path string.
    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }

        if s.ends_with('/') {
            return Err(Error::InvalidArchivePath(
                "trailing slash not allowed".into(),
            ));
        }

        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(Error::InvalidArchivePath(
                    "empty segment (consecutive slashes)".into(),
                ));
            }
            if segment == "." {
                return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
            }
            if segment == ".." {
                return Err(Error::InvalidArchivePath(
                    "'..' segment not allowed (path traversal)".into(),
                ));
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns an iterator over the path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the number of directories above the file name.
    ///
    /// ```
    /// use kmz_renamer::ArchivePath;
    ///
    /// assert_eq!(ArchivePath::new("doc.kml").unwrap().depth(), 0);
    /// assert_eq!(ArchivePath::new("a/b/doc.kml").unwrap().depth(), 2);
    /// ```
    pub fn depth(&self) -> usize {
        self.0.matches('/').count()
    }

    /// Resolves this path below `root` using platform separators.
    pub fn to_path_under(&self, root: &Path) -> PathBuf {
        let mut full = root.to_path_buf();
        for segment in self.components() {
            full.push(segment);
        }
        full
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
