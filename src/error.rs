//! Error types for KMZ renaming operations.
//!
//! This module provides the [`Error`] enum which carries the detail of every
//! failure the pipeline can hit, the coarser [`FailureReason`] taxonomy that
//! callers surface to users, and a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! Typed entry points return `Result<T, Error>`. Use [`Error::reason`] to
//! collapse the detail into one of the user-facing reasons:
//!
//! ```rust,no_run
//! use kmz_renamer::{FailureReason, Renamer, RenameOptions};
//!
//! let renamer = Renamer::new(RenameOptions::default());
//! match renamer.run("points.kmz", "RENAMED_points.kmz") {
//!     Ok(report) => println!("renamed {} placemarks", report.placemarks_renamed),
//!     Err(e) if e.reason() == FailureReason::NoPlacemarksFound => {
//!         println!("nothing to rename");
//!     }
//!     Err(e) => eprintln!("{}", e.reason()),
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// The user-facing classification of a pipeline failure.
///
/// Every [`Error`] maps to exactly one reason. The [`Display`] text of a
/// reason is the message shown to end users; it never includes internal
/// detail such as paths or byte offsets.
///
/// [`Display`]: std::fmt::Display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum FailureReason {
    /// The input is not a valid, openable zip container.
    ArchiveUnreadable,
    /// No markup document was found in the archive.
    DocumentNotFound,
    /// The markup document contains no placemarks.
    NoPlacemarksFound,
    /// The output archive could not be created or written.
    OutputWriteError,
    /// The markup document is not well-formed XML.
    MalformedMarkup,
    /// The scratch directory could not be prepared or used.
    ScratchFailure,
}

impl FailureReason {
    /// Returns the human-readable message for this reason.
    pub fn message(self) -> &'static str {
        match self {
            Self::ArchiveUnreadable => "the input is not a readable KMZ archive",
            Self::DocumentNotFound => "no KML document was found in the archive",
            Self::NoPlacemarksFound => "the KML document contains no placemarks",
            Self::OutputWriteError => "the output archive could not be written",
            Self::MalformedMarkup => "the KML document is not well-formed XML",
            Self::ScratchFailure => "the working directory could not be prepared",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// The main error type for KMZ renaming operations.
///
/// Each variant includes the context needed to diagnose the failure. Use
/// [`Error::reason`] for the user-facing classification.
///
/// | Reason | Variants |
/// |--------|----------|
/// | [`ArchiveUnreadable`][FailureReason::ArchiveUnreadable] | [`ArchiveUnreadable`][Self::ArchiveUnreadable], [`UnsafeEntryPath`][Self::UnsafeEntryPath], [`ResourceLimitExceeded`][Self::ResourceLimitExceeded] |
/// | [`DocumentNotFound`][FailureReason::DocumentNotFound] | [`DocumentNotFound`][Self::DocumentNotFound] |
/// | [`NoPlacemarksFound`][FailureReason::NoPlacemarksFound] | [`NoPlacemarks`][Self::NoPlacemarks] |
/// | [`MalformedMarkup`][FailureReason::MalformedMarkup] | [`MalformedMarkup`][Self::MalformedMarkup] |
/// | [`OutputWriteError`][FailureReason::OutputWriteError] | [`OutputWrite`][Self::OutputWrite] |
/// | [`ScratchFailure`][FailureReason::ScratchFailure] | [`Io`][Self::Io], [`InvalidArchivePath`][Self::InvalidArchivePath] |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while working inside the scratch directory.
    ///
    /// Failures reading the input or writing the output have their own
    /// variants; this one covers local trouble such as a full temporary
    /// file system.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input could not be opened as a zip container.
    #[error("Cannot read archive '{}': {source}", path.display())]
    ArchiveUnreadable {
        /// The input path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// An archive entry would be extracted outside the scratch directory.
    ///
    /// This is a **security error**: the entry name is absolute or contains
    /// `..` segments.
    #[error("Unsafe path in entry {entry_index}: {path}")]
    UnsafeEntryPath {
        /// The entry index in the archive.
        entry_index: usize,
        /// The entry name as stored in the archive.
        path: String,
    },

    /// The archive expands beyond the configured size limit.
    #[error("Archive expands beyond the {limit}-byte limit")]
    ResourceLimitExceeded {
        /// The configured limit in bytes.
        limit: u64,
    },

    /// A path could not be represented as an archive entry name.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// The markup document was not found at the top level or anywhere below.
    #[error("Document '{name}' not found in archive")]
    DocumentNotFound {
        /// The conventional document file name that was searched for.
        name: String,
    },

    /// The markup document is not well-formed.
    #[error("Malformed markup at byte {position}: {reason}")]
    MalformedMarkup {
        /// Byte offset in the document where parsing stopped.
        position: u64,
        /// A description of the problem.
        reason: String,
    },

    /// The markup document parsed successfully but has no placemarks.
    #[error("No placemarks found in document")]
    NoPlacemarks,

    /// The output archive could not be created, written or moved into place.
    #[error("Cannot write output '{}': {source}", path.display())]
    OutputWrite {
        /// The requested output path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Returns the user-facing reason for this error.
    pub fn reason(&self) -> FailureReason {
        match self {
            Error::ArchiveUnreadable { .. }
            | Error::UnsafeEntryPath { .. }
            | Error::ResourceLimitExceeded { .. } => FailureReason::ArchiveUnreadable,
            Error::DocumentNotFound { .. } => FailureReason::DocumentNotFound,
            Error::NoPlacemarks => FailureReason::NoPlacemarksFound,
            Error::MalformedMarkup { .. } => FailureReason::MalformedMarkup,
            Error::OutputWrite { .. } => FailureReason::OutputWriteError,
            Error::Io(_) | Error::InvalidArchivePath(_) => FailureReason::ScratchFailure,
        }
    }

    /// Returns `true` if this error indicates a security issue.
    pub fn is_security_error(&self) -> bool {
        matches!(
            self,
            Error::UnsafeEntryPath { .. } | Error::ResourceLimitExceeded { .. }
        )
    }

    /// Returns `true` if the input archive itself was fine but had nothing
    /// to rename.
    ///
    /// These failures are reported to the user rather than treated as faults.
    pub fn is_nothing_to_rename(&self) -> bool {
        matches!(
            self,
            Error::DocumentNotFound { .. } | Error::NoPlacemarks
        )
    }

    /// Creates a malformed markup error.
    pub(crate) fn malformed(position: u64, reason: impl Into<String>) -> Self {
        Error::MalformedMarkup {
            position,
            reason: reason.into(),
        }
    }

    /// Creates an output write error.
    pub(crate) fn output_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::OutputWrite {
            path: path.into(),
            source,
        }
    }
}

/// A specialized Result type for KMZ renaming operations.
pub type Result<T> = std::result::Result<T, Error>;
