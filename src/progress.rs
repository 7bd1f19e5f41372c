//! Progress reporting for the rename pipeline.
//!
//! The pipeline is linear:
//!
//! ```text
//! Start → Unpacked → DocumentLocated → Rewritten → Repacked → Done
//! ```
//!
//! Any stage may short-circuit to `Failed`. A [`ProgressReporter`] is told
//! about every transition and about each archive entry as it is extracted or
//! written.
//!
//! # Example
//!
//! ```rust,no_run
//! use kmz_renamer::progress::{PipelineState, ProgressReporter};
//! use kmz_renamer::{RenameOptions, Renamer};
//!
//! struct Printer;
//!
//! impl ProgressReporter for Printer {
//!     fn on_state(&mut self, state: &PipelineState) {
//!         println!("{}", state);
//!     }
//! }
//!
//! let renamer = Renamer::new(RenameOptions::default());
//! renamer.run_with_progress("in.kmz", "out.kmz", &mut Printer)?;
//! # Ok::<(), kmz_renamer::Error>(())
//! ```

use std::fmt;

use crate::{ArchivePath, FailureReason};

/// A state of the rename pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineState {
    /// The scratch directory is about to be created.
    Start,
    /// All entries were extracted.
    Unpacked {
        /// Number of files extracted.
        files: usize,
    },
    /// The KML document was found.
    DocumentLocated {
        /// Entry name of the document.
        path: ArchivePath,
    },
    /// Placemark names were rewritten in place.
    Rewritten {
        /// Number of placemarks renamed.
        placemarks: usize,
    },
    /// The output archive was written and moved into place.
    Repacked {
        /// Number of entries in the output.
        entries: usize,
    },
    /// The pipeline finished successfully.
    Done,
    /// The pipeline stopped at a failure.
    Failed(FailureReason),
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Starting"),
            Self::Unpacked { files } => write!(f, "Extracted {} files", files),
            Self::DocumentLocated { path } => write!(f, "Found {}", path),
            Self::Rewritten { placemarks } => write!(f, "Renamed {} placemarks", placemarks),
            Self::Repacked { entries } => write!(f, "Packed {} entries", entries),
            Self::Done => write!(f, "Done"),
            Self::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

/// Progress reporting trait for the rename pipeline.
///
/// All methods have empty default implementations.
pub trait ProgressReporter {
    /// Called on every state transition, including the terminal one.
    fn on_state(&mut self, state: &PipelineState) {
        let _ = state;
    }

    /// Called after an entry has been extracted or written.
    fn on_entry(&mut self, path: &ArchivePath, size: u64) {
        let _ = (path, size);
    }
}

/// A reporter that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// A reporter that records every state it sees.
///
/// Useful for tests and for callers that want the full transition history
/// after the run.
#[derive(Debug, Clone, Default)]
pub struct StateLog {
    states: Vec<PipelineState>,
    entries: usize,
}

impl StateLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded states in order.
    pub fn states(&self) -> &[PipelineState] {
        &self.states
    }

    /// Returns the number of entry notifications received.
    pub fn entries(&self) -> usize {
        self.entries
    }
}

impl ProgressReporter for StateLog {
    fn on_state(&mut self, state: &PipelineState) {
        self.states.push(state.clone());
    }

    fn on_entry(&mut self, _path: &ArchivePath, _size: u64) {
        self.entries += 1;
    }
}
