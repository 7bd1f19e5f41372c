//! # kmz-renamer
//!
//! Renames every placemark inside a KMZ archive to a positional label.
//!
//! A KMZ file is a zip container holding a KML document (conventionally
//! `doc.kml`) plus any resources it references. This crate unpacks the
//! container into a private scratch directory, finds the document, sets the
//! name of each placemark to `?-1`, `?-2`, … in document order, and packs
//! every file back into a new archive. Nothing besides placemark names
//! changes: other entries are copied byte for byte and the document keeps its
//! namespaces, prefixes and formatting.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kmz_renamer::{RenameOptions, Renamer, Result};
//!
//! fn main() -> Result<()> {
//!     let renamer = Renamer::new(RenameOptions::default());
//!     let report = renamer.run("survey.kmz", "RENAMED_survey.kmz")?;
//!     println!("renamed {} placemarks", report.placemarks_renamed);
//!     Ok(())
//! }
//! ```
//!
//! For callers that only need a yes/no answer and a message to show, use
//! [`rename_kmz`], which never returns an error:
//!
//! ```rust,no_run
//! let outcome = kmz_renamer::rename_kmz("survey.kmz", "RENAMED_survey.kmz");
//! println!("{}: {}", if outcome.ok { "ok" } else { "failed" }, outcome.message);
//! ```
//!
//! ## Error Handling
//!
//! Typed operations return [`Result<T>`]. Every [`Error`] maps to one
//! [`FailureReason`] through [`Error::reason`]; the reason's message is what
//! should be shown to end users.
//!
//! ## Safety and Resource Limits
//!
//! - **Path traversal protection**: entries whose names would land outside
//!   the scratch directory are rejected.
//! - **Resource limits**: the total uncompressed size of the input is capped
//!   (see [`RenameOptions::max_unpacked_size`]).
//! - **Atomic output**: the output archive is built in a temporary file and
//!   only moved into place once complete.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli` | No | The `kmz-renamer` command-line tool |
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive_path;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod progress;
pub mod repack;
pub mod rewrite;
pub mod unpack;

mod safety;
mod scratch;

pub use archive_path::ArchivePath;
pub use error::{Error, FailureReason, Result};
pub use options::{Compression, RenameOptions};
pub use pipeline::{Listing, Outcome, RenameReport, Renamer, rename_kmz};
pub use progress::{NoProgress, PipelineState, ProgressReporter, StateLog};
pub use rewrite::{KML_NAMESPACE, PlacemarkSummary};
