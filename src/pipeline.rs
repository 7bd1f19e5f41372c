//! The rename pipeline.
//!
//! [`Renamer`] drives one KMZ through unpack, document lookup, rewrite and
//! repack inside its own scratch directory. The directory is removed on every
//! exit path, including early returns on error.

use std::path::{Path, PathBuf};

use crate::progress::{NoProgress, PipelineState, ProgressReporter};
use crate::rewrite::{PlacemarkSummary, rewrite_file, survey};
use crate::scratch::ScratchDir;
use crate::unpack::{locate_document, unpack};
use crate::{ArchivePath, Error, FailureReason, RenameOptions, Result, repack};

/// Result of a successful rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameReport {
    /// Number of placemarks that received a label.
    pub placemarks_renamed: usize,
    /// Placemarks that had no name and got one inserted.
    pub names_inserted: usize,
    /// Number of entries in the output archive.
    pub entries_repacked: usize,
    /// Entry name of the rewritten document.
    pub document: ArchivePath,
    /// Where the output archive was written.
    pub output: PathBuf,
}

/// The placemarks of a KMZ archive, as found by [`Renamer::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Entry name of the document.
    pub document: ArchivePath,
    /// Placemarks in document order.
    pub placemarks: Vec<PlacemarkSummary>,
}

/// Renames placemarks in KMZ archives.
///
/// # Example
///
/// ```rust,no_run
/// use kmz_renamer::{RenameOptions, Renamer};
///
/// let renamer = Renamer::new(RenameOptions::new().label_prefix("P"));
/// let report = renamer.run("survey.kmz", "RENAMED_survey.kmz")?;
/// println!(
///     "{}: {} placemarks ({} names inserted)",
///     report.document, report.placemarks_renamed, report.names_inserted
/// );
/// # Ok::<(), kmz_renamer::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Renamer {
    options: RenameOptions,
}

impl Renamer {
    /// Creates a renamer with the given options.
    pub fn new(options: RenameOptions) -> Self {
        Self { options }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &RenameOptions {
        &self.options
    }

    /// Renames every placemark of `input` and writes the result to `output`.
    ///
    /// The input file is never modified. On failure nothing is written to
    /// `output`.
    pub fn run(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<RenameReport> {
        self.run_with_progress(input, output, &mut NoProgress)
    }

    /// Like [`run`](Self::run), reporting every state transition.
    ///
    /// The reporter always sees `Start` first and exactly one of `Done` or
    /// `Failed` last.
    pub fn run_with_progress(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<RenameReport> {
        let input = input.as_ref();
        let output = output.as_ref();
        log::info!("renaming '{}' -> '{}'", input.display(), output.display());

        reporter.on_state(&PipelineState::Start);
        match self.execute(input, output, reporter) {
            Ok(report) => {
                reporter.on_state(&PipelineState::Done);
                log::info!(
                    "renamed {} placemarks in {}",
                    report.placemarks_renamed,
                    report.document
                );
                Ok(report)
            }
            Err(e) => {
                reporter.on_state(&PipelineState::Failed(e.reason()));
                log::debug!("rename of '{}' failed: {}", input.display(), e);
                Err(e)
            }
        }
    }

    /// Lists the placemarks of `input` without writing anything.
    pub fn list(&self, input: impl AsRef<Path>) -> Result<Listing> {
        let input = input.as_ref();
        let scratch = ScratchDir::create()?;
        unpack(input, scratch.path(), &self.options, &mut NoProgress)?;
        let document = locate_document(scratch.path(), &self.options)?;
        let bytes = std::fs::read(document.to_path_under(scratch.path()))?;
        let placemarks = survey(&bytes)?;
        scratch.close();
        Ok(Listing {
            document,
            placemarks,
        })
    }

    fn execute(
        &self,
        input: &Path,
        output: &Path,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<RenameReport> {
        let scratch = ScratchDir::create()?;
        let root = scratch.path();

        let unpacked = unpack(input, root, &self.options, reporter)?;
        reporter.on_state(&PipelineState::Unpacked {
            files: unpacked.files.len(),
        });

        let document = locate_document(root, &self.options)?;
        reporter.on_state(&PipelineState::DocumentLocated {
            path: document.clone(),
        });

        let rewritten = rewrite_file(&document.to_path_under(root), &self.options.label_prefix)?;
        reporter.on_state(&PipelineState::Rewritten {
            placemarks: rewritten.placemarks,
        });

        let packed = repack::repack(
            root,
            &document,
            output,
            &unpacked,
            self.options.compression,
            reporter,
        )?;
        reporter.on_state(&PipelineState::Repacked {
            entries: packed.entries_written,
        });

        scratch.close();
        Ok(RenameReport {
            placemarks_renamed: rewritten.placemarks,
            names_inserted: rewritten.names_inserted,
            entries_repacked: packed.entries_written,
            document,
            output: output.to_path_buf(),
        })
    }
}

/// The plain success/failure result of [`rename_kmz`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the output archive was written.
    pub ok: bool,
    /// A message suitable for end users.
    pub message: String,
    /// The failure reason, `None` on success.
    pub reason: Option<FailureReason>,
}

impl Outcome {
    fn success(placemarks: usize) -> Self {
        Self {
            ok: true,
            message: format!("renamed {} placemarks", placemarks),
            reason: None,
        }
    }

    fn failure(reason: FailureReason) -> Self {
        Self {
            ok: false,
            message: reason.message().to_string(),
            reason: Some(reason),
        }
    }
}

impl From<Result<RenameReport>> for Outcome {
    fn from(result: Result<RenameReport>) -> Self {
        match result {
            Ok(report) => Self::success(report.placemarks_renamed),
            Err(e) => Self::failure(e.reason()),
        }
    }
}

/// Renames the placemarks of `input` into `output` with default options.
///
/// No error escapes this function: every failure becomes an [`Outcome`]
/// with `ok == false` and a fixed message for its [`FailureReason`]. The
/// detailed error is logged at warn level.
///
/// # Example
///
/// ```rust,no_run
/// let outcome = kmz_renamer::rename_kmz("points.kmz", "RENAMED_points.kmz");
/// if !outcome.ok {
///     eprintln!("{}", outcome.message);
/// }
/// ```
pub fn rename_kmz(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Outcome {
    let input = input.as_ref();
    let result = Renamer::default().run(input, output);
    if let Err(e) = &result {
        log_failure(input, e);
    }
    result.into()
}

fn log_failure(input: &Path, error: &Error) {
    if error.is_nothing_to_rename() {
        log::info!("'{}': {}", input.display(), error);
    } else {
        log::warn!("'{}': {}", input.display(), error);
    }
}
