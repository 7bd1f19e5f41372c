//! Exit codes for the CLI tool.

use kmz_renamer::FailureReason;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Input archive or document could not be used
pub const BAD_INPUT: i32 = 3;
/// Archive was readable but had nothing to rename
pub const NOTHING_TO_RENAME: i32 = 4;
/// Output archive could not be written
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadInput,
    NothingToRename,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadInput => BAD_INPUT,
            Self::NothingToRename => NOTHING_TO_RENAME,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a failure reason to an exit code
pub fn reason_to_exit_code(reason: FailureReason) -> ExitCode {
    match reason {
        FailureReason::ArchiveUnreadable | FailureReason::MalformedMarkup => ExitCode::BadInput,
        FailureReason::DocumentNotFound | FailureReason::NoPlacemarksFound => {
            ExitCode::NothingToRename
        }
        FailureReason::OutputWriteError => ExitCode::IoError,
        FailureReason::ScratchFailure => ExitCode::FatalError,
        // Future reasons - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
