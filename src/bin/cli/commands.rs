//! Command implementations for the CLI tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use kmz_renamer::{Compression, Error, RenameOptions, Renamer};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, reason_to_exit_code};
use crate::output::create_formatter;
use crate::progress::CliProgress;

/// Prefix of the default output file name.
const OUTPUT_PREFIX: &str = "RENAMED_";

/// Configuration for the rename command.
pub struct RenameConfig<'a> {
    pub input: &'a Path,
    pub output: Option<&'a Path>,
    pub prefix: String,
    pub document_name: String,
    pub stored: bool,
    pub level: Option<u8>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Rename command implementation
pub fn rename(config: &RenameConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    let output = match config.output {
        Some(path) => path.to_path_buf(),
        None => match default_output_path(config.input) {
            Some(path) => path,
            None => {
                eprintln!(
                    "Error: cannot derive an output name from '{}'",
                    config.input.display()
                );
                return ExitCode::BadArgs;
            }
        },
    };
    if output == config.input {
        eprintln!("Error: output must differ from the input");
        return ExitCode::BadArgs;
    }

    let compression = match (config.stored, config.level) {
        (true, _) => Compression::Stored,
        (false, Some(level)) => Compression::deflated(level),
        (false, None) => Compression::default(),
    };
    let options = RenameOptions::new()
        .label_prefix(config.prefix.clone())
        .document_name(config.document_name.clone())
        .compression(compression);

    let mut progress = CliProgress::new(config.quiet || config.format == OutputFormat::Json);
    match Renamer::new(options).run_with_progress(config.input, &output, &mut progress) {
        Ok(report) => {
            print!("{}", formatter.format_report(&report));
            ExitCode::Success
        }
        Err(e) => report_error(&*formatter, &e),
    }
}

/// List command implementation
pub fn list(input: &Path, document_name: String, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);
    let options = RenameOptions::new().document_name(document_name);

    match Renamer::new(options).list(input) {
        Ok(listing) => {
            print!("{}", formatter.format_listing(&listing));
            ExitCode::Success
        }
        Err(e) => report_error(&*formatter, &e),
    }
}

fn report_error(formatter: &dyn crate::output::OutputFormatter, error: &Error) -> ExitCode {
    log::debug!("{:?}", error);
    let message = formatter.format_error(error);
    if error.is_nothing_to_rename() {
        print!("{}", message);
    } else {
        eprint!("{}", message);
    }
    reason_to_exit_code(error.reason())
}

/// Returns `RENAMED_<file name>` in the input's directory.
fn default_output_path(input: &Path) -> Option<PathBuf> {
    let name = input.file_name()?;
    let mut renamed = OsString::from(OUTPUT_PREFIX);
    renamed.push(name);
    Some(input.with_file_name(renamed))
}
