//! CLI tool for renaming placemarks in KMZ archives.

mod commands;
mod exit_codes;
mod output;
mod progress;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Rename every placemark in a KMZ archive to a positional label
#[derive(Parser)]
#[command(name = "kmz-renamer")]
#[command(author, version, about = "Rename KMZ placemarks to positional labels", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log level for diagnostics on stderr
    #[arg(long, value_enum, default_value = "warn", global = true, env = "KMZ_RENAMER_LOG")]
    log_level: LogLevel,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename placemarks and write a new archive (alias: r)
    #[command(alias = "r")]
    Rename {
        /// KMZ archive to read
        input: PathBuf,

        /// Output archive (default: RENAMED_<input name> next to the input)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Text placed before each placemark number
        #[arg(short = 'p', long, default_value = kmz_renamer::options::DEFAULT_LABEL_PREFIX)]
        prefix: String,

        /// File name of the KML document inside the archive
        #[arg(short = 'd', long, default_value = kmz_renamer::options::DEFAULT_DOCUMENT_NAME)]
        document_name: String,

        /// Store entries without compression
        #[arg(long, conflicts_with = "level")]
        stored: bool,

        /// Deflate compression level (1-9)
        #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=9))]
        level: Option<u8>,
    },

    /// List the placemarks of an archive without changing it (alias: l)
    #[command(alias = "l")]
    List {
        /// KMZ archive to inspect
        input: PathBuf,

        /// File name of the KML document inside the archive
        #[arg(short = 'd', long, default_value = kmz_renamer::options::DEFAULT_DOCUMENT_NAME)]
        document_name: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::BadArgs
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            std::process::exit(code.code());
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(cli.log_level.into())
        .init();

    let exit_code = match cli.command {
        Commands::Rename {
            input,
            output,
            prefix,
            document_name,
            stored,
            level,
        } => commands::rename(&commands::RenameConfig {
            input: &input,
            output: output.as_deref(),
            prefix,
            document_name,
            stored,
            level,
            format: cli.format,
            quiet: cli.quiet,
        }),

        Commands::List {
            input,
            document_name,
        } => commands::list(&input, document_name, cli.format),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_range() {
        assert!(Cli::try_parse_from(["kmz-renamer", "rename", "a.kmz", "-l", "0"]).is_err());
        assert!(Cli::try_parse_from(["kmz-renamer", "rename", "a.kmz", "-l", "10"]).is_err());
        for level in ["1", "9"] {
            let cli = Cli::try_parse_from(["kmz-renamer", "rename", "a.kmz", "-l", level]).unwrap();
            assert!(matches!(cli.command, Commands::Rename { level: Some(_), .. }));
        }
    }
}
