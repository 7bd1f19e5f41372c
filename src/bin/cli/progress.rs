//! Progress spinner for CLI operations.

use indicatif::{ProgressBar, ProgressStyle};
use kmz_renamer::{ArchivePath, PipelineState, ProgressReporter};
use std::time::Duration;

/// Progress display for the rename pipeline
pub struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    /// Creates a new progress display
    pub fn new(quiet: bool) -> Self {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };

        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn on_state(&mut self, state: &PipelineState) {
        match state {
            PipelineState::Done => self.spinner.finish_and_clear(),
            PipelineState::Failed(_) => self.spinner.abandon(),
            other => self.spinner.set_message(other.to_string()),
        }
    }

    fn on_entry(&mut self, path: &ArchivePath, _size: u64) {
        let name = path.as_str();
        // Truncate long names
        let display_name = if name.chars().count() > 40 {
            let tail: String = name
                .chars()
                .rev()
                .take(37)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("...{}", tail)
        } else {
            name.to_string()
        };
        self.spinner.set_message(display_name);
    }
}
