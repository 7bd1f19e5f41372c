//! Output formatting for CLI operations.

use serde_json::json;

use kmz_renamer::{Error, Listing, RenameReport};

/// Trait for output formatting
pub trait OutputFormatter {
    /// Formats the result of a rename
    fn format_report(&self, report: &RenameReport) -> String;

    /// Formats the placemarks of an archive
    fn format_listing(&self, listing: &Listing) -> String;

    /// Formats a failure
    fn format_error(&self, error: &Error) -> String;
}

/// Human-readable output formatter
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn format_report(&self, report: &RenameReport) -> String {
        let mut output = format!(
            "Renamed {} placemarks in {} ({} names inserted)\n",
            report.placemarks_renamed, report.document, report.names_inserted
        );
        output.push_str(&format!(
            "Wrote {} entries to {}\n",
            report.entries_repacked,
            report.output.display()
        ));
        output
    }

    fn format_listing(&self, listing: &Listing) -> String {
        let mut output = format!("Document: {}\n", listing.document);
        output.push_str(&format!("{:>6} {:>5} {}\n", "#", "Depth", "Name"));
        output.push_str(&"-".repeat(50));
        output.push('\n');

        for placemark in &listing.placemarks {
            let name = match &placemark.name {
                Some(name) if name.trim().is_empty() => "(empty)".to_string(),
                Some(name) => truncate(name.trim(), 60),
                None => "-".to_string(),
            };
            output.push_str(&format!(
                "{:>6} {:>5} {}\n",
                placemark.ordinal, placemark.depth, name
            ));
        }

        output.push_str(&"-".repeat(50));
        output.push('\n');
        let unnamed = listing
            .placemarks
            .iter()
            .filter(|p| p.name.is_none())
            .count();
        output.push_str(&format!(
            "{} placemarks, {} without a name\n",
            listing.placemarks.len(),
            unnamed
        ));
        output
    }

    fn format_error(&self, error: &Error) -> String {
        format!("Error: {}\n", error.reason())
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RenameReport) -> String {
        let obj = json!({
            "ok": true,
            "document": report.document.as_str(),
            "placemarks_renamed": report.placemarks_renamed,
            "names_inserted": report.names_inserted,
            "entries_repacked": report.entries_repacked,
            "output": report.output.display().to_string(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_listing(&self, listing: &Listing) -> String {
        let placemarks: Vec<_> = listing
            .placemarks
            .iter()
            .map(|p| {
                json!({
                    "ordinal": p.ordinal,
                    "name": p.name,
                    "depth": p.depth,
                })
            })
            .collect();
        let obj = json!({
            "document": listing.document.as_str(),
            "placemarks": placemarks,
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_error(&self, error: &Error) -> String {
        let reason = error.reason();
        let obj = json!({
            "ok": false,
            "reason": format!("{:?}", reason),
            "message": reason.message(),
            "detail": error.to_string(),
        });

        serde_json::to_string_pretty(&obj).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Creates the appropriate formatter based on output format
pub fn create_formatter(format: super::OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        super::OutputFormat::Human => Box::new(HumanFormatter),
        super::OutputFormat::Json => Box::new(JsonFormatter),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
