/// Human-readable result text and CSV export.
///
/// The message wording is what the result view shows, one entry per
/// event. Kept in one place so every frontend renders the same text.
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One matching line, as kept by the controller and written to CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub file_path: String,
    pub line_number: u64,
    pub line_text: String,
}

pub fn match_message(needle: &str, file_path: &Path, line_number: u64, line_text: &str) -> String {
    format!(
        "Found '{needle}' in:\nFile: {}\nLine: {line_number}\nText: {}",
        file_path.display(),
        line_text.trim()
    )
}

pub fn file_error_message(file_path: &Path, message: &str) -> String {
    format!("Error reading {}: {message}", file_path.display())
}

pub fn no_files_message(extension: &str) -> String {
    if extension.is_empty() {
        "No files found in the selected folder.".to_string()
    } else {
        format!("No {extension} files found in the selected folder.")
    }
}

pub fn finished_message(matched: bool) -> &'static str {
    if matched {
        "Search finished. Text found at least once."
    } else {
        "Search finished. Text NOT found in any file."
    }
}

pub const STOPPED_MESSAGE: &str = "Search stopped by user.";

pub fn failed_message(message: &str) -> String {
    format!("Unexpected error: {message}")
}

/// Write `matches` as CSV with a `file_path,line_number,line_text` header.
pub fn export_matches_csv<W: Write>(writer: W, matches: &[MatchRecord]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if matches.is_empty() {
        wtr.write_record(["file_path", "line_number", "line_text"])?;
    }
    for record in matches {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
