/// Scan events — lightweight messages sent from the scan thread to the
/// controller via a crossbeam channel.
///
/// A scan emits any number of `Progress`, `Match` and `FileError` events
/// followed by exactly one terminal event (`NoFiles`, `Completed`,
/// `Stopped` or `Failed`). Nothing is emitted after the terminal event.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Share of discovered files processed so far, 0..=100.
    Progress { percent: u8 },
    /// A line containing the needle. One event per line, however many
    /// occurrences the line holds.
    Match {
        file_path: PathBuf,
        /// 1-based.
        line_number: u64,
        /// Line content without its trailing line terminator.
        line_text: String,
    },
    /// A file or directory that could not be read. Non-fatal.
    FileError { file_path: PathBuf, message: String },
    /// No file under the root passed the extension filter.
    NoFiles,
    /// Every file was processed.
    Completed { matched: bool },
    /// Cancellation was observed before all files were processed.
    Stopped,
    /// The worker hit an unexpected failure and gave up.
    Failed { message: String },
}

impl ScanEvent {
    /// `true` for the event that ends a scan's event sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NoFiles | Self::Completed { .. } | Self::Stopped | Self::Failed { .. }
        )
    }
}

/// Percentage of `total` files processed, rounded to the nearest integer.
///
/// Clamped to 99 while `processed < total` so that 100 is only ever reported
/// once the final file is done. `total == 0` reports 100.
pub fn percent_complete(processed: usize, total: usize) -> u8 {
    if total == 0 || processed >= total {
        return 100;
    }
    let rounded = (processed as u128 * 100 + total as u128 / 2) / total as u128;
    rounded.min(99) as u8
}
