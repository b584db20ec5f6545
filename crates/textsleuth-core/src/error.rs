/// Errors that stop a scan before it starts.
///
/// Everything that can go wrong *during* a scan (unreadable files, walk
/// errors, worker panics) is downgraded to a [`ScanEvent`](crate::ScanEvent)
/// instead, so a running scan never returns an error.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("folder not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("not a folder: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("the text to find must not be empty")]
    EmptyNeedle,

    #[error("failed to spawn scanner thread: {0}")]
    Spawn(#[source] std::io::Error),
}
