/// TextSleuth Core — request model, file discovery and the cancellable scanner.
///
/// This crate contains all search logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`] — The immutable search request.
/// - [`scanner`] — Background scanning with event streaming and cancellation.
/// - [`error`] — Errors that prevent a scan from starting.
pub mod error;
pub mod model;
pub mod scanner;

pub use error::ScanError;
pub use model::ScanRequest;
pub use scanner::progress::ScanEvent;
pub use scanner::{scan, start_scan, CancelToken, ScanHandle, ScanStatus};
