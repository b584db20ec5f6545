/// Data model for a TextSleuth search.
///
/// Re-exports the immutable request that a scan is started with.
pub mod request;

pub use request::{ScanRequest, DEFAULT_EXTENSION};
