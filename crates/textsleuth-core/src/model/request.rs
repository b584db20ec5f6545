/// The immutable description of one search.
///
/// A `ScanRequest` can only be built through [`ScanRequest::new`] (or
/// deserialised through the same validation), so a request in hand always
/// has a non-empty needle and a normalised extension filter.
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extension filter used when none is given.
pub const DEFAULT_EXTENSION: &str = ".txt";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScanRequest")]
pub struct ScanRequest {
    root_path: PathBuf,
    needle: String,
    /// Lower-cased, always starts with `.` unless empty (empty = every file).
    file_extension_filter: String,
}

/// Unvalidated wire shape; converted through [`ScanRequest::new`].
#[derive(Deserialize)]
struct RawScanRequest {
    root_path: PathBuf,
    needle: String,
    #[serde(default = "default_extension")]
    file_extension_filter: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl TryFrom<RawScanRequest> for ScanRequest {
    type Error = ScanError;

    fn try_from(raw: RawScanRequest) -> Result<Self, Self::Error> {
        ScanRequest::new(raw.root_path, raw.needle, &raw.file_extension_filter)
    }
}

impl ScanRequest {
    /// Build a request. The needle is used verbatim (no trimming); an empty
    /// needle is rejected. `"txt"` and `".TXT"` both normalise to `".txt"`.
    ///
    /// The root path is not checked here; [`start_scan`](crate::start_scan)
    /// validates it when the scan is launched.
    pub fn new(
        root_path: impl Into<PathBuf>,
        needle: impl Into<String>,
        file_extension_filter: &str,
    ) -> Result<Self, ScanError> {
        let needle = needle.into();
        if needle.is_empty() {
            return Err(ScanError::EmptyNeedle);
        }
        Ok(Self {
            root_path: root_path.into(),
            needle,
            file_extension_filter: normalise_extension(file_extension_filter),
        })
    }

    /// Shorthand for a request using [`DEFAULT_EXTENSION`].
    pub fn with_default_extension(
        root_path: impl Into<PathBuf>,
        needle: impl Into<String>,
    ) -> Result<Self, ScanError> {
        Self::new(root_path, needle, DEFAULT_EXTENSION)
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn file_extension_filter(&self) -> &str {
        &self.file_extension_filter
    }

    /// Whether a file name passes the extension filter (case-insensitive).
    pub fn matches_file_name(&self, name: &OsStr) -> bool {
        if self.file_extension_filter.is_empty() {
            return true;
        }
        name.to_string_lossy()
            .to_lowercase()
            .ends_with(&self.file_extension_filter)
    }
}

fn normalise_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() || ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}
