/// File discovery — collects every file under the root that passes the
/// request's extension filter.
///
/// Uses `jwalk` in serial mode with name sorting, so the returned list (and
/// therefore the order in which files are searched and reported) is
/// deterministic. Symlinks are not followed, which rules out link loops.
/// Directories that cannot be read are reported through `on_error` and the
/// walk carries on.
use crate::model::ScanRequest;
use crate::scanner::CancelToken;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Result of walking the root directory.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Matching files in enumeration order.
    pub files: Vec<PathBuf>,
    /// `true` if the walk was abandoned because cancellation was requested.
    pub cancelled: bool,
}

/// Walk `request.root_path()` and collect matching files.
///
/// The cancel token is polled once per directory entry.
pub fn discover_files(
    request: &ScanRequest,
    cancel: &CancelToken,
    mut on_error: impl FnMut(PathBuf, String),
) -> Discovery {
    let root = request.root_path();
    let walker = jwalk::WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::Serial);

    let mut discovery = Discovery::default();

    for entry_result in walker {
        if cancel.is_cancelled() {
            debug!("Discovery cancelled after {} files", discovery.files.len());
            discovery.cancelled = true;
            return discovery;
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                // jwalk errors are typically access-denied on directories.
                let err_path = err
                    .path()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| root.to_path_buf());
                warn!("Cannot read {}: {err}", err_path.display());
                on_error(err_path, err.to_string());
                continue;
            }
        };

        // A directory whose listing failed still arrives as an `Ok` entry.
        if let Some(err) = &entry.read_children_error {
            let dir_path = entry.path();
            warn!("Cannot read {}: {err}", dir_path.display());
            on_error(dir_path, err.to_string());
        }

        let file_type = entry.file_type();
        if file_type.is_dir() || !request.matches_file_name(entry.file_name()) {
            continue;
        }

        let path = entry.path();
        // Links are not followed, but a link to a directory is still not a file.
        if file_type.is_symlink() && std::fs::metadata(&path).is_ok_and(|m| m.is_dir()) {
            debug!("Skipping directory link {}", path.display());
            continue;
        }
        discovery.files.push(path);
    }

    debug!(
        "Discovered {} {} files under {}",
        discovery.files.len(),
        request.file_extension_filter(),
        root.display()
    );
    discovery
}
