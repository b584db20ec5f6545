/// Scanner module — orchestrates one text search.
///
/// A scan runs in two phases on a single background thread:
/// - **Discovery:** a serial `jwalk` traversal collects every file that
///   passes the extension filter.
/// - **Search:** the files are opened one at a time, in discovery order, and
///   searched line by line for the needle.
///
/// Progress, matches and per-file errors are streamed to the controller as
/// [`ScanEvent`]s over an unbounded crossbeam channel, so the scan thread
/// never waits on the consumer. Cancellation is cooperative: the shared
/// [`CancelToken`] is polled between directory entries, files and lines.
pub mod cancel;
pub mod discovery;
pub mod progress;
pub mod search;

pub use cancel::CancelToken;

use crate::error::ScanError;
use crate::model::ScanRequest;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use progress::{percent_complete, ScanEvent};
use search::FileOutcome;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Lifecycle of a scan: `Running` until the terminal event is sent, then
/// one of the finished states for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Running,
    NoFiles,
    Completed { matched: bool },
    Stopped,
    Failed,
}

impl ScanStatus {
    /// The status a terminal event moves the scan into.
    fn after(event: &ScanEvent) -> Option<Self> {
        match event {
            ScanEvent::NoFiles => Some(Self::NoFiles),
            ScanEvent::Completed { matched } => Some(Self::Completed { matched: *matched }),
            ScanEvent::Stopped => Some(Self::Stopped),
            ScanEvent::Failed { .. } => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_finished(self) -> bool {
        self != Self::Running
    }
}

/// Handle to a running or finished scan. Allows cancellation, joining and
/// receiving events.
///
/// One handle drives exactly one scan; a new search needs a new handle from
/// [`start_scan`]. Dropping the handle cancels the scan and waits for the
/// thread to exit.
pub struct ScanHandle {
    /// Receiver for events from the scan thread. Disconnects once the
    /// terminal event has been sent and the thread has exited.
    pub events: Receiver<ScanEvent>,
    cancel: CancelToken,
    status: Arc<RwLock<ScanStatus>>,
    /// Join handle for the scan thread; `None` once joined.
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ScanHandle {
    /// Request the scan to stop as soon as possible. A no-op once the scan
    /// has finished.
    pub fn cancel(&self) {
        if self.cancel.cancel() {
            debug!("Scan cancellation requested");
        }
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A token that cancels this scan from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn status(&self) -> ScanStatus {
        *self.status.read()
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_finished()
    }

    /// Block until the scan thread has sent its terminal event and exited.
    ///
    /// Idempotent: later calls return immediately. Concurrent callers all
    /// wait for the same thread.
    pub fn join(&self) {
        let mut guard = self.thread.lock();
        if let Some(handle) = guard.take() {
            if handle.join().is_err() {
                warn!("Scan thread terminated abnormally");
            }
        }
    }
}

impl Drop for ScanHandle {
    fn drop(&mut self) {
        if !self.is_finished() {
            self.cancel();
        }
        self.join();
    }
}

/// Validate the request's root and start a scan on a background thread.
///
/// Returns a `ScanHandle` for receiving events and requesting
/// cancellation. A missing root or a root that is not a directory is
/// reported here and no thread is started.
pub fn start_scan(request: ScanRequest) -> Result<ScanHandle, ScanError> {
    validate_root(request.root_path())?;

    let (event_tx, events) = crossbeam_channel::unbounded::<ScanEvent>();
    let cancel = CancelToken::new();
    let status = Arc::new(RwLock::new(ScanStatus::Running));

    let thread = {
        let cancel = cancel.clone();
        let status = status.clone();
        thread::Builder::new()
            .name("textsleuth-scanner".into())
            .spawn(move || run_worker(request, cancel, event_tx, status))
            .map_err(ScanError::Spawn)?
    };

    Ok(ScanHandle {
        events,
        cancel,
        status,
        thread: Mutex::new(Some(thread)),
    })
}

fn validate_root(root: &Path) -> Result<(), ScanError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ScanError::NotADirectory(root.to_path_buf())),
        Err(_) => Err(ScanError::DirectoryNotFound(root.to_path_buf())),
    }
}

/// Thread body: run the scan and forward its events.
fn run_worker(
    request: ScanRequest,
    cancel: CancelToken,
    event_tx: Sender<ScanEvent>,
    status: Arc<RwLock<ScanStatus>>,
) {
    run_guarded(&event_tx, &status, |emit| scan(&request, &cancel, emit));
}

/// Run `body`, forwarding each event it emits to the channel and tracking
/// status. A panic becomes a terminal `Failed` event unless a terminal event
/// already went out.
fn run_guarded(
    event_tx: &Sender<ScanEvent>,
    status: &RwLock<ScanStatus>,
    body: impl FnOnce(&mut dyn FnMut(ScanEvent)),
) {
    let mut terminal_sent = false;

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        body(&mut |event| {
            if let Some(next) = ScanStatus::after(&event) {
                *status.write() = next;
                terminal_sent = true;
            }
            // The receiver may already be gone; the scan still runs to its end.
            let _ = event_tx.send(event);
        });
    }));

    if let Err(payload) = result {
        let message = panic_message(payload.as_ref());
        error!("Scan thread panicked: {message}");
        if !terminal_sent {
            *status.write() = ScanStatus::Failed;
            let _ = event_tx.send(ScanEvent::Failed { message });
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "scan thread panicked unexpectedly".to_string()
    }
}

/// Run one scan synchronously on the calling thread.
///
/// Every event is handed to `on_event` in order; the last one is always
/// terminal (`NoFiles`, `Completed` or `Stopped`). A file that cannot be
/// read produces a `FileError` and the scan moves on to the next file.
pub fn scan(request: &ScanRequest, cancel: &CancelToken, mut on_event: impl FnMut(ScanEvent)) {
    let start = Instant::now();
    info!(
        "Starting scan of {} for {} files",
        request.root_path().display(),
        request.file_extension_filter()
    );

    let discovery = discovery::discover_files(request, cancel, |file_path, message| {
        on_event(ScanEvent::FileError { file_path, message })
    });

    if discovery.cancelled {
        info!("Scan stopped during discovery");
        on_event(ScanEvent::Stopped);
        return;
    }

    let total = discovery.files.len();
    if total == 0 {
        info!("No matching files under {}", request.root_path().display());
        on_event(ScanEvent::NoFiles);
        return;
    }

    let mut matched_lines: u64 = 0;
    let mut error_count: u64 = 0;
    let mut stopped = false;

    for (idx, path) in discovery.files.iter().enumerate() {
        if cancel.is_cancelled() {
            stopped = true;
            break;
        }

        let outcome = search::search_file(path, request.needle(), cancel, |line_number, line_text| {
            on_event(ScanEvent::Match {
                file_path: path.clone(),
                line_number,
                line_text,
            })
        });

        match outcome {
            Ok(FileOutcome::Finished { matches }) => {
                matched_lines += matches;
                debug!("Searched {} ({matches} matching lines)", path.display());
            }
            Ok(FileOutcome::Interrupted { matches }) => {
                matched_lines += matches;
                stopped = true;
                break;
            }
            Err(err) => {
                error_count += 1;
                warn!("Error reading {}: {err}", path.display());
                on_event(ScanEvent::FileError {
                    file_path: path.clone(),
                    message: err.to_string(),
                });
            }
        }

        on_event(ScanEvent::Progress {
            percent: percent_complete(idx + 1, total),
        });
    }

    let duration = start.elapsed();
    if stopped {
        info!("Scan stopped after {duration:?} ({matched_lines} matching lines so far)");
        on_event(ScanEvent::Stopped);
    } else {
        info!(
            "Scan complete: {total} files, {matched_lines} matching lines, {error_count} errors in {duration:?}"
        );
        on_event(ScanEvent::Completed {
            matched: matched_lines > 0,
        });
    }
}
