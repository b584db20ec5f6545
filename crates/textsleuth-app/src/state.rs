/// Search state management.
///
/// Centralises all mutable state a frontend reads and writes: the inputs,
/// the progress value, the result log and the enable/disable toggles of
/// the start/stop controls. The scan thread communicates via its event
/// channel; state updates happen in `process_scan_messages()`, which a
/// frontend calls once per frame or poll tick.
use crate::report::{self, MatchRecord};
use chrono::{DateTime, Local, TimeDelta};
use std::path::PathBuf;
use textsleuth_core::model::DEFAULT_EXTENSION;
use textsleuth_core::scanner::{self, CancelToken, ScanHandle};
use textsleuth_core::{ScanError, ScanEvent, ScanRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

/// The current phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    /// No search has run yet.
    Idle,
    /// A scan is in flight; inputs are locked.
    Searching,
    /// The last search ended; its results stay visible.
    Finished,
}

/// How the last search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    NoFiles,
    Found,
    NotFound,
    Stopped,
    Failed(String),
}

/// Reasons `start_search` refuses to start.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Please enter the text to find.")]
    EmptyNeedle,

    #[error("Please select a folder first.")]
    NoFolder,

    #[error("A search is already running.")]
    AlreadySearching,

    #[error("{0}")]
    Scan(#[from] ScanError),
}

/// Maximum number of scan events drained from the channel per call.
///
/// Prevents a backlog (a folder full of matching lines) from blocking the
/// caller's render loop for a perceptible duration.
pub const MAX_MESSAGES_PER_FRAME: usize = 500;

/// Maximum entries kept in the result log. Later entries are counted in
/// `log_dropped` instead of stored.
pub const MAX_LOG_ENTRIES: usize = 10_000;

/// Maximum per-file errors retained for display.
pub const MAX_FILE_ERRORS: usize = 1_000;

/// All controller state.
pub struct SearchState {
    // ── Inputs ─────────────────────────────────────────
    pub folder: Option<PathBuf>,
    pub needle_input: String,
    pub extension: String,

    // ── Search ─────────────────────────────────────────
    pub phase: AppPhase,
    pub scan_handle: Option<ScanHandle>,
    /// Needle of the running (or last) search, after trimming.
    pub active_needle: String,
    pub progress_percent: u8,
    pub started_at: Option<DateTime<Local>>,
    pub finished_at: Option<DateTime<Local>>,

    // ── Results ────────────────────────────────────────
    pub result_log: Vec<String>,
    pub log_dropped: u64,
    pub matches: Vec<MatchRecord>,
    pub file_errors: Vec<(String, String)>,
    pub error_count: u64,
    pub outcome: Option<SearchOutcome>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            folder: None,
            needle_input: String::new(),
            extension: DEFAULT_EXTENSION.to_string(),
            phase: AppPhase::Idle,
            scan_handle: None,
            active_needle: String::new(),
            progress_percent: 0,
            started_at: None,
            finished_at: None,
            result_log: Vec::new(),
            log_dropped: 0,
            matches: Vec::new(),
            file_errors: Vec::new(),
            error_count: 0,
            outcome: None,
        }
    }

    // ── Inputs ─────────────────────────────────────────

    /// Ignored while a search is running.
    pub fn select_folder(&mut self, folder: PathBuf) {
        if self.inputs_enabled() {
            self.folder = Some(folder);
        }
    }

    pub fn set_needle(&mut self, text: &str) {
        if self.inputs_enabled() {
            self.needle_input = text.to_string();
        }
    }

    pub fn set_extension(&mut self, ext: &str) {
        if self.inputs_enabled() {
            self.extension = ext.to_string();
        }
    }

    // ── Enablement ─────────────────────────────────────

    pub fn can_start(&self) -> bool {
        self.phase != AppPhase::Searching && self.folder.is_some()
    }

    pub fn can_stop(&self) -> bool {
        self.phase == AppPhase::Searching
    }

    pub fn inputs_enabled(&self) -> bool {
        self.phase != AppPhase::Searching
    }

    // ── Lifecycle ──────────────────────────────────────

    /// Validate the inputs and start a new scan on a fresh handle.
    ///
    /// The needle is trimmed of surrounding whitespace first. On error the
    /// previous results are left untouched.
    pub fn start_search(&mut self) -> Result<(), InputError> {
        if self.phase == AppPhase::Searching {
            return Err(InputError::AlreadySearching);
        }
        let needle = self.needle_input.trim();
        if needle.is_empty() {
            return Err(InputError::EmptyNeedle);
        }
        let folder = self.folder.clone().ok_or(InputError::NoFolder)?;

        let request = ScanRequest::new(folder, needle, &self.extension)?;
        let handle = scanner::start_scan(request.clone())?;

        info!(
            "Search for '{}' started in {}",
            request.needle(),
            request.root_path().display()
        );

        self.active_needle = request.needle().to_string();
        self.extension = request.file_extension_filter().to_string();
        self.phase = AppPhase::Searching;
        self.progress_percent = 0;
        self.started_at = Some(Local::now());
        self.finished_at = None;
        self.result_log.clear();
        self.log_dropped = 0;
        self.matches.clear();
        self.file_errors.clear();
        self.error_count = 0;
        self.outcome = None;
        self.scan_handle = Some(handle);
        Ok(())
    }

    /// Stop the running search and wait for the scan thread to finish.
    ///
    /// Any events still queued are applied, so the log ends with the scan's
    /// own terminal message. If the scan had already finished, its result
    /// stands. No-op when nothing is running.
    pub fn stop_search(&mut self) {
        let handle = match self.scan_handle.take() {
            Some(h) => h,
            None => return,
        };
        handle.cancel();
        handle.join();

        for event in handle.events.try_iter() {
            if let Some(outcome) = self.apply_event(event) {
                self.finish(outcome);
            }
        }
        // A worker that died without a terminal event still ends the search.
        if self.phase == AppPhase::Searching {
            self.push_log(report::STOPPED_MESSAGE.to_string());
            self.finish(SearchOutcome::Stopped);
        }
    }

    /// A token for stopping the running search from another thread.
    pub fn cancel_token(&self) -> Option<CancelToken> {
        self.scan_handle.as_ref().map(ScanHandle::cancel_token)
    }

    /// Process pending scan events. Call once per frame / poll tick.
    ///
    /// Returns `true` if anything changed.
    pub fn process_scan_messages(&mut self) -> bool {
        self.process_scan_messages_with(|_| {})
    }

    /// Like [`process_scan_messages`](Self::process_scan_messages), also
    /// handing each raw event to `observe` before it is applied.
    pub fn process_scan_messages_with(&mut self, mut observe: impl FnMut(&ScanEvent)) -> bool {
        let mut changed = false;
        let mut messages_this_frame = 0usize;

        while messages_this_frame < MAX_MESSAGES_PER_FRAME {
            let event = match self.scan_handle.as_ref().map(|h| h.events.try_recv()) {
                Some(Ok(e)) => e,
                // The worker is gone without a terminal event; end the search
                // the way a stop would rather than wait forever.
                Some(Err(err)) if err.is_disconnected() => {
                    warn!("Scan ended without a final event");
                    self.stop_search();
                    changed = true;
                    break;
                }
                _ => break,
            };
            messages_this_frame += 1;
            changed = true;
            observe(&event);
            if let Some(outcome) = self.apply_event(event) {
                if let Some(handle) = self.scan_handle.take() {
                    handle.join();
                }
                self.finish(outcome);
                break;
            }
        }
        changed
    }

    /// Time the last search took, or has taken so far.
    pub fn elapsed(&self) -> Option<TimeDelta> {
        let start = self.started_at?;
        Some(self.finished_at.unwrap_or_else(Local::now) - start)
    }

    /// Apply one event; returns the outcome if it was terminal.
    fn apply_event(&mut self, event: ScanEvent) -> Option<SearchOutcome> {
        match event {
            ScanEvent::Progress { percent } => {
                self.progress_percent = percent;
                None
            }
            ScanEvent::Match {
                file_path,
                line_number,
                line_text,
            } => {
                self.push_log(report::match_message(
                    &self.active_needle,
                    &file_path,
                    line_number,
                    &line_text,
                ));
                self.matches.push(MatchRecord {
                    file_path: file_path.to_string_lossy().into_owned(),
                    line_number,
                    line_text,
                });
                None
            }
            ScanEvent::FileError { file_path, message } => {
                self.error_count += 1;
                self.push_log(report::file_error_message(&file_path, &message));
                if self.file_errors.len() < MAX_FILE_ERRORS {
                    self.file_errors
                        .push((file_path.to_string_lossy().into_owned(), message));
                }
                None
            }
            ScanEvent::NoFiles => {
                self.push_log(report::no_files_message(&self.extension));
                Some(SearchOutcome::NoFiles)
            }
            ScanEvent::Completed { matched } => {
                self.push_log(report::finished_message(matched).to_string());
                Some(if matched {
                    SearchOutcome::Found
                } else {
                    SearchOutcome::NotFound
                })
            }
            ScanEvent::Stopped => {
                self.push_log(report::STOPPED_MESSAGE.to_string());
                Some(SearchOutcome::Stopped)
            }
            ScanEvent::Failed { message } => {
                self.push_log(report::failed_message(&message));
                Some(SearchOutcome::Failed(message))
            }
        }
    }

    fn finish(&mut self, outcome: SearchOutcome) {
        debug!("Search finished: {outcome:?}");
        self.phase = AppPhase::Finished;
        self.finished_at = Some(Local::now());
        self.outcome = Some(outcome);
    }

    fn push_log(&mut self, entry: String) {
        if self.result_log.len() < MAX_LOG_ENTRIES {
            self.result_log.push(entry);
        } else {
            self.log_dropped += 1;
        }
    }
}
