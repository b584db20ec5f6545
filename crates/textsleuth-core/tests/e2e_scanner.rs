/// End-to-end scanner integration tests.
///
/// These tests run the real discovery and search code against a temporary
/// directory, both synchronously through `scan` (deterministic event
/// sequences, cancellation triggered from inside the event callback) and
/// through `start_scan` (real worker thread, channel, join).
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use textsleuth_core::scanner::{scan, start_scan, CancelToken, ScanHandle, ScanStatus};
use textsleuth_core::{ScanError, ScanEvent, ScanRequest};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn request(root: &Path, needle: &str) -> ScanRequest {
    ScanRequest::with_default_extension(root, needle).expect("valid request")
}

/// Run a scan synchronously and collect every event.
fn scan_events(root: &Path, needle: &str) -> Vec<ScanEvent> {
    let mut events = Vec::new();
    scan(&request(root, needle), &CancelToken::new(), |e| events.push(e));
    events
}

fn progress_values(events: &[ScanEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

fn match_lines(events: &[ScanEvent]) -> Vec<(PathBuf, u64, String)> {
    events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::Match {
                file_path,
                line_number,
                line_text,
            } => Some((file_path.clone(), *line_number, line_text.clone())),
            _ => None,
        })
        .collect()
}

/// Drain a threaded scan until the channel disconnects, failing after a
/// generous timeout so a stuck scanner cannot hang the suite.
fn drain(handle: &ScanHandle) -> Vec<ScanEvent> {
    let mut events = Vec::new();
    loop {
        match handle.events.recv_timeout(Duration::from_secs(30)) {
            Ok(e) => events.push(e),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => return events,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                panic!("scanner did not finish within 30 seconds")
            }
        }
    }
}

// ── Synchronous scan ─────────────────────────────────────────────────────────

/// The two-file scenario: one match on line 2 of `a.txt`, progress per file.
#[test]
fn scan_reports_match_and_progress_in_order() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "hello\nsecretpw\n");
    write(&tmp.path().join("b.txt"), "nothing here");

    let events = scan_events(tmp.path(), "secretpw");

    assert_eq!(
        events,
        vec![
            ScanEvent::Match {
                file_path: tmp.path().join("a.txt"),
                line_number: 2,
                line_text: "secretpw".to_string(),
            },
            ScanEvent::Progress { percent: 50 },
            ScanEvent::Progress { percent: 100 },
            ScanEvent::Completed { matched: true },
        ]
    );
}

#[test]
fn scan_without_needle_present_completes_unmatched() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "alpha\n");
    write(&tmp.path().join("sub/b.txt"), "beta\n");
    write(&tmp.path().join("sub/deeper/c.txt"), "gamma\n");

    let events = scan_events(tmp.path(), "secretpw");

    assert!(match_lines(&events).is_empty());
    assert_eq!(progress_values(&events), vec![33, 67, 100]);
    assert_eq!(events.last(), Some(&ScanEvent::Completed { matched: false }));
}

/// Only non-matching extensions: exactly one `NoFiles`, nothing else.
#[test]
fn scan_with_no_matching_files_emits_only_no_files() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("notes.md"), "secretpw");
    write(&tmp.path().join("data.csv"), "secretpw");

    assert_eq!(scan_events(tmp.path(), "secretpw"), vec![ScanEvent::NoFiles]);
}

#[test]
fn scan_of_empty_directory_emits_no_files() {
    let tmp = TempDir::new().unwrap();
    assert_eq!(scan_events(tmp.path(), "x"), vec![ScanEvent::NoFiles]);
}

/// Extension matching ignores case; the needle does not.
#[test]
fn scan_matches_extension_case_insensitively() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("UPPER.TXT"), "Key\nkey\n");

    let events = scan_events(tmp.path(), "key");
    let matches = match_lines(&events);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].1, 2);
}

/// A line repeating the needle is reported once; each matching line once.
#[test]
fn scan_reports_each_matching_line_once() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "pw pw\nx\npw\n");

    let lines: Vec<u64> = match_lines(&scan_events(tmp.path(), "pw"))
        .into_iter()
        .map(|(_, n, _)| n)
        .collect();
    assert_eq!(lines, vec![1, 3]);
}

/// A file that cannot be opened yields one `FileError` and the files on
/// either side are still searched.
#[cfg(unix)]
#[test]
fn unreadable_file_does_not_stop_the_scan() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "secretpw\n");
    // Dangling symlink: listed by the walk, fails on open.
    std::os::unix::fs::symlink(tmp.path().join("missing"), tmp.path().join("b.txt")).unwrap();
    write(&tmp.path().join("c.txt"), "x\nsecretpw\n");

    let events = scan_events(tmp.path(), "secretpw");

    let errors: Vec<&ScanEvent> = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::FileError { .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        ScanEvent::FileError { file_path, .. } if file_path == &tmp.path().join("b.txt")
    ));

    let matched_files: Vec<PathBuf> = match_lines(&events).into_iter().map(|(p, _, _)| p).collect();
    assert_eq!(
        matched_files,
        vec![tmp.path().join("a.txt"), tmp.path().join("c.txt")]
    );
    assert_eq!(progress_values(&events), vec![33, 67, 100]);
    assert_eq!(events.last(), Some(&ScanEvent::Completed { matched: true }));
}

/// A subfolder that cannot be listed is reported once and the files on
/// either side of it are still searched.
#[cfg(unix)]
#[test]
fn locked_subfolder_is_reported_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "secretpw\n");
    let locked = tmp.path().join("b_locked");
    write(&locked.join("inner.txt"), "secretpw\n");
    write(&tmp.path().join("c.txt"), "secretpw\n");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Running as root: the folder stays readable, so there is nothing to report.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let events = scan_events(tmp.path(), "secretpw");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let errors: Vec<&ScanEvent> = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::FileError { .. }))
        .collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors[0],
        ScanEvent::FileError { file_path, .. } if file_path == &locked
    ));

    let matched_files: Vec<PathBuf> = match_lines(&events).into_iter().map(|(p, _, _)| p).collect();
    assert_eq!(
        matched_files,
        vec![tmp.path().join("a.txt"), tmp.path().join("c.txt")]
    );
    assert_eq!(progress_values(&events), vec![50, 100]);
    assert_eq!(events.last(), Some(&ScanEvent::Completed { matched: true }));
}

/// A link to a folder is neither searched nor counted, even when its name
/// carries the extension.
#[cfg(unix)]
#[test]
fn link_to_folder_is_not_counted_as_file() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "secretpw\n");
    let target = tmp.path().join("target");
    fs::create_dir_all(&target).unwrap();
    std::os::unix::fs::symlink(&target, tmp.path().join("link.txt")).unwrap();

    let events = scan_events(tmp.path(), "secretpw");

    assert!(!events
        .iter()
        .any(|e| matches!(e, ScanEvent::FileError { .. })));
    assert_eq!(progress_values(&events), vec![100]);
    assert_eq!(events.last(), Some(&ScanEvent::Completed { matched: true }));
}

/// Cancelling from inside the scan: no `Completed`, exactly one `Stopped`,
/// and no progress for the interrupted file.
#[test]
fn cancel_mid_scan_emits_stopped_and_never_completed() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "secretpw\n");
    write(&tmp.path().join("b.txt"), "secretpw\n");
    write(&tmp.path().join("c.txt"), "secretpw\n");

    let cancel = CancelToken::new();
    let mut events = Vec::new();
    scan(&request(tmp.path(), "secretpw"), &cancel, |e| {
        if matches!(e, ScanEvent::Progress { .. }) {
            cancel.cancel();
        }
        events.push(e);
    });

    assert_eq!(match_lines(&events).len(), 1);
    assert_eq!(progress_values(&events), vec![33]);
    assert_eq!(
        events.iter().filter(|e| **e == ScanEvent::Stopped).count(),
        1
    );
    assert!(!events
        .iter()
        .any(|e| matches!(e, ScanEvent::Completed { .. })));
    assert_eq!(events.last(), Some(&ScanEvent::Stopped));
}

/// Cancel between lines of the last file: 100 is never reported.
#[test]
fn cancel_inside_last_file_never_reaches_100() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("only.txt"), "pw\npw\npw\n");

    let cancel = CancelToken::new();
    let mut events = Vec::new();
    scan(&request(tmp.path(), "pw"), &cancel, |e| {
        if matches!(e, ScanEvent::Match { .. }) {
            cancel.cancel();
        }
        events.push(e);
    });

    assert!(progress_values(&events).is_empty());
    assert_eq!(events.last(), Some(&ScanEvent::Stopped));
}

#[test]
fn pre_cancelled_scan_only_stops() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "secretpw\n");

    let cancel = CancelToken::new();
    cancel.cancel();
    let mut events = Vec::new();
    scan(&request(tmp.path(), "secretpw"), &cancel, |e| events.push(e));

    assert_eq!(events, vec![ScanEvent::Stopped]);
}

/// Invalid UTF-8 in a file is decoded lossily and the rest still searched.
#[test]
fn binary_garbage_does_not_abort_scan() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("mixed.txt"), b"\xff\xfe\x00junk\nsecretpw\n").unwrap();

    let events = scan_events(tmp.path(), "secretpw");
    let matches = match_lines(&events);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].1, 2);
    assert_eq!(events.last(), Some(&ScanEvent::Completed { matched: true }));
}

// ── Threaded scan ────────────────────────────────────────────────────────────

#[test]
fn start_scan_streams_events_and_finishes() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "hello\nsecretpw\n");
    write(&tmp.path().join("b.txt"), "nothing here");

    let handle = start_scan(request(tmp.path(), "secretpw")).expect("scan starts");
    let events = drain(&handle);
    handle.join();

    assert_eq!(events.last(), Some(&ScanEvent::Completed { matched: true }));
    assert_eq!(progress_values(&events), vec![50, 100]);
    assert_eq!(handle.status(), ScanStatus::Completed { matched: true });
    assert!(handle.is_finished());
}

/// `join` is idempotent and the event sequence is closed afterwards.
#[test]
fn join_is_idempotent_and_closes_events() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "x\n");

    let handle = start_scan(request(tmp.path(), "x")).unwrap();
    handle.join();
    handle.join();

    let events: Vec<ScanEvent> = handle.events.try_iter().collect();
    assert_eq!(events.last(), Some(&ScanEvent::Completed { matched: true }));
    assert!(matches!(
        handle.events.try_recv(),
        Err(crossbeam_channel::TryRecvError::Disconnected)
    ));
}

/// Cancelling right after start ends in either `Stopped` or (if the scan
/// won the race) `Completed`, never both, and `join` returns.
#[test]
fn cancel_after_start_ends_with_single_terminal_event() {
    let tmp = TempDir::new().unwrap();
    for i in 0..200 {
        write(&tmp.path().join(format!("f{i:03}.txt")), "line\nsecretpw\n");
    }

    let handle = start_scan(request(tmp.path(), "secretpw")).unwrap();
    handle.cancel();
    handle.join();

    let events: Vec<ScanEvent> = handle.events.try_iter().collect();
    let terminals: Vec<&ScanEvent> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminals.len(), 1);
    assert_eq!(events.last().map(ScanEvent::is_terminal), Some(true));
    if handle.status() == ScanStatus::Stopped {
        assert!(!progress_values(&events).contains(&100));
    }
}

/// Cancelling a finished scan is a no-op for its status.
#[test]
fn cancel_after_completion_is_noop() {
    let tmp = TempDir::new().unwrap();
    write(&tmp.path().join("a.txt"), "x\n");

    let handle = start_scan(request(tmp.path(), "nope")).unwrap();
    handle.join();
    handle.cancel();
    handle.join();

    assert_eq!(handle.status(), ScanStatus::Completed { matched: false });
}

#[test]
fn start_scan_rejects_missing_directory() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("does-not-exist");
    let err = start_scan(request(&missing, "x")).err().expect("must fail");
    assert!(matches!(err, ScanError::DirectoryNotFound(p) if p == missing));
}

#[test]
fn start_scan_rejects_file_root() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("a.txt");
    write(&file, "x");
    let err = start_scan(request(&file, "x")).err().expect("must fail");
    assert!(matches!(err, ScanError::NotADirectory(_)));
}

/// Events serialise as internally tagged JSON for `--json` output.
#[test]
fn events_serialise_with_event_tag() {
    let json = serde_json::to_string(&ScanEvent::Progress { percent: 50 }).unwrap();
    assert_eq!(json, r#"{"event":"progress","percent":50}"#);

    let back: ScanEvent = serde_json::from_str(r#"{"event":"completed","matched":true}"#).unwrap();
    assert_eq!(back, ScanEvent::Completed { matched: true });
}

/// A deserialised request goes through the same validation.
#[test]
fn request_deserialisation_rejects_empty_needle() {
    let ok: ScanRequest =
        serde_json::from_str(r#"{"root_path":"/tmp","needle":"pw","file_extension_filter":"LOG"}"#)
            .unwrap();
    assert_eq!(ok.file_extension_filter(), ".log");

    let defaulted: ScanRequest = serde_json::from_str(r#"{"root_path":"/tmp","needle":"pw"}"#).unwrap();
    assert_eq!(defaulted.file_extension_filter(), ".txt");

    assert!(serde_json::from_str::<ScanRequest>(r#"{"root_path":"/tmp","needle":""}"#).is_err());
}
