/// Per-file line search.
///
/// Each file is read line by line through a `BufReader`. Lines are split on
/// raw `\n` bytes and decoded lossily, so a file with invalid UTF-8 is still
/// searched (bad sequences become U+FFFD) instead of aborting the scan. The
/// file handle lives only inside [`search_file`] and is closed when it
/// returns, on the error path as well.
use crate::scanner::CancelToken;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Initial capacity of the reusable line buffer.
const LINE_BUFFER_CAPACITY: usize = 4_096;

/// How a single file's search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Every line was read. Carries the number of matching lines.
    Finished { matches: u64 },
    /// Cancellation was observed before the last line.
    Interrupted { matches: u64 },
}

impl FileOutcome {
    pub fn matches(self) -> u64 {
        match self {
            Self::Finished { matches } | Self::Interrupted { matches } => matches,
        }
    }
}

/// Search `path` for lines containing `needle`.
///
/// `on_match` receives the 1-based line number and the decoded line without
/// its terminator. The cancel token is polled before every line. Returns the
/// I/O error that stopped reading, if any; matches reported before the error
/// stand.
pub fn search_file(
    path: &Path,
    needle: &str,
    cancel: &CancelToken,
    on_match: impl FnMut(u64, String),
) -> io::Result<FileOutcome> {
    let file = File::open(path)?;
    search_reader(BufReader::new(file), needle, cancel, on_match)
}

/// Line search over any buffered reader. Split out so the decoding and
/// line-numbering rules can be exercised without touching the filesystem.
pub fn search_reader<R: BufRead>(
    mut reader: R,
    needle: &str,
    cancel: &CancelToken,
    mut on_match: impl FnMut(u64, String),
) -> io::Result<FileOutcome> {
    let mut buf: Vec<u8> = Vec::with_capacity(LINE_BUFFER_CAPACITY);
    let mut line_number: u64 = 0;
    let mut matches: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            return Ok(FileOutcome::Interrupted { matches });
        }

        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(FileOutcome::Finished { matches });
        }
        line_number += 1;

        let line = String::from_utf8_lossy(trim_line_terminator(&buf));
        if line.contains(needle) {
            matches += 1;
            on_match(line_number, line.into_owned());
        }
    }
}

/// Strip one trailing `\n` or `\r\n`.
fn trim_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
