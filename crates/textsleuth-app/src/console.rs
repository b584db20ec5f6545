/// Terminal frontend — drives a [`SearchState`] from the command line.
///
/// The scan runs on its worker thread while this loop polls the state,
/// redraws an `indicatif` progress bar and prints new result entries as
/// they arrive. Pressing Enter stops the search (only when stdin is a
/// terminal, so piped input never cancels a run).
use crate::cli::Cli;
use crate::report;
use crate::state::{AppPhase, SearchOutcome, SearchState};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use textsleuth_core::CancelToken;
use tracing::{info, warn};

/// Sleep between polls when no event was waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(30);

/// Run the search described by `cli`, printing to stdout. Returns the
/// process exit code: 0 found, 1 not found, 2 stopped / failed / invalid.
pub fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let options = RunOptions {
        show_progress: !cli.no_progress && !cli.json && io::stderr().is_terminal(),
        stop_on_enter: io::stdin().is_terminal(),
    };

    let state = match run_search(cli, &mut out, options)? {
        Some(state) => state,
        None => return Ok(ExitCode::from(2)),
    };

    if let Some(path) = &cli.csv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        report::export_matches_csv(BufWriter::new(file), &state.matches)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {} matches to {}", state.matches.len(), path.display());
    }

    if !cli.json {
        eprintln!("{}", summary_line(&state));
    }
    Ok(ExitCode::from(exit_code(state.outcome.as_ref())))
}

/// Terminal features to enable for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub show_progress: bool,
    /// Spawn a thread that stops the search when a line is read from stdin.
    pub stop_on_enter: bool,
}

/// Start the search and pump it to completion, writing the result log
/// (or JSON event lines) to `out`. Returns `None` if the inputs were
/// rejected; the reason has been printed to stderr.
pub fn run_search<W: Write>(
    cli: &Cli,
    out: &mut W,
    options: RunOptions,
) -> anyhow::Result<Option<SearchState>> {
    let mut state = SearchState::new();
    state.select_folder(cli.root.clone());
    state.set_needle(&cli.needle);
    state.set_extension(&cli.ext);

    if let Err(err) = state.start_search() {
        eprintln!("Error: {err}");
        return Ok(None);
    }

    if options.stop_on_enter {
        if let Some(token) = state.cancel_token() {
            spawn_stop_on_enter(token);
        }
    }

    let bar = if options.show_progress {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:40.cyan/dim}] {pos:>3}% {msg}")?
                .progress_chars("━╸─"),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let mut printed = 0usize;
    let mut json_lines: Vec<String> = Vec::new();

    while state.phase == AppPhase::Searching {
        let changed = state.process_scan_messages_with(|event| {
            if cli.json {
                match serde_json::to_string(event) {
                    Ok(line) => json_lines.push(line),
                    Err(err) => warn!("Cannot serialise {event:?}: {err}"),
                }
            }
        });

        let mut write_pending = |out: &mut W| -> io::Result<()> {
            if cli.json {
                for line in json_lines.drain(..) {
                    writeln!(out, "{line}")?;
                }
            } else {
                for entry in &state.result_log[printed..] {
                    writeln!(out, "{entry}\n")?;
                }
                printed = state.result_log.len();
            }
            out.flush()
        };
        match &bar {
            Some(bar) => {
                bar.set_position(u64::from(state.progress_percent));
                bar.set_message(format!("{} matching lines", state.matches.len()));
                bar.suspend(|| write_pending(out))?;
            }
            None => write_pending(out)?,
        }

        if !changed {
            thread::sleep(POLL_INTERVAL);
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    Ok(Some(state))
}

fn spawn_stop_on_enter(token: CancelToken) {
    let spawned = thread::Builder::new()
        .name("textsleuth-stdin".into())
        .spawn(move || {
            let mut line = String::new();
            if matches!(io::stdin().read_line(&mut line), Ok(n) if n > 0) && token.cancel() {
                info!("Stop requested from keyboard");
            }
        });
    if let Err(err) = spawned {
        warn!("Stop-on-Enter unavailable: {err}");
    }
}

/// One-line wrap-up printed to stderr after a text-mode run.
pub fn summary_line(state: &SearchState) -> String {
    let secs = state
        .elapsed()
        .map(|d| d.num_milliseconds() as f64 / 1000.0)
        .unwrap_or_default();
    let mut line = format!(
        "{} matching lines, {} unreadable files in {secs:.2}s",
        state.matches.len(),
        state.error_count
    );
    if state.log_dropped > 0 {
        line.push_str(&format!(" ({} log entries not shown)", state.log_dropped));
    }
    line
}

pub fn exit_code(outcome: Option<&SearchOutcome>) -> u8 {
    match outcome {
        Some(SearchOutcome::Found) => 0,
        Some(SearchOutcome::NotFound | SearchOutcome::NoFiles) => 1,
        _ => 2,
    }
}
