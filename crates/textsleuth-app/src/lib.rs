/// TextSleuth App — search controller and terminal frontend.
///
/// This crate owns everything between the user and the scanner: input
/// validation, the search state machine, the human-readable result log,
/// CSV export and the command-line runner. Search logic lives in
/// `textsleuth-core`.
pub mod cli;
pub mod console;
pub mod report;
pub mod state;

pub use state::{AppPhase, InputError, SearchOutcome, SearchState};
