use clap::{ArgAction, Parser};
use std::path::PathBuf;
use textsleuth_core::model::DEFAULT_EXTENSION;

#[derive(Debug, Parser)]
#[command(name = "textsleuth", version)]
#[command(about = "Find an exact piece of text in every text file under a folder", long_about = None)]
pub struct Cli {
    /// Folder to search (recursively)
    pub root: PathBuf,

    /// Exact text to find; case-sensitive, surrounding whitespace is trimmed
    pub needle: String,

    /// Only search files whose name ends with this extension (case-insensitive)
    #[arg(short, long, default_value = DEFAULT_EXTENSION)]
    pub ext: String,

    /// Print every scan event as a JSON line instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Also write the matching lines to a CSV file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["textsleuth", "/data", "secretpw"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("/data"));
        assert_eq!(cli.needle, "secretpw");
        assert_eq!(cli.ext, ".txt");
        assert!(!cli.json);
        assert!(cli.csv.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "textsleuth",
            "/data",
            "pw",
            "--ext",
            "log",
            "--json",
            "--csv",
            "out.csv",
            "--no-progress",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.ext, "log");
        assert!(cli.json);
        assert_eq!(cli.csv, Some(PathBuf::from("out.csv")));
        assert!(cli.no_progress);
        assert_eq!(cli.verbose, 2);
    }
}
