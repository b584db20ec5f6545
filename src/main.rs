//! TextSleuth — find an exact piece of text in every text file under a folder.
//!
//! Thin binary entry point. All logic lives in the `textsleuth-core`
//! and `textsleuth-app` crates.

use clap::Parser;
use std::process::ExitCode;
use textsleuth_app::cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialise structured logging. stdout carries results, so logs go to stderr.
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("TextSleuth starting");

    textsleuth_app::console::run(&cli)
}
