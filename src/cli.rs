// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// Subcommands:
// - check: probe URLs and report which are dead
// - clean / sanitize / parse: print the canonical forms of URLs
// =============================================================================

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "deadlink-checker",
    version,
    about = "Check whether cited links are dead and canonicalize URLs",
    long_about = "deadlink-checker probes URLs over HTTP(S) and FTP and decides whether each one is \
                  dead, the way a citation-maintenance bot needs to before tagging or archiving a link."
)]
pub struct Cli {
    /// More log output on stderr (-v, -vv). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe URLs and report which ones are dead
    ///
    /// Example: deadlink-checker check https://en.wikipedia.org/nothing
    Check(CheckArgs),

    /// Print the comparison key of each URL
    Clean {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print the fetchable, sanitized form of each URL
    Sanitize {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Print scheme, host and path of each URL as written
    Parse {
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// URLs to check
    pub urls: Vec<String>,

    /// Read more URLs from a file, one per line ('#' starts a comment)
    #[arg(long, short)]
    pub file: Option<PathBuf>,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// TOML file with checker settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Maximum number of probes in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds (both HEAD and GET)
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Redirect hops to follow before giving up
    #[arg(long)]
    pub max_redirects: Option<usize>,

    /// Skip HEAD and probe with GET straight away
    #[arg(long)]
    pub get: bool,
}
