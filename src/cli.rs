use std::path::PathBuf;

use clap::Parser;

/// Semester calendar sidecar. Reads one JSON request per line on stdin and
/// answers one JSON response per line on stdout.
#[derive(Debug, Parser)]
#[command(name = "educald", version, about = "Semester calendar sidecar")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Open this workspace before reading requests.
    #[arg(short, long)]
    pub workspace: Option<PathBuf>,
}
