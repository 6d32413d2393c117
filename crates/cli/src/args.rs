//! Command-line arguments for `timetable`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "timetable", version, about = "Weekly school timetable solver")]
pub struct Cli {
    /// Emit logs as JSON lines (also `TIMETABLE__LOG__FORMAT=json`)
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve an envelope and print the timetables.
    ///
    /// Without `--input` the built-in demo roster is solved.
    Solve {
        /// Path to a SolveEnvelope JSON document
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Construct and repair cycles before backtracking
        #[arg(long)]
        attempts: Option<u32>,

        /// Skip the backtracking fallback
        #[arg(long)]
        no_backtracking: bool,

        /// Node budget for backtracking (0 means unbounded)
        #[arg(long, value_name = "N")]
        node_limit: Option<u64>,

        /// Print the full SolveResult as JSON
        #[arg(long)]
        json: bool,
    },
    /// Re-validate a saved result against its envelope.
    Check {
        /// Path to a SolveResult JSON document
        #[arg(long, value_name = "FILE")]
        result: PathBuf,

        /// Path to the SolveEnvelope it was solved from
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
    },
    /// Print the demo envelope as JSON.
    Demo,
    /// Print the JSON schema of SolveEnvelope.
    Schema,
}

/// Flag values that override the envelope's params.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SolveOverrides {
    pub seed: Option<u64>,
    pub attempts: Option<u32>,
    pub no_backtracking: bool,
    pub node_limit: Option<u64>,
}
