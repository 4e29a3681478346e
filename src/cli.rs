use crate::config::{DEFAULT_BASELINE_FILE, DEFAULT_REPORT_DIR};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// File integrity monitor: baseline a directory tree, detect and report changes
#[derive(Parser, Debug)]
#[command(name = "fimsentry", version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence
    /// when set together with -v.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record the current state of a tree as the new integrity baseline
    Baseline {
        /// Directory tree to baseline
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Where to write the baseline document
        #[arg(long, value_name = "PATH", default_value = DEFAULT_BASELINE_FILE)]
        baseline_file: PathBuf,
    },

    /// Re-scan a tree, compare against the baseline, and report every change
    Check {
        /// Directory tree to check
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Baseline document to compare against
        #[arg(long, value_name = "PATH", default_value = DEFAULT_BASELINE_FILE)]
        baseline_file: PathBuf,

        /// Directory that receives incident reports
        #[arg(long, value_name = "DIR", default_value = DEFAULT_REPORT_DIR)]
        report_dir: PathBuf,

        /// Label recorded in reports for this monitored system
        #[arg(long, value_name = "LABEL")]
        label: Option<String>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
