use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Cohort incidence execution module
#[derive(Parser, Debug)]
#[command(name = "cohort-incidence-module")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the incidence analysis for a job and export its results
    Execute {
        /// Job context JSON file
        #[arg(short, long)]
        job: PathBuf,

        /// Folder holding the engine's output tables (<table>.csv)
        #[arg(short, long)]
        engine_output: PathBuf,

        /// Write the execution report here instead of stdout
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Create the results tables in the results database
    CreateSchema {
        /// Job context JSON file
        #[arg(short, long)]
        job: PathBuf,

        /// Write the SQL to this file instead of executing it
        #[arg(long)]
        sql_out: Option<PathBuf>,
    },

    /// Print module metadata
    Info,
}
