//! Command-line argument definitions for the Wardley CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Each subcommand reads one map file; the global options
//! select the configuration file and logging verbosity.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Wardley map tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse and validate a map, reporting every problem
    Check {
        /// Path to the input map file
        input: String,
    },

    /// Rewrite a map in canonical form
    Fmt {
        /// Path to the input map file
        input: String,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Fail if the file is not already canonical, without writing
        #[arg(long)]
        check: bool,
    },

    /// Print the parse result as JSON
    Parse {
        /// Path to the input map file
        input: String,
    },

    /// Generate map text from a JSON snapshot of stored records
    Generate {
        /// Path to the snapshot JSON file
        input: String,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the record changes that bring a stored map in line with a map file
    Plan {
        /// Path to the input map file
        input: String,

        /// Path to the snapshot JSON of the stored map
        #[arg(long)]
        state: String,

        /// Apply the plan to the snapshot and print the result instead
        #[arg(long)]
        apply: bool,

        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },
}
