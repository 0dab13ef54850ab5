//! Command-line argument definitions for the Colloquy CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand picks the operation; the global options
//! select the store, the configuration file and logging verbosity.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Colloquy dialogue tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Store root directory, overriding the configured one
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Operations on one named graph
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save a graph snapshot (JSON) under a graph name
    Save {
        /// Graph name
        graph: String,

        /// Path to the snapshot file
        snapshot: String,

        /// Print what would be written and removed without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Rebuild a saved graph into a snapshot file
    Load {
        /// Graph name
        graph: String,

        /// Path to the output snapshot file
        #[arg(short, long, default_value = "out.json")]
        output: String,
    },

    /// List the materialized dialogues of a saved graph
    List {
        /// Graph name
        graph: String,

        /// Only dialogues of this group
        #[arg(long, conflicts_with = "ungrouped")]
        group: Option<String>,

        /// Only dialogues outside any group
        #[arg(long)]
        ungrouped: bool,

        /// Only starting dialogues
        #[arg(long)]
        starting_only: bool,
    },
}
