use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "nota", version, about = "Flat-directory plain-text note manager")]
pub struct Cli {
    /// Store directory override; defaults to the platform data directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the notes in the store
    List,
    /// Print a note's content
    Cat {
        name: String,
    },
    /// Create or update a note; content comes from TEXT, or stdin with
    /// --stdin, and is kept as-is when neither is given
    Write {
        name: String,
        text: Option<String>,
        /// Save under a new name, removing the file it was opened from
        #[arg(long, value_name = "NEW_NAME")]
        rename: Option<String>,
        /// Read the content from standard input
        #[arg(long, conflicts_with = "text")]
        stdin: bool,
    },
    /// Duplicate notes under collision-free names
    Dup {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Delete notes; refuses to run without --yes
    Rm {
        #[arg(required = true)]
        names: Vec<String>,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}
