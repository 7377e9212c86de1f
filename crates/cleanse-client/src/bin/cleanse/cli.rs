//! CLI definitions for cleanse.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "cleanse",
    version,
    about = "Data-cleansing recommendations and code generation client",
    infer_subcommands = true,
    after_help = "Examples:\n  cleanse                                  # interactive session\n  cleanse recommend ./sales.csv            # list recommended steps\n  cleanse generate ./sales.csv --select dates/step1 --select 3\n  cleanse --server http://10.0.0.5:5000 shell"
)]
pub struct Cli {
    /// Show debug logging.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Configuration file (defaults to ./cleanse.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Backend base URL override.
    #[arg(long, global = true)]
    pub server: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive upload, review and generate session (default).
    Shell,
    /// Upload a dataset and print the recommended cleansing steps.
    #[command(after_help = "Examples:\n  cleanse recommend ./sales.xlsx\n  cleanse recommend ./sales.csv --json")]
    Recommend {
        /// Dataset file (.csv, .xlsx or .xls).
        file: PathBuf,
        /// Print the backend response as JSON instead of the numbered list.
        #[arg(long)]
        json: bool,
    },
    /// Upload a dataset, select steps and print the generated code.
    #[command(
        after_help = "Steps are named as category/step or by their number in `cleanse recommend`.\n\nExamples:\n  cleanse generate ./sales.csv --select dates/step1\n  cleanse generate ./sales.csv --select 1 --select 4 --code ./clean.py"
    )]
    Generate {
        /// Dataset file (.csv, .xlsx or .xls).
        file: PathBuf,
        /// Step to include (category/step or list number). Repeatable.
        #[arg(long, short)]
        select: Vec<String>,
        /// Previously generated code to send along.
        #[arg(long)]
        code: Option<PathBuf>,
    },
    /// Generate shell completions.
    #[command(
        after_help = "Examples:\n  cleanse completions bash > ~/.local/share/bash-completion/completions/cleanse\n  cleanse completions zsh --out ~/.zfunc/_cleanse"
    )]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
        /// Write the script to this file instead of stdout.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}
