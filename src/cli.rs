use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// codejumper - jump through a GNU Global tag database
#[derive(Parser, Debug)]
#[command(name = "codejumper", version, about)]
pub struct Cli {
    /// Output results as JSON Lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Start looking for the tag database in this directory
    #[arg(short = 'C', long = "dir", global = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Path to the `global` executable (default: found via PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub global_path: Option<PathBuf>,

    /// When to color output: auto, always or never
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<String>,

    /// Offer no completions (as if disabled in config)
    #[arg(long, global = true)]
    pub no_completion: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find where a symbol is defined
    Def(SymbolArgs),

    /// Find references to a symbol
    Ref(SymbolArgs),

    /// List symbols starting with a prefix (all symbols when omitted)
    Symbols(PrefixArgs),

    /// List indexed files whose path contains a keyword
    Files(FilesArgs),

    /// Complete a symbol prefix, bounded by the completion timeout
    Complete(CompleteArgs),

    /// Find the header named by an `#include` line
    Include(IncludeArgs),

    /// Show the tag engine's state
    Status,
}

#[derive(clap::Args, Debug)]
pub struct SymbolArgs {
    /// Symbol name to look up
    pub symbol: String,

    /// Show paths relative to the tag root
    #[arg(long)]
    pub relative: bool,
}

#[derive(clap::Args, Debug)]
pub struct PrefixArgs {
    /// Symbol prefix
    #[arg(default_value = "")]
    pub prefix: String,
}

#[derive(clap::Args, Debug)]
pub struct FilesArgs {
    /// Substring (pattern) of the file path
    #[arg(default_value = "")]
    pub keyword: String,

    /// Show paths relative to the tag root
    #[arg(long)]
    pub relative: bool,
}

#[derive(clap::Args, Debug)]
pub struct CompleteArgs {
    /// Prefix typed so far
    pub prefix: String,

    /// Override the configured completion timeout, in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

#[derive(clap::Args, Debug)]
pub struct IncludeArgs {
    /// Source line containing the `#include` directive
    pub line: String,

    /// Show paths relative to the tag root
    #[arg(long)]
    pub relative: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
