use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "chunkvfs CLI: browse hash-keyed archives as one tree", long_about = None)]
pub struct Cli {
    /// JSON workspace config (hashtables, mount mode, overflow limit)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Default)]
pub struct ResolveArgs {
    /// Hashtable file; repeat to layer several (first one wins on conflicts)
    #[arg(long = "hashtable")]
    pub hashtables: Vec<PathBuf>,

    /// Do not sniff content for chunks missing from the hashtable
    #[arg(long)]
    pub no_guess: bool,
}

#[derive(Args, Clone, Default)]
pub struct FilterArgs {
    /// Only show (or extract) paths containing this text
    #[arg(long)]
    pub filter: Option<String>,

    /// Treat --filter as a case-insensitive regular expression
    #[arg(long)]
    pub regex: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack directories into a hash-keyed archive
    Pack {
        out: PathBuf,
        inputs: Vec<PathBuf>,

        #[arg(long, default_value_t = 0.05)]
        min_gain: f32,

        #[arg(long, default_value_t = 3)]
        level: i32,

        /// Also write the hashtable for the packed paths
        #[arg(long = "hashtable-out")]
        hashtable_out: Option<PathBuf>,
    },

    /// List chunks with their resolved names
    List {
        archive: PathBuf,

        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Print the merged tree of one or more archives
    Tree {
        #[arg(required = true)]
        archives: Vec<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Expand every directory instead of showing only the top level
        #[arg(long)]
        expand_all: bool,

        /// Give each archive its own top-level directory
        #[arg(long)]
        isolated: bool,

        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Extract files (all, or those matching --filter) to a directory
    Extract {
        dest: PathBuf,

        #[arg(required = true)]
        archives: Vec<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Write paths relative to this tree directory
        #[arg(long)]
        strip_prefix: Option<String>,

        /// Destinations longer than this many characters get a flat hashed name
        #[arg(long)]
        overflow_limit: Option<usize>,

        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Stream one file to stdout
    Cat {
        archive: PathBuf,
        path: String,

        #[command(flatten)]
        resolve: ResolveArgs,
    },

    /// Look up path hashes (hex) in the hashtables
    Resolve {
        #[arg(required = true)]
        hashes: Vec<String>,

        #[command(flatten)]
        resolve: ResolveArgs,
    },
}
