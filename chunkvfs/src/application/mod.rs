pub mod handlers;

use crate::presentation::cli::{Cli, Commands, ResolveArgs};
use chunkvfs_core::error::{Result, VfsError};
use chunkvfs_core::{MountMode, WorkspaceConfig};
use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn load_config(path: Option<&Path>) -> Result<WorkspaceConfig> {
    let Some(path) = path else {
        return Ok(WorkspaceConfig::default());
    };
    let f = BufReader::new(File::open(path)?);
    serde_json::from_reader(f)
        .map_err(|e| VfsError::Format(format!("config {}: {e}", path.display())))
}

/// Command-line flags take precedence over the config file.
fn apply_resolve_args(cfg: &mut WorkspaceConfig, args: &ResolveArgs) {
    if !args.hashtables.is_empty() {
        cfg.hashtables = args.hashtables.clone();
    }
    if args.no_guess {
        cfg.guess_on_miss = false;
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Pack {
            out,
            inputs,
            min_gain,
            level,
            hashtable_out,
        } => handlers::handle_pack(out, inputs, min_gain, level, hashtable_out),
        Commands::List { archive, resolve } => {
            apply_resolve_args(&mut cfg, &resolve);
            handlers::handle_list(&cfg, archive)
        }
        Commands::Tree {
            archives,
            filter,
            expand_all,
            isolated,
            resolve,
        } => {
            apply_resolve_args(&mut cfg, &resolve);
            if isolated {
                cfg.mount_mode = MountMode::Isolated;
            }
            handlers::handle_tree(&cfg, archives, filter, expand_all)
        }
        Commands::Extract {
            dest,
            archives,
            filter,
            strip_prefix,
            overflow_limit,
            resolve,
        } => {
            apply_resolve_args(&mut cfg, &resolve);
            if let Some(limit) = overflow_limit {
                cfg.overflow_limit = limit;
            }
            handlers::handle_extract(&cfg, dest, archives, filter, strip_prefix)
        }
        Commands::Cat {
            archive,
            path,
            resolve,
        } => {
            apply_resolve_args(&mut cfg, &resolve);
            handlers::handle_cat(&cfg, archive, path)
        }
        Commands::Resolve { hashes, resolve } => {
            apply_resolve_args(&mut cfg, &resolve);
            handlers::handle_resolve(&cfg, hashes)
        }
    }
}
