use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chunkvfs_core::error::{Result, VfsError};
use chunkvfs_core::tree::ItemKind;
use chunkvfs_core::{
    CancelToken, NodeFilter, PackOptions, PathResolver, Workspace, WorkspaceConfig, open_archive,
    pack,
};

use crate::presentation::cli::FilterArgs;

/// Mount every archive; only fail when none of them could be mounted.
fn mount_all(ws: &mut Workspace, archives: &[PathBuf]) -> Result<()> {
    let mut first_err = None;
    let mut mounted = 0usize;
    for report in ws.mount_paths(archives) {
        match report {
            Ok(r) => {
                mounted += 1;
                tracing::debug!(label = %r.label, chunks = r.stats.chunks, "archive ready");
            }
            Err(e) => {
                eprintln!("{e}");
                first_err.get_or_insert(e);
            }
        }
    }
    match first_err {
        Some(e) if mounted == 0 => Err(e),
        _ => Ok(()),
    }
}

fn filter_from(args: &FilterArgs) -> Result<Option<NodeFilter>> {
    match &args.filter {
        Some(text) => NodeFilter::new(text, args.regex),
        None => Ok(None),
    }
}

pub fn handle_pack(
    out: PathBuf,
    inputs: Vec<PathBuf>,
    min_gain: f32,
    level: i32,
    hashtable_out: Option<PathBuf>,
) -> Result<()> {
    let refs: Vec<_> = inputs.iter().map(|p| p.as_path()).collect();
    let opts = PackOptions { min_gain, level };
    let summary = pack(&refs, &out, Some(&opts))?;
    eprintln!(
        "packed {} files ({} zstd, {} stored): {} -> {} bytes",
        summary.paths.len(),
        summary.compressed,
        summary.stored,
        summary.bytes_in,
        summary.bytes_out
    );

    if let Some(path) = hashtable_out {
        let mut resolver = PathResolver::new();
        resolver.insert_many(summary.paths.iter().map(|(h, p)| (*h, p.as_str())));
        let mut w = BufWriter::new(File::create(&path)?);
        resolver.write_to(&mut w)?;
        w.flush()?;
    }
    Ok(())
}

pub fn handle_list(cfg: &WorkspaceConfig, archive: PathBuf) -> Result<()> {
    let ws = Workspace::from_config(cfg)?;
    let reader = open_archive(&archive)?;
    let mut out = std::io::stdout().lock();
    for chunk in reader.chunks() {
        let (name, _) = ws
            .resolver()
            .resolve(chunk, &*reader, cfg.guess_on_miss);
        writeln!(
            out,
            "{:016x} {:<5} {:>12} {:>12} {}",
            chunk.path_hash,
            chunk.compression.name(),
            chunk.compressed_size,
            chunk.uncompressed_size,
            name
        )?;
    }
    Ok(())
}

pub fn handle_tree(
    cfg: &WorkspaceConfig,
    archives: Vec<PathBuf>,
    filter: FilterArgs,
    expand_all: bool,
) -> Result<()> {
    let mut ws = Workspace::from_config(cfg)?;
    mount_all(&mut ws, &archives)?;
    if let Some(text) = &filter.filter {
        ws.set_filter(text, filter.regex)?;
    }
    if expand_all {
        ws.expand_all();
    }

    let tree = ws.tree();
    let mut out = std::io::stdout().lock();
    for id in tree.visible() {
        let node = tree.get(id)?;
        let depth = node.path().matches('/').count();
        let suffix = if node.kind() == ItemKind::Directory { "/" } else { "" };
        writeln!(out, "{:indent$}{}{}", "", node.name(), suffix, indent = depth * 2)?;
    }
    Ok(())
}

pub fn handle_extract(
    cfg: &WorkspaceConfig,
    dest: PathBuf,
    archives: Vec<PathBuf>,
    filter: FilterArgs,
    strip_prefix: Option<String>,
) -> Result<()> {
    let mut ws = Workspace::from_config(cfg)?;
    mount_all(&mut ws, &archives)?;

    let nodes = match filter_from(&filter)? {
        Some(f) => {
            let matching: Vec<_> = ws
                .tree()
                .traverse_all()
                .filter(|n| n.file().is_some() && f.matches(n.path()))
                .map(|n| n.id())
                .collect();
            for id in matching {
                ws.set_checked(id, true)?;
            }
            ws.checked_files()
        }
        None => ws.all_files(),
    };

    let mut opts = cfg.extract_options();
    opts.strip_prefix = strip_prefix;
    let report = ws.extract(&nodes, &dest, &opts, &CancelToken::new())?;
    eprintln!(
        "extracted {} files ({} bytes) to {}",
        report.extracted.len(),
        report.bytes_written(),
        dest.display()
    );
    for (path, e) in &report.failed {
        eprintln!("failed {}: {e}", path.display());
    }
    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(VfsError::Format(format!(
            "{} files failed to extract",
            report.failed.len()
        )))
    }
}

pub fn handle_cat(cfg: &WorkspaceConfig, archive: PathBuf, path: String) -> Result<()> {
    let mut ws = Workspace::from_config(cfg)?;
    mount_all(&mut ws, &[archive])?;
    let id = ws
        .find_by_path(&path)
        .ok_or_else(|| VfsError::Format(format!("no such path: {path}")))?;
    let mut reader = ws.open_file(id)?;
    let mut out = std::io::stdout().lock();
    std::io::copy(&mut reader, &mut out)?;
    out.flush()?;
    Ok(())
}

pub fn handle_resolve(cfg: &WorkspaceConfig, hashes: Vec<String>) -> Result<()> {
    let (resolver, _) = PathResolver::from_files(&cfg.hashtables)?;
    for text in hashes {
        let digits = text.trim_start_matches("0x");
        let hash = u64::from_str_radix(digits, 16)
            .map_err(|e| VfsError::Format(format!("bad hash {text}: {e}")))?;
        match resolver.lookup(hash) {
            Some(path) => println!("{hash:016x} {path}"),
            None => println!("{hash:016x} <unknown>"),
        }
    }
    Ok(())
}
