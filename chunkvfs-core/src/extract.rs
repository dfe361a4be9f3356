//! Writing checked or selected file nodes to disk.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::archive::{ArchiveReader, Chunk};
use crate::error::{Result, VfsError};
use crate::hash::{hex16, path_hash};
use crate::mount::split_path;
use crate::tree::{MountId, NodeId, VirtualTree};

/// Longest destination path (in characters) written as-is.
pub const DEFAULT_OVERFLOW_LIMIT: usize = 260;

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Destinations longer than this are flattened to a hashed name under the root.
    pub overflow_limit: usize,
    /// Extract paths relative to this directory instead of the tree root.
    pub strip_prefix: Option<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overflow_limit: DEFAULT_OVERFLOW_LIMIT,
            strip_prefix: None,
        }
    }
}

/// Shared flag checked between files. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug)]
pub struct ExtractJob {
    pub node: NodeId,
    pub mount: MountId,
    pub chunk: Chunk,
    pub resolved_path: Arc<str>,
    pub dest: PathBuf,
    /// The natural destination was too long; `dest` is the hashed fallback.
    pub overflowed: bool,
}

#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub extracted: Vec<(PathBuf, u64)>,
    pub failed: Vec<(PathBuf, VfsError)>,
    /// Jobs not started because the batch was cancelled.
    pub skipped: usize,
}

impl ExtractionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped == 0
    }

    pub fn bytes_written(&self) -> u64 {
        self.extracted.iter().map(|(_, n)| n).sum()
    }
}

/// Extension of the last path component, dot included, or "".
fn extension_of(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(i) if i + 1 < name.len() => &name[i..],
        _ => "",
    }
}

fn strip<'a>(path: &'a str, prefix: Option<&str>) -> &'a str {
    let Some(prefix) = prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) else {
        return path;
    };
    match path.strip_prefix(prefix) {
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Where `resolved` lands under `root`, and whether the overflow fallback
/// was used. Components are joined with native separators; `..` and other
/// non-normal components are refused.
pub fn destination_for(
    root: &Path,
    resolved: &str,
    opts: &ExtractOptions,
) -> Result<(PathBuf, bool)> {
    let rel = strip(resolved, opts.strip_prefix.as_deref());
    let parts = split_path(rel);
    if parts.is_empty() {
        return Err(VfsError::UnsafePath(resolved.to_string()));
    }
    let mut dest = root.to_path_buf();
    for part in parts {
        let mut comps = Path::new(part).components();
        match (comps.next(), comps.next()) {
            (Some(Component::Normal(_)), None) => dest.push(part),
            _ => return Err(VfsError::UnsafePath(resolved.to_string())),
        }
    }

    if dest.to_string_lossy().chars().count() <= opts.overflow_limit {
        return Ok((dest, false));
    }
    let flat = format!("{}{}", hex16(path_hash(resolved)), extension_of(resolved));
    Ok((root.join(flat), true))
}

/// Jobs for the nodes that can be extracted, and the nodes that cannot.
#[derive(Debug, Default)]
pub struct Plan {
    pub jobs: Vec<ExtractJob>,
    /// Non-file nodes and unsafe paths, keyed like `ExtractionReport::failed`.
    pub rejected: Vec<(PathBuf, VfsError)>,
}

fn plan_one(
    tree: &VirtualTree,
    id: NodeId,
    root: &Path,
    opts: &ExtractOptions,
) -> Result<ExtractJob> {
    let file = tree.get(id)?.file().ok_or(VfsError::NotAFile(id))?;
    let (dest, overflowed) = destination_for(root, &file.resolved_path, opts)?;
    Ok(ExtractJob {
        node: id,
        mount: file.mount,
        chunk: file.chunk,
        resolved_path: Arc::clone(&file.resolved_path),
        dest,
        overflowed,
    })
}

/// Build one job per file node. A node that cannot be planned is rejected on
/// its own; the rest of the batch still gets jobs.
pub fn plan(tree: &VirtualTree, nodes: &[NodeId], root: &Path, opts: &ExtractOptions) -> Plan {
    let mut plan = Plan::default();
    for &id in nodes {
        match plan_one(tree, id, root, opts) {
            Ok(job) => plan.jobs.push(job),
            Err(e) => {
                let key = match tree.node(id) {
                    Some(node) => PathBuf::from(node.path()),
                    None => PathBuf::from(id.to_string()),
                };
                tracing::warn!(path = %key.display(), error = %e, "not extractable");
                plan.rejected.push((key, e));
            }
        }
    }
    plan
}

/// Stream one chunk to its destination. Returns bytes written.
pub fn extract_one(archive: &dyn ArchiveReader, job: &ExtractJob) -> Result<u64> {
    if let Some(parent) = job.dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut src = archive.open_decompressed(&job.chunk)?;
    let mut out = BufWriter::new(File::create(&job.dest)?);
    let n = std::io::copy(&mut src, &mut out)?;
    out.flush()?;
    Ok(n)
}

enum Outcome {
    Done(u64),
    Failed(VfsError),
    Skipped,
}

/// Job indices grouped by destination, groups in order of first appearance.
fn group_by_dest(jobs: &[ExtractJob]) -> Vec<Vec<usize>> {
    let mut slot: HashMap<&Path, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (i, job) in jobs.iter().enumerate() {
        let g = *slot.entry(job.dest.as_path()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(i);
    }
    groups
}

/// Run `jobs` on the rayon pool. Jobs sharing a destination run one after
/// another in slice order, so the last of them wins. Failures are collected
/// per file; once `cancel` fires, jobs that have not started are skipped.
pub fn run<F>(jobs: &[ExtractJob], archive_for: F, cancel: &CancelToken) -> ExtractionReport
where
    F: Fn(MountId) -> Result<Arc<dyn ArchiveReader>> + Sync,
{
    tracing::info!(files = jobs.len(), "extracting");
    let groups = group_by_dest(jobs);
    if groups.len() < jobs.len() {
        tracing::debug!(
            duplicates = jobs.len() - groups.len(),
            "destinations shared by several files"
        );
    }
    let finished: Vec<Vec<(usize, Outcome)>> = groups
        .par_iter()
        .map(|group| {
            group
                .iter()
                .map(|&i| {
                    if cancel.is_cancelled() {
                        return (i, Outcome::Skipped);
                    }
                    let job = &jobs[i];
                    match archive_for(job.mount).and_then(|a| extract_one(a.as_ref(), job)) {
                        Ok(n) => (i, Outcome::Done(n)),
                        Err(e) => (i, Outcome::Failed(e)),
                    }
                })
                .collect()
        })
        .collect();

    let mut outcomes: Vec<Option<Outcome>> = jobs.iter().map(|_| None).collect();
    for (i, outcome) in finished.into_iter().flatten() {
        outcomes[i] = Some(outcome);
    }

    let mut report = ExtractionReport::default();
    for (job, outcome) in jobs.iter().zip(outcomes) {
        match outcome {
            Some(Outcome::Done(n)) => report.extracted.push((job.dest.clone(), n)),
            Some(Outcome::Failed(e)) => {
                tracing::warn!(path = %job.resolved_path, error = %e, "extraction failed");
                report.failed.push((job.dest.clone(), e));
            }
            Some(Outcome::Skipped) | None => report.skipped += 1,
        }
    }
    tracing::info!(
        extracted = report.extracted.len(),
        failed = report.failed.len(),
        skipped = report.skipped,
        "extraction finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_components_natively() {
        let root = Path::new("out");
        let (dest, overflowed) =
            destination_for(root, "data/chars/a.bin", &ExtractOptions::default()).unwrap();
        assert!(!overflowed);
        assert_eq!(dest, root.join("data").join("chars").join("a.bin"));
    }

    #[test]
    fn long_paths_fall_back_to_flat_hashed_name() {
        let root = Path::new("out");
        let resolved = format!("{}/file.dds", "d".repeat(300));
        let (dest, overflowed) =
            destination_for(root, &resolved, &ExtractOptions::default()).unwrap();
        assert!(overflowed);
        assert_eq!(
            dest,
            root.join(format!("{}.dds", hex16(path_hash(&resolved))))
        );
        assert_eq!(dest.parent(), Some(root));
    }

    #[test]
    fn limit_counts_characters() {
        let root = Path::new("r");
        let opts = ExtractOptions {
            overflow_limit: 7,
            strip_prefix: None,
        };
        // "r/ééééé" is 7 characters but more bytes
        assert!(!destination_for(root, "ééééé", &opts).unwrap().1);
        assert!(destination_for(root, "éééééé", &opts).unwrap().1);
    }

    #[test]
    fn refuses_parent_components() {
        let opts = ExtractOptions::default();
        assert!(matches!(
            destination_for(Path::new("out"), "a/../../etc/passwd", &opts),
            Err(VfsError::UnsafePath(_))
        ));
        assert!(destination_for(Path::new("out"), "./a", &opts).is_err());
    }

    #[test]
    fn strip_prefix_only_on_component_boundary() {
        let opts = ExtractOptions {
            strip_prefix: Some("data/".into()),
            ..Default::default()
        };
        let root = Path::new("o");
        assert_eq!(
            destination_for(root, "data/x/y.bin", &opts).unwrap().0,
            root.join("x").join("y.bin")
        );
        assert_eq!(
            destination_for(root, "database/y.bin", &opts).unwrap().0,
            root.join("database").join("y.bin")
        );
    }

    #[test]
    fn extension_detection() {
        assert_eq!(extension_of("a/b.c/file.tex"), ".tex");
        assert_eq!(extension_of("a/b.c/file"), "");
        assert_eq!(extension_of("trailing."), "");
    }

    #[test]
    fn shared_destinations_form_one_group() {
        use crate::codec::CompressionKind;
        let job = |dest: &str| ExtractJob {
            node: NodeId(0),
            mount: MountId(0),
            chunk: Chunk {
                path_hash: 0,
                compression: CompressionKind::Store,
                compressed_size: 0,
                uncompressed_size: 0,
                handle: 0,
            },
            resolved_path: Arc::from(dest),
            dest: PathBuf::from(dest),
            overflowed: false,
        };
        let jobs = [job("a"), job("b"), job("a"), job("c"), job("b")];
        assert_eq!(group_by_dest(&jobs), [vec![0, 2], vec![1, 4], vec![3]]);
    }
}
