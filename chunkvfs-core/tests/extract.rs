use std::fs;
use std::sync::Arc;

use chunkvfs_core::hash::{hex16, path_hash};
use chunkvfs_core::{
    CancelToken, ExtractOptions, MemoryArchive, MountOptions, PathResolver, VfsError, Workspace,
};

fn workspace(files: &[(&str, &str)]) -> Workspace {
    let mut resolver = PathResolver::new();
    resolver.insert_many(files.iter().map(|(p, _)| (path_hash(p), *p)));
    let mut archive = MemoryArchive::new();
    for (path, data) in files {
        archive = archive.with_file(path, *data);
    }
    let mut ws = Workspace::new(resolver, MountOptions::default());
    ws.mount("test", Arc::new(archive)).unwrap();
    ws
}

#[test]
fn checked_files_land_under_the_root() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ws = workspace(&[
        ("data/chars/a.bin", "alpha"),
        ("data/chars/b.bin", "beta"),
        ("data/maps/m.bin", "map"),
    ]);
    let chars = ws.find_by_path("data/chars").unwrap();
    ws.tree_mut().check_subtree(chars, true).unwrap();
    let nodes = ws.checked_files();
    assert_eq!(nodes.len(), 2);

    let report = ws
        .extract(&nodes, tmp.path(), &ExtractOptions::default(), &CancelToken::new())
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.bytes_written(), 9);
    assert_eq!(
        fs::read_to_string(tmp.path().join("data/chars/a.bin")).unwrap(),
        "alpha"
    );
    assert!(!tmp.path().join("data/maps/m.bin").exists());
}

#[test]
fn overlong_destination_is_flattened() {
    let tmp = tempfile::tempdir().unwrap();
    let long = format!("{}/deep/texture.dds", "x".repeat(280));
    let ws = workspace(&[(long.as_str(), "pixels")]);
    let nodes = ws.all_files();

    let report = ws
        .extract(&nodes, tmp.path(), &ExtractOptions::default(), &CancelToken::new())
        .unwrap();
    let flat = tmp.path().join(format!("{}.dds", hex16(path_hash(&long))));
    assert_eq!(report.extracted, [(flat.clone(), 6)]);
    assert_eq!(fs::read_to_string(flat).unwrap(), "pixels");
}

#[test]
fn strip_prefix_extracts_relative_paths() {
    let tmp = tempfile::tempdir().unwrap();
    let ws = workspace(&[("data/chars/a.bin", "alpha")]);
    let opts = ExtractOptions {
        strip_prefix: Some("data/chars".into()),
        ..Default::default()
    };
    ws.extract(&ws.all_files(), tmp.path(), &opts, &CancelToken::new())
        .unwrap();
    assert!(tmp.path().join("a.bin").is_file());
}

#[test]
fn cancelled_batch_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let ws = workspace(&[("a.bin", "a"), ("b.bin", "b")]);
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = ws
        .extract(&ws.all_files(), tmp.path(), &ExtractOptions::default(), &cancel)
        .unwrap();
    assert_eq!(report.skipped, 2);
    assert!(report.extracted.is_empty());
    assert!(!tmp.path().join("a.bin").exists());
}

#[test]
fn write_failures_are_reported_per_file() {
    let tmp = tempfile::tempdir().unwrap();
    // a regular file where a directory is needed
    fs::write(tmp.path().join("blocked"), "").unwrap();
    let ws = workspace(&[("blocked/a.bin", "a"), ("free.bin", "f")]);

    let report = ws
        .extract(&ws.all_files(), tmp.path(), &ExtractOptions::default(), &CancelToken::new())
        .unwrap();
    assert_eq!(report.extracted.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, tmp.path().join("blocked").join("a.bin"));
    assert!(tmp.path().join("free.bin").is_file());
}

#[test]
fn directories_are_reported_not_extracted() {
    let tmp = tempfile::tempdir().unwrap();
    let ws = workspace(&[("d/a.bin", "a")]);
    let dir = ws.find_by_path("d").unwrap();
    let file = ws.find_by_path("d/a.bin").unwrap();

    let report = ws
        .extract(&[dir, file], tmp.path(), &ExtractOptions::default(), &CancelToken::new())
        .unwrap();
    assert_eq!(report.extracted.len(), 1);
    assert!(matches!(
        report.failed.as_slice(),
        [(_, VfsError::NotAFile(id))] if *id == dir
    ));
}

#[test]
fn unsafe_path_does_not_block_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let mut resolver = PathResolver::new();
    resolver.insert(path_hash("evil.bin"), "../escape.bin");
    resolver.insert(path_hash("ok.bin"), "ok.bin");
    let mut ws = Workspace::new(resolver, MountOptions::default());
    ws.mount(
        "m",
        Arc::new(
            MemoryArchive::new()
                .with_file("evil.bin", "evil")
                .with_file("ok.bin", "fine"),
        ),
    )
    .unwrap();

    let report = ws
        .extract(&ws.all_files(), &out, &ExtractOptions::default(), &CancelToken::new())
        .unwrap();
    assert_eq!(fs::read_to_string(out.join("ok.bin")).unwrap(), "fine");
    assert!(!tmp.path().join("escape.bin").exists());
    assert_eq!(report.extracted.len(), 1);
    assert!(matches!(
        report.failed.as_slice(),
        [(_, VfsError::UnsafePath(p))] if p == "../escape.bin"
    ));
}

#[test]
fn shared_path_across_archives_keeps_the_later_leaf() {
    let tmp = tempfile::tempdir().unwrap();
    let big = "x".repeat(1 << 20);
    let mut resolver = PathResolver::new();
    resolver.insert(path_hash("d/same.bin"), "d/same.bin");
    let mut ws = Workspace::new(resolver, MountOptions::default());
    ws.mount("big", Arc::new(MemoryArchive::new().with_file("d/same.bin", big.as_str())))
        .unwrap();
    ws.mount("small", Arc::new(MemoryArchive::new().with_file("d/same.bin", "s")))
        .unwrap();
    let nodes = ws.all_files();
    assert_eq!(nodes.len(), 2);

    let report = ws
        .extract(&nodes, tmp.path(), &ExtractOptions::default(), &CancelToken::new())
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.extracted.len(), 2);
    assert_eq!(
        fs::read_to_string(tmp.path().join("d").join("same.bin")).unwrap(),
        "s"
    );
}
