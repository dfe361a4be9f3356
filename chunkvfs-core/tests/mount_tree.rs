use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chunkvfs_core::hash::{hex16, path_hash};
use chunkvfs_core::{
    ArchiveReader, MemoryArchive, MountOptions, PathResolver, VfsError, Workspace, pack,
};

fn table(paths: &[&str]) -> PathResolver {
    let mut r = PathResolver::new();
    r.insert_many(paths.iter().map(|p| (path_hash(p), *p)));
    r
}

fn names(ws: &Workspace, ids: &[chunkvfs_core::NodeId]) -> Vec<String> {
    ids.iter()
        .map(|id| ws.tree().get(*id).unwrap().name().to_string())
        .collect()
}

#[test]
fn packed_archive_mounts_and_reads_back() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("input");
    fs::create_dir_all(input.join("Data/Characters")).unwrap();
    fs::write(input.join("Data/Characters/a.bin"), "abc".repeat(2000)).unwrap();
    fs::write(input.join("Data/b.txt"), "short").unwrap();
    fs::write(input.join("top.bin"), [0u8, 1, 2, 3]).unwrap();

    let out = tmp.path().join("out.cvfs");
    let summary = pack(&[input.as_path()], &out, None).unwrap();
    assert_eq!(summary.paths.len(), 3);
    assert_eq!(summary.compressed + summary.stored, 3);

    let mut resolver = PathResolver::new();
    resolver.insert_many(summary.paths.iter().map(|(h, p)| (*h, p.as_str())));
    let mut ws = Workspace::new(resolver, MountOptions::default());
    let reports = ws.mount_paths(&[out.clone()]);
    assert_eq!(reports.len(), 1);
    let report = reports.into_iter().next().unwrap().unwrap();
    assert_eq!(report.stats.resolved, 3);

    let archive = ws.archive(report.mount).unwrap();
    assert_eq!(ws.tree().file_count(), archive.chunks().len());

    let id = ws.find_by_path("Data/Characters/a.bin").unwrap();
    let mut content = String::new();
    ws.open_file(id).unwrap().read_to_string(&mut content).unwrap();
    assert_eq!(content, "abc".repeat(2000));

    // directories first, then files
    assert_eq!(names(&ws, ws.tree().roots()), ["Data", "top.bin"]);
}

#[test]
fn parallel_mounts_share_one_directory() {
    let r = table(&["Data/x.bin", "Data/y.bin", "Data/z.bin"]);
    let mut ws = Workspace::new(r, MountOptions::default());
    let a: Arc<dyn ArchiveReader> = Arc::new(
        MemoryArchive::new()
            .with_file("Data/x.bin", "x")
            .with_file("Data/z.bin", "z"),
    );
    let b: Arc<dyn ArchiveReader> = Arc::new(MemoryArchive::new().with_file("Data/y.bin", "y"));

    let reports = ws.mount_archives(vec![("a".into(), a), ("b".into(), b)]);
    assert!(reports.iter().all(|r| r.is_ok()));

    let tree = ws.tree();
    assert_eq!(tree.roots().len(), 1);
    let data = tree.get(tree.roots()[0]).unwrap();
    assert_eq!(data.name(), "Data");
    assert_eq!(names(&ws, data.children()), ["x.bin", "y.bin", "z.bin"]);
}

#[test]
fn merged_paths_build_one_chain() {
    let mut ws = Workspace::new(table(&["a/b/x", "a/b/y"]), MountOptions::default());
    ws.mount(
        "m",
        Arc::new(MemoryArchive::new().with_file("a/b/x", "1").with_file("a/b/y", "2")),
    )
    .unwrap();
    let paths: Vec<&str> = ws.tree().traverse_all().map(|n| n.path()).collect();
    assert_eq!(paths, ["a", "a/b", "a/b/x", "a/b/y"]);
}

#[test]
fn hashtable_reload_renames_nodes() {
    let tmp = tempfile::tempdir().unwrap();
    let mut ws = Workspace::new(PathResolver::new(), MountOptions::default());
    ws.mount(
        "m",
        Arc::new(MemoryArchive::new().with_file("textures/a.dds", "DDS |rest of header")),
    )
    .unwrap();
    let hash = path_hash("textures/a.dds");
    let guessed = format!("{}.dds", hex16(hash));
    assert!(ws.find_by_path(&guessed).is_some());

    let table_file = tmp.path().join("hashes.txt");
    fs::write(&table_file, format!("{} textures/a.dds\n", hex16(hash))).unwrap();
    let stats = ws.load_hashtables(&[&table_file]).unwrap();
    assert_eq!(stats.added, 1);
    assert_eq!(ws.resolver().sources(), [table_file.clone()]);
    assert!(ws.find_by_path(&guessed).is_none());
    assert!(ws.find_by_path("textures/a.dds").is_some());
    assert_eq!(ws.tree().file_count(), 1);

    // a missing file keeps the current table
    assert!(ws.load_hashtables(&[tmp.path().join("missing.txt")]).is_err());
    assert!(ws.find_by_path("textures/a.dds").is_some());
}

#[test]
fn loading_another_hashtable_keeps_earlier_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let first = tmp.path().join("first.txt");
    let second = tmp.path().join("second.txt");
    fs::write(&first, "first/a.bin\n").unwrap();
    fs::write(
        &second,
        format!(
            "second/b.bin\n{} renamed/a.bin\n",
            hex16(path_hash("first/a.bin"))
        ),
    )
    .unwrap();

    let (resolver, _) = PathResolver::from_files(&[&first]).unwrap();
    let mut ws = Workspace::new(resolver, MountOptions::default());
    ws.mount(
        "m",
        Arc::new(
            MemoryArchive::new()
                .with_file("first/a.bin", "a")
                .with_file("second/b.bin", "b"),
        ),
    )
    .unwrap();
    assert!(ws.find_by_path("first/a.bin").is_some());
    assert!(ws.find_by_path("second/b.bin").is_none());

    let stats = ws.load_hashtables(&[&second]).unwrap();
    assert_eq!((stats.added, stats.duplicates), (1, 1));
    assert_eq!(ws.resolver().sources(), [first.clone(), second.clone()]);
    assert!(ws.find_by_path("first/a.bin").is_some());
    assert!(ws.find_by_path("second/b.bin").is_some());
    assert!(ws.find_by_path("renamed/a.bin").is_none());

    // replacing drops the first table
    ws.replace_hashtables(&[&second]).unwrap();
    assert_eq!(ws.resolver().sources(), [second]);
    assert!(ws.find_by_path("renamed/a.bin").is_some());
    assert!(ws.find_by_path("first/a.bin").is_none());
}

#[test]
fn failed_mount_does_not_stop_others() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("in");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("f.bin"), "data").unwrap();
    let good = tmp.path().join("good.cvfs");
    pack(&[input.as_path()], &good, None).unwrap();
    let bad = tmp.path().join("bad.cvfs");
    fs::write(&bad, "not an archive at all").unwrap();

    let mut ws = Workspace::new(table(&["f.bin"]), MountOptions::default());
    let reports = ws.mount_paths(&[bad.clone(), good]);
    assert!(matches!(&reports[0], Err(VfsError::Mount { label, .. }) if Path::new(label) == bad));
    assert!(reports[1].is_ok());
    assert_eq!(ws.mounts().len(), 1);
    assert!(ws.find_by_path("f.bin").is_some());
}

#[test]
fn filtered_visibility_follows_expansion() {
    let mut ws = Workspace::new(table(&["a/b/x.bin", "a/c/y.bin"]), MountOptions::default());
    ws.mount(
        "m",
        Arc::new(
            MemoryArchive::new()
                .with_file("a/b/x.bin", "x")
                .with_file("a/c/y.bin", "y"),
        ),
    )
    .unwrap();
    ws.set_filter("y", false).unwrap();
    assert_eq!(names(&ws, &ws.tree().visible()), ["a"]);

    let a = ws.find_by_path("a").unwrap();
    let c = ws.find_by_path("a/c").unwrap();
    ws.set_expanded(a, true).unwrap();
    ws.set_expanded(c, true).unwrap();
    assert_eq!(names(&ws, &ws.tree().visible()), ["a", "c", "y.bin"]);

    assert!(matches!(
        ws.set_filter("(", true),
        Err(VfsError::InvalidFilter(_))
    ));
}
