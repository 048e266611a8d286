use super::*;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::PathBuf;
use test_support::TestTree;

fn relative_paths(walker: Walker) -> Vec<PathBuf> {
    walker
        .map(|item| item.expect("walk entry"))
        .filter(|entry| !entry.is_root())
        .map(|entry| entry.relative_path().to_path_buf())
        .collect()
}

fn layout() -> TestTree {
    let tree = TestTree::new().expect("tree");
    tree.dir("root/a").expect("dir a");
    tree.dir("root/b").expect("dir b");
    tree.file("root/a/inner.txt", b"data").expect("inner");
    tree.file("root/c.txt", b"data").expect("file c");
    tree
}

#[test]
fn missing_root_fails_to_build() {
    let tree = TestTree::new().expect("tree");
    let missing = tree.join("absent");
    let Err(error) = WalkBuilder::new(&missing).build() else {
        panic!("a missing root cannot be walked");
    };
    assert!(matches!(error, WalkError::Root { .. }));
    assert_eq!(error.path(), missing.as_path());
    assert_eq!(error.into_io_error().kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn file_root_is_a_single_entry() {
    let tree = TestTree::new().expect("tree");
    let file = tree.file("file.txt", b"contents").expect("file");

    let mut walker = WalkBuilder::new(&file).build().expect("build walker");
    let entry = walker.next().expect("entry").expect("entry ok");
    assert!(entry.is_root());
    assert!(entry.relative_path().as_os_str().is_empty());
    assert_eq!(entry.full_path(), file);
    assert!(walker.next().is_none());
}

#[test]
fn children_are_visited_in_name_order() {
    let tree = layout();
    let walker = WalkBuilder::new(tree.join("root")).build().expect("build walker");
    assert_eq!(
        relative_paths(walker),
        vec![
            PathBuf::from("a"),
            PathBuf::from("a/inner.txt"),
            PathBuf::from("b"),
            PathBuf::from("c.txt"),
        ]
    );
}

#[test]
fn root_comes_first_in_pre_order() {
    let tree = layout();
    let mut walker = WalkBuilder::new(tree.join("root")).build().expect("build walker");
    let first = walker.next().expect("entry").expect("ok");
    assert!(first.is_root());
    assert!(first.relative_path().as_os_str().is_empty());
}

#[test]
fn contents_first_yields_children_before_parents() {
    let tree = layout();
    let walker = WalkBuilder::new(tree.join("root"))
        .contents_first(true)
        .build()
        .expect("build walker");

    let paths: Vec<PathBuf> = walker
        .map(|entry| entry.expect("entry").relative_path().to_path_buf())
        .collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("a/inner.txt"),
            PathBuf::from("a"),
            PathBuf::from("b"),
            PathBuf::from("c.txt"),
            PathBuf::new(),
        ]
    );
}

#[test]
fn physical_walk_reports_links_without_descending() {
    let tree = TestTree::new().expect("tree");
    tree.dir("root").expect("root");
    let target = tree.dir("target").expect("target");
    tree.file("target/inner.txt", b"data").expect("inner");
    tree.symlink(&target, "root/link").expect("link");

    let walker = WalkBuilder::new(tree.join("root")).build().expect("build walker");
    let entries: Vec<_> = walker.map(|entry| entry.expect("entry")).collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[1].metadata().file_type().is_symlink());
}

#[test]
fn logical_walk_descends_through_links() {
    let tree = TestTree::new().expect("tree");
    tree.dir("root").expect("root");
    let target = tree.dir("target").expect("target");
    tree.file("target/inner.txt", b"data").expect("inner");
    tree.symlink(&target, "root/link").expect("link");

    let walker = WalkBuilder::new(tree.join("root"))
        .follow_symlinks(true)
        .build()
        .expect("build walker");
    let entries: Vec<_> = walker.map(|entry| entry.expect("entry")).collect();
    let paths: Vec<_> = entries
        .iter()
        .filter(|entry| !entry.is_root())
        .map(|entry| entry.relative_path().to_path_buf())
        .collect();
    assert_eq!(paths, vec![PathBuf::from("link"), PathBuf::from("link/inner.txt")]);
    assert!(entries[1].metadata().is_dir());
    assert_eq!(entries[2].full_path(), tree.join("root/link/inner.txt"));
}

#[test]
fn logical_walk_reports_dangling_link_itself() {
    let tree = TestTree::new().expect("tree");
    tree.dir("root").expect("root");
    tree.symlink("missing", "root/dangling").expect("link");

    let walker = WalkBuilder::new(tree.join("root"))
        .follow_symlinks(true)
        .build()
        .expect("build walker");
    let entries: Vec<_> = walker.map(|entry| entry.expect("entry")).collect();
    assert_eq!(entries.len(), 2);
    assert!(entries[1].metadata().file_type().is_symlink());
}

#[test]
fn link_back_to_root_is_not_descended() {
    let tree = TestTree::new().expect("tree");
    let root = tree.dir("root").expect("root");
    tree.symlink(&root, "root/self").expect("cycle");

    let walker = WalkBuilder::new(&root)
        .follow_symlinks(true)
        .build()
        .expect("build walker");
    assert_eq!(relative_paths(walker), vec![PathBuf::from("self")]);
}

#[test]
fn linked_directory_is_descended_once() {
    let tree = TestTree::new().expect("tree");
    tree.dir("root/real").expect("real");
    tree.file("root/real/f", b"").expect("file");
    tree.symlink("real", "root/alias").expect("alias");

    let walker = WalkBuilder::new(tree.join("root"))
        .follow_symlinks(true)
        .build()
        .expect("build walker");
    assert_eq!(
        relative_paths(walker),
        vec![
            PathBuf::from("alias"),
            PathBuf::from("alias/f"),
            PathBuf::from("real"),
        ]
    );
}

#[test]
fn same_file_system_keeps_root_device() {
    let tree = layout();
    let root = tree.join("root");
    let device = fs::metadata(&root).expect("stat").dev();

    let walker = WalkBuilder::new(&root)
        .follow_symlinks(true)
        .same_file_system(true)
        .build()
        .expect("build walker");
    let entries: Vec<_> = walker.map(|entry| entry.expect("entry")).collect();
    assert_eq!(entries.len(), 5);
    assert!(entries.iter().all(|entry| entry.metadata().dev() == device));
}

#[test]
fn unreadable_directory_is_reported_and_walk_continues() {
    use std::os::unix::fs::PermissionsExt;

    if running_as_root() {
        return;
    }
    let tree = layout();
    let locked = tree.join("root/a");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("lock");

    let walker = WalkBuilder::new(tree.join("root")).build().expect("build walker");
    let results: Vec<_> = walker.collect();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("unlock");

    let errors: Vec<_> = results.iter().filter_map(|item| item.as_ref().err()).collect();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], WalkError::ListDirectory { .. }));

    let paths: Vec<_> = results
        .iter()
        .filter_map(|item| item.as_ref().ok())
        .map(|entry| entry.relative_path().to_path_buf())
        .collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::new(),
            PathBuf::from("a"),
            PathBuf::from("b"),
            PathBuf::from("c.txt"),
        ]
    );
}

fn running_as_root() -> bool {
    fs::metadata("/proc/self")
        .map(|metadata| metadata.uid() == 0)
        .unwrap_or(true)
}
