use super::*;

fn touch(path: &Path, content: &[u8]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

#[test]
fn scan_is_sorted_and_recursive() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("b.txt"), b"b");
    touch(&root.join("a.txt"), b"a");
    touch(&root.join("sub/c.txt"), b"c");

    let files = scan(root, &ScanOptions::default()).unwrap();
    let paths: Vec<_> = files.iter().map(|f| f.relative_path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("a.txt"),
            PathBuf::from("b.txt"),
            PathBuf::from("sub/c.txt"),
        ]
    );
}

#[test]
fn scan_skips_os_metadata_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(&root.join(".DS_Store"), b"junk");
    touch(&root.join("Thumbs.db"), b"junk");
    touch(&root.join("real.txt"), b"real");

    let files = scan(root, &ScanOptions::default()).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].relative_path, PathBuf::from("real.txt"));
}

#[test]
fn scan_does_not_follow_symlinks() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let target = root.join("real.txt");
    touch(&target, b"content");

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, root.join("link.txt")).unwrap();
        let files = scan(root, &ScanOptions::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, PathBuf::from("real.txt"));
    }
}

#[test]
fn scan_applies_include_and_exclude_globs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(&root.join("photo.jpg"), b"jpg");
    touch(&root.join("photo.raw"), b"raw");
    touch(&root.join("notes.txt"), b"txt");

    let opts = ScanOptions {
        include: vec!["*.jpg".into(), "*.raw".into()],
        exclude: vec!["*.raw".into()],
        skip_hidden: false,
    };
    let files = scan(root, &opts).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].relative_path, PathBuf::from("photo.jpg"));
}

#[test]
fn scan_skips_hidden_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    touch(&root.join(".hidden"), b"h");
    touch(&root.join("visible.txt"), b"v");

    let opts = ScanOptions {
        skip_hidden: true,
        ..Default::default()
    };
    let files = scan(root, &opts).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].relative_path, PathBuf::from("visible.txt"));
}
