use super::*;

#[test]
fn build_sorts_entries_by_path() {
    let inputs = vec![
        ManifestInput {
            relative_path: PathBuf::from("b.txt"),
            hash: "bb".into(),
            size: 2,
            mtime: None,
        },
        ManifestInput {
            relative_path: PathBuf::from("a.txt"),
            hash: "aa".into(),
            size: 1,
            mtime: None,
        },
    ];
    let manifest = build(Path::new("/root"), &inputs, 16, Utc::now());
    assert_eq!(manifest.files[0].path, "a.txt");
    assert_eq!(manifest.files[1].path, "b.txt");
    assert_eq!(manifest.total_bytes, 3);
    assert_eq!(manifest.file_count, 2);
}

#[test]
fn write_then_read_roundtrips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.json");
    let inputs = vec![ManifestInput {
        relative_path: PathBuf::from("a.txt"),
        hash: "aa".into(),
        size: 1,
        mtime: Some(Utc::now()),
    }];
    let manifest = build(dir.path(), &inputs, 16, Utc::now());
    write(&manifest, &path).unwrap();

    let read_back = read(&path).unwrap();
    assert_eq!(read_back.file_count, 1);
    assert_eq!(read_back.files[0].hash, "aa");
}

#[test]
fn paths_use_forward_slashes() {
    let inputs = vec![ManifestInput {
        relative_path: PathBuf::from("sub").join("a.txt"),
        hash: "aa".into(),
        size: 1,
        mtime: None,
    }];
    let manifest = build(Path::new("/root"), &inputs, 16, Utc::now());
    assert!(!manifest.files[0].path.contains('\\'));
    assert_eq!(manifest.files[0].path, "sub/a.txt");
}
