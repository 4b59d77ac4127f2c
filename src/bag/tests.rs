use super::*;

#[test]
fn copy_out_bag_has_correct_payload_oxum() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("a.txt"), vec![1u8; 10]).unwrap();
    std::fs::write(src.path().join("b.txt"), vec![2u8; 20]).unwrap();
    std::fs::create_dir(src.path().join("sub")).unwrap();
    std::fs::write(src.path().join("sub/c.txt"), vec![3u8; 4096]).unwrap();

    let bag_dir = tempfile::tempdir().unwrap();
    let info = create_bag(src.path(), bag_dir.path(), HashAlgorithm::Sha256, BagMode::CopyOut).unwrap();
    assert_eq!(info.payload_bytes, 10 + 20 + 4096);
    assert_eq!(info.payload_count, 3);

    let bag_info = std::fs::read_to_string(bag_dir.path().join("bag-info.txt")).unwrap();
    assert!(bag_info.contains("Payload-Oxum: 4126.3"));
}

#[test]
fn freshly_created_bag_verifies_clean() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("a.txt"), b"hello").unwrap();

    let bag_dir = tempfile::tempdir().unwrap();
    create_bag(src.path(), bag_dir.path(), HashAlgorithm::Sha256, BagMode::CopyOut).unwrap();

    let report = verify_bag(bag_dir.path(), HashAlgorithm::Sha256).unwrap();
    assert!(report.valid);
    assert_eq!(report.verified_files, 1);
    assert!(report.missing.is_empty());
    assert!(report.invalid.is_empty());
    assert!(report.extra.is_empty());
}

#[test]
fn corrupted_payload_file_is_reported_invalid() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("a.txt"), b"hello").unwrap();

    let bag_dir = tempfile::tempdir().unwrap();
    create_bag(src.path(), bag_dir.path(), HashAlgorithm::Sha256, BagMode::CopyOut).unwrap();

    std::fs::write(bag_dir.path().join("data/a.txt"), b"corrupted!").unwrap();

    let report = verify_bag(bag_dir.path(), HashAlgorithm::Sha256).unwrap();
    assert!(!report.valid);
    assert_eq!(report.invalid.len(), 1);
    assert_eq!(report.invalid[0].path, "data/a.txt");
}

#[test]
fn missing_payload_file_is_reported() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("a.txt"), b"hello").unwrap();
    std::fs::write(src.path().join("b.txt"), b"world").unwrap();

    let bag_dir = tempfile::tempdir().unwrap();
    create_bag(src.path(), bag_dir.path(), HashAlgorithm::Sha256, BagMode::CopyOut).unwrap();
    std::fs::remove_file(bag_dir.path().join("data/b.txt")).unwrap();

    let report = verify_bag(bag_dir.path(), HashAlgorithm::Sha256).unwrap();
    assert!(!report.valid);
    assert_eq!(report.missing, vec!["data/b.txt".to_string()]);
}

#[test]
fn in_place_bag_moves_source_contents_under_data() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("a.txt"), b"content").unwrap();

    create_bag(src.path(), src.path(), HashAlgorithm::Sha256, BagMode::InPlace).unwrap();

    assert!(src.path().join("data/a.txt").exists());
    assert!(!src.path().join("a.txt").exists());
    assert!(src.path().join("bagit.txt").exists());
}

#[test]
fn blake3_bag_manifest_filename_matches_digest_algorithm() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("a.txt"), b"hello").unwrap();

    let bag_dir = tempfile::tempdir().unwrap();
    create_bag(src.path(), bag_dir.path(), HashAlgorithm::Blake3, BagMode::CopyOut).unwrap();

    let manifest_path = bag_dir.path().join("manifest-blake3.txt");
    let manifest = std::fs::read_to_string(&manifest_path).unwrap();
    let line = manifest.lines().next().unwrap();
    let recorded_hash = line.split("  ").next().unwrap();
    assert_eq!(recorded_hash, crate::hasher::hash_file(HashAlgorithm::Blake3, &src.path().join("a.txt")).unwrap());

    let report = verify_bag(bag_dir.path(), HashAlgorithm::Blake3).unwrap();
    assert!(report.valid);
    assert_eq!(report.verified_files, 1);
}

#[test]
fn manifest_and_tagmanifest_use_two_space_separator() {
    let src = tempfile::tempdir().unwrap();
    std::fs::write(src.path().join("a.txt"), b"content").unwrap();

    let bag_dir = tempfile::tempdir().unwrap();
    create_bag(src.path(), bag_dir.path(), HashAlgorithm::Sha256, BagMode::CopyOut).unwrap();

    let manifest = std::fs::read_to_string(bag_dir.path().join("manifest-sha256.txt")).unwrap();
    let line = manifest.lines().next().unwrap();
    assert!(line.contains("  data/a.txt"));
}
