use super::*;
use crate::model::HashAlgorithm;

#[test]
fn blake3_of_empty_file_matches_known_digest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    std::fs::write(&path, b"").unwrap();
    let h = hash_file(HashAlgorithm::Blake3, &path).unwrap();
    assert_eq!(h, blake3::hash(b"").to_hex().to_string());
}

#[test]
fn blake3_short_is_prefix_of_full() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.bin");
    std::fs::write(&path, b"hello\n").unwrap();
    let full = hash_file(HashAlgorithm::Blake3, &path).unwrap();
    let short = hash_file(HashAlgorithm::Blake3Short, &path).unwrap();
    assert_eq!(short, &full[..16]);
    assert_eq!(short.len(), 16);
}

#[test]
fn hashing_twice_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.bin");
    std::fs::write(&path, vec![9u8; 200_000]).unwrap();
    let a = hash_file(HashAlgorithm::Sha256, &path).unwrap();
    let b = hash_file(HashAlgorithm::Sha256, &path).unwrap();
    assert_eq!(a, b);
}

#[test]
fn hash_all_agrees_with_individual_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.bin");
    std::fs::write(&path, b"some content for hashing").unwrap();

    let all = hash_all(&path).unwrap();
    assert_eq!(all.blake3_full, hash_file(HashAlgorithm::Blake3, &path).unwrap());
    assert_eq!(all.sha256, hash_file(HashAlgorithm::Sha256, &path).unwrap());
    assert_eq!(all.sha512, hash_file(HashAlgorithm::Sha512, &path).unwrap());
    assert_eq!(all.blake3_short, short_hash(&all.blake3_full));
}

#[test]
fn large_file_crosses_mmap_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.bin");
    let content = vec![3u8; crate::common::io::MMAP_THRESHOLD as usize + 1];
    std::fs::write(&path, &content).unwrap();

    let via_mmap_path = hash_file(HashAlgorithm::Blake3, &path).unwrap();
    let via_direct = blake3::hash(&content).to_hex().to_string();
    assert_eq!(via_mmap_path, via_direct);
}

#[test]
fn hex_table_matches_format_macro() {
    let bytes = [0u8, 1, 15, 16, 255];
    let expected: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    assert_eq!(hex_encode(&bytes), expected);
}
