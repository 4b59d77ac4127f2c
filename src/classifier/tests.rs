use super::*;

#[test]
fn detects_jpeg_by_magic_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend(std::iter::repeat(0u8).take(64));
    std::fs::write(&path, &data).unwrap();

    let c = classify(&path).unwrap();
    assert_eq!(c.category, FileCategory::Image);
    assert_eq!(c.mime_type, "image/jpeg");
    assert!(!c.extension_mismatch);
}

#[test]
fn flags_extension_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fake.png");
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
    data.extend(std::iter::repeat(0u8).take(64));
    std::fs::write(&path, &data).unwrap();

    let c = classify(&path).unwrap();
    assert_eq!(c.category, FileCategory::Image);
    assert_eq!(c.detected_extension.as_deref(), Some("jpg"));
    assert!(c.extension_mismatch);
}

#[test]
fn falls_back_to_extension_for_sidecars() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.srt");
    std::fs::write(&path, b"1\n00:00:00,000 --> 00:00:01,000\nHello\n").unwrap();

    let c = classify(&path).unwrap();
    assert_eq!(c.category, FileCategory::Sidecar);
}

#[test]
fn unknown_content_classifies_as_other() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mystery.bin");
    std::fs::write(&path, b"not a recognized format at all").unwrap();

    let c = classify(&path).unwrap();
    assert_eq!(c.category, FileCategory::Other);
}

#[test]
fn zero_byte_file_classifies_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.dat");
    std::fs::write(&path, b"").unwrap();

    let c = classify(&path).unwrap();
    assert_eq!(c.category, FileCategory::Other);
}
