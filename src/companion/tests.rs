use super::*;

fn touch(path: &Path, content: &[u8]) {
    std::fs::write(path, content).unwrap();
}

#[test]
fn finds_companion_with_matching_stem() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("clip.MP4"), &vec![0u8; 1024]);
    touch(&dir.path().join("clip.SRT"), b"1\nHello\n");

    let mut resolver = CompanionResolver::new();
    let companions = resolver.find(&dir.path().join("clip.MP4"));
    assert_eq!(companions.len(), 1);
    assert_eq!(companions[0].extension, "srt");
}

#[test]
fn does_not_match_unrelated_files() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("clip.MP4"), &vec![0u8; 16]);
    touch(&dir.path().join("other.SRT"), b"unrelated");

    let mut resolver = CompanionResolver::new();
    let companions = resolver.find(&dir.path().join("clip.MP4"));
    assert!(companions.is_empty());
}

#[test]
fn embed_decision_respects_size_limit() {
    let small = Companion {
        path: PathBuf::from("x.srt"),
        extension: "srt".into(),
        size: 1024,
    };
    let huge = Companion {
        path: PathBuf::from("x.srt"),
        extension: "srt".into(),
        size: 20 * 1024 * 1024,
    };
    assert!(should_embed(&small));
    assert!(!should_embed(&huge));
}

#[test]
fn embed_decision_respects_denylist() {
    let proxy = Companion {
        path: PathBuf::from("x.lrv"),
        extension: "lrv".into(),
        size: 1024,
    };
    assert!(!should_embed(&proxy));
}

#[test]
fn readdir_is_cached_across_lookups_in_same_directory() {
    let dir = tempfile::tempdir().unwrap();
    touch(&dir.path().join("a.MP4"), &vec![0u8; 8]);
    touch(&dir.path().join("a.SRT"), b"a");
    touch(&dir.path().join("b.MP4"), &vec![0u8; 8]);
    touch(&dir.path().join("b.SRT"), b"b");

    let mut resolver = CompanionResolver::new();
    resolver.find(&dir.path().join("a.MP4"));
    assert_eq!(resolver.dir_cache.len(), 1);
    resolver.find(&dir.path().join("b.MP4"));
    assert_eq!(resolver.dir_cache.len(), 1);
}

#[test]
fn to_copied_companion_inlines_small_text_content() {
    let dir = tempfile::tempdir().unwrap();
    let srt = dir.path().join("x.srt");
    touch(&srt, b"subtitle text");

    let companion = Companion {
        path: srt,
        extension: "srt".into(),
        size: 13,
    };
    let copied =
        to_copied_companion(&companion, PathBuf::from("/dest/x.srt"), "deadbeef".into()).unwrap();
    assert!(copied.content_base64.is_some());
}
