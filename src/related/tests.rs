use super::*;

#[test]
fn raw_and_jpeg_group_with_raw_primary() {
    let paths = vec![
        PathBuf::from("/roll/IMG_0001.JPG"),
        PathBuf::from("/roll/IMG_0001.CR2"),
    ];
    let groups = resolve_related(&paths);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].primary, PathBuf::from("/roll/IMG_0001.CR2"));
    assert_eq!(groups[0].members.len(), 2);
}

#[test]
fn live_photo_pair_groups_with_video_primary() {
    let paths = vec![
        PathBuf::from("/roll/IMG_0002.HEIC"),
        PathBuf::from("/roll/IMG_0002.MOV"),
    ];
    let groups = resolve_related(&paths);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].primary, PathBuf::from("/roll/IMG_0002.MOV"));
}

#[test]
fn avchd_clip_groups_with_mts_primary() {
    let paths = vec![
        PathBuf::from("/clip/00001.MTS"),
        PathBuf::from("/clip/00001.MOI"),
    ];
    let groups = resolve_related(&paths);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].primary, PathBuf::from("/clip/00001.MTS"));
}

#[test]
fn subtitle_sidecar_never_joins_its_same_stem_video_group() {
    let paths = vec![PathBuf::from("/clip/clip.MP4"), PathBuf::from("/clip/clip.SRT")];
    let groups = resolve_related(&paths);
    assert_eq!(groups.len(), 2);
    let video_group = groups.iter().find(|g| g.primary == PathBuf::from("/clip/clip.MP4")).unwrap();
    assert_eq!(video_group.members, vec![PathBuf::from("/clip/clip.MP4")]);
    let srt_group = groups.iter().find(|g| g.primary == PathBuf::from("/clip/clip.SRT")).unwrap();
    assert_eq!(srt_group.members, vec![PathBuf::from("/clip/clip.SRT")]);
}

#[test]
fn singleton_files_remain_their_own_group() {
    let paths = vec![PathBuf::from("/roll/only.jpg")];
    let groups = resolve_related(&paths);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].primary, PathBuf::from("/roll/only.jpg"));
    assert_eq!(groups[0].members.len(), 1);
}

#[test]
fn different_directories_never_group_together() {
    let paths = vec![
        PathBuf::from("/a/IMG_0001.JPG"),
        PathBuf::from("/b/IMG_0001.JPG"),
    ];
    let groups = resolve_related(&paths);
    assert_eq!(groups.len(), 2);
}

#[test]
fn grouping_is_stable_regardless_of_input_order() {
    let forward = vec![
        PathBuf::from("/roll/IMG_0001.JPG"),
        PathBuf::from("/roll/IMG_0001.CR2"),
    ];
    let reversed = vec![
        PathBuf::from("/roll/IMG_0001.CR2"),
        PathBuf::from("/roll/IMG_0001.JPG"),
    ];
    assert_eq!(
        resolve_related(&forward)[0].primary,
        resolve_related(&reversed)[0].primary
    );
}
