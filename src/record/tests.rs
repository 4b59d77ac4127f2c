use super::*;
use crate::model::FileCategory;

fn sample_record() -> FileRecord {
    let now = Utc::now();
    FileRecord {
        schema_version: 1,
        sidecar_created: now,
        sidecar_updated: now,
        content_hash: "0123456789abcdef".into(),
        content_hash_full: "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd".into(),
        hash_algorithm: "blake3".into(),
        file_size: 6,
        verified: true,
        source_hash: Some("0123456789abcdef".into()),
        dest_hash: Some("0123456789abcdef".into()),
        hash_match: Some(true),
        file_category: FileCategory::Document,
        detected_mime_type: "text/plain".into(),
        declared_extension: Some("txt".into()),
        source_path: "/src/a.txt".into(),
        source_filename: "a.txt".into(),
        source_host: "laptop".into(),
        source_volume: None,
        source_volume_serial: None,
        source_type: "local".into(),
        source_device: None,
        original_mtime: now,
        original_ctime: None,
        original_btime: None,
        original_atime: None,
        import_timestamp: now,
        session_id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".into(),
        tool_version: "0.1.0".into(),
        import_user: "alice".into(),
        import_host: "laptop".into(),
        import_platform: "linux".into(),
        import_method: "ingest".into(),
        batch_id: None,
        batch_name: None,
        batch_file_count: None,
        batch_sequence: None,
        was_renamed: Some(false),
        dest_filename: None,
        rename_reason: None,
        related_files: None,
        is_primary_file: Some(true),
        custody_chain: Vec::new(),
        first_seen: now,
        event_count: 0,
        raw_metadata: None,
        category_detail: None,
        copied_companions: None,
        ingested_companions: None,
    }
}

#[test]
fn write_then_read_roundtrips_byte_identical_when_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt.xmp");
    let record = sample_record();

    write_xmp(&record, &path).unwrap();
    let first_bytes = std::fs::read(&path).unwrap();

    let parsed = read_xmp(&path).unwrap();
    write_xmp(&parsed, &path).unwrap();
    let second_bytes = std::fs::read(&path).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(parsed.content_hash, record.content_hash);
}

#[test]
fn xmp_envelope_contains_rdf_markers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt.xmp");
    write_xmp(&sample_record(), &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("x:xmpmeta"));
    assert!(content.contains("rdf:RDF"));
    assert!(content.contains("wnb:record"));
}

#[test]
fn append_event_bumps_updated_but_not_created() {
    let mut record = sample_record();
    let created = record.sidecar_created;
    let later = created + chrono::Duration::seconds(5);

    record.append_event(
        crate::model::CustodyEvent {
            event_id: "evt-1".into(),
            event_timestamp: later,
            event_action: crate::model::CustodyAction::FixityCheck,
            event_outcome: crate::model::CustodyOutcome::Success,
            event_location: None,
            event_host: "laptop".into(),
            event_user: "alice".into(),
            event_tool: "wnb-ingest".into(),
            event_hash: None,
            event_hash_algorithm: None,
            event_notes: None,
        },
        later,
    );

    assert_eq!(record.sidecar_created, created);
    assert_eq!(record.sidecar_updated, later);
    assert_eq!(record.event_count, 1);
}

#[test]
fn hash_match_absent_when_dest_hash_absent() {
    let mut record = sample_record();
    record.dest_hash = None;
    record.hash_match = None;
    record.verified = false;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.txt.xmp");
    write_xmp(&record, &path).unwrap();
    let parsed = read_xmp(&path).unwrap();
    assert!(parsed.hash_match.is_none());
}
