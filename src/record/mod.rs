//! Per-file record (sidecar) emitter.
//!
//! The record is modeled internally as a single structured, serde-serializable
//! document, independent of its on-disk presentation. It is persisted as an
//! RDF/XMP-style XML envelope wrapping the document's JSON form in a single
//! CDATA element, through one bidirectional adapter ([`write_xmp`] /
//! [`read_xmp`]) so format changes never ripple into the pipeline.

use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::model::{CopiedCompanion, CustodyEvent, FileCategory};

const XMPMETA_NS: &str = "adobe:ns:meta/";
const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const RECORD_ELEMENT: &str = "wnb:record";

/// Category-specific sub-record, populated only for the matching category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CategoryDetail {
    Photo {
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
    Video {
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        width: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        height: Option<u32>,
    },
    Audio {
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_seconds: Option<f64>,
    },
    Document {
        #[serde(skip_serializing_if = "Option::is_none")]
        page_count: Option<u32>,
    },
}

/// An ingested (not separately copied) companion: its presence only added
/// fields to the primary's record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedCompanion {
    pub source_path: std::path::PathBuf,
    pub extension: String,
    pub fields_added: Vec<String>,
}

/// The full per-file record, as specified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub schema_version: u32,
    pub sidecar_created: DateTime<Utc>,
    pub sidecar_updated: DateTime<Utc>,

    pub content_hash: String,
    pub content_hash_full: String,
    pub hash_algorithm: String,
    pub file_size: u64,
    pub verified: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash_match: Option<bool>,

    pub file_category: FileCategory,
    pub detected_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_extension: Option<String>,

    pub source_path: std::path::PathBuf,
    pub source_filename: String,
    pub source_host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_volume_serial: Option<String>,
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_device: Option<serde_json::Value>,

    pub original_mtime: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_ctime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_btime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_atime: Option<DateTime<Utc>>,

    pub import_timestamp: DateTime<Utc>,
    pub session_id: String,
    pub tool_version: String,
    pub import_user: String,
    pub import_host: String,
    pub import_platform: String,
    pub import_method: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_file_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_sequence: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_renamed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rename_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_files: Option<Vec<std::path::PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_primary_file: Option<bool>,

    pub custody_chain: Vec<CustodyEvent>,
    pub first_seen: DateTime<Utc>,
    pub event_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_metadata: Option<std::collections::BTreeMap<String, serde_json::Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_detail: Option<CategoryDetail>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copied_companions: Option<Vec<CopiedCompanion>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingested_companions: Option<Vec<IngestedCompanion>>,
}

impl FileRecord {
    /// Append a custody event, bumping `sidecarUpdated` and `eventCount`.
    /// `sidecarCreated` is never touched once set.
    pub fn append_event(&mut self, event: CustodyEvent, now: DateTime<Utc>) {
        self.custody_chain.push(event);
        self.event_count = self.custody_chain.len();
        self.sidecar_updated = now;
    }
}

/// Write `record` as an RDF/XMP envelope at `path` (the caller supplies the
/// full sidecar path, normally `<dest path>.xmp`).
pub fn write_xmp(record: &FileRecord, path: &Path) -> Result<()> {
    let payload = serde_json::to_string(record).map_err(|e| IngestError::Other(e.to_string()))?;

    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut xmpmeta = BytesStart::new("x:xmpmeta");
    xmpmeta.push_attribute(("xmlns:x", XMPMETA_NS));
    writer.write_event(Event::Start(xmpmeta)).map_err(xml_err)?;

    let mut rdf = BytesStart::new("rdf:RDF");
    rdf.push_attribute(("xmlns:rdf", RDF_NS));
    writer.write_event(Event::Start(rdf)).map_err(xml_err)?;

    let mut desc = BytesStart::new("rdf:Description");
    desc.push_attribute(("rdf:about", ""));
    writer.write_event(Event::Start(desc)).map_err(xml_err)?;

    writer
        .write_event(Event::Start(BytesStart::new(RECORD_ELEMENT)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::CData(BytesCData::new(payload.as_str())))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(RECORD_ELEMENT)))
        .map_err(xml_err)?;

    writer
        .write_event(Event::End(BytesEnd::new("rdf:Description")))
        .map_err(xml_err)?;
    writer.write_event(Event::End(BytesEnd::new("rdf:RDF"))).map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new("x:xmpmeta")))
        .map_err(xml_err)?;

    let bytes = writer.into_inner().into_inner();
    std::fs::write(path, bytes).map_err(|source| IngestError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a record previously written by [`write_xmp`] back into a [`FileRecord`].
pub fn read_xmp(path: &Path) -> Result<FileRecord> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf).map_err(xml_err)? {
            Event::CData(cdata) => {
                let text = cdata.into_inner();
                let json = String::from_utf8_lossy(&text);
                return serde_json::from_str(&json).map_err(|e| IngestError::Other(e.to_string()));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Err(IngestError::Other(format!(
        "{}: no record payload found in sidecar",
        path.display()
    )))
}

fn xml_err(e: quick_xml::Error) -> IngestError {
    IngestError::Other(format!("xml error: {e}"))
}

#[cfg(test)]
mod tests;
