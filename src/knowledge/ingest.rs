//! Raw record parsing and knowledge directory loading.
//!
//! Records are loose JSON objects. The record kind comes from the `type`
//! field, or is inferred from shape (`question` + `answer` is an FAQ, `name`
//! is a product). Anything else is skipped with a warning rather than
//! failing the whole ingestion.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::{Document, DocumentMetadata, SourceKind, faq_text, product_text};
use crate::error::RetrievalError;

const DEFAULT_CATEGORY: &str = "General";

/// Counters describing one ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestReport {
    /// Documents in the published index.
    pub documents_indexed: usize,
    /// Raw records examined.
    pub records_seen: usize,
    /// Records that produced no document (malformed or duplicate id).
    pub records_skipped: usize,
    /// Source files read successfully.
    pub files_read: usize,
    /// Source files skipped (unsupported type or unreadable).
    pub files_skipped: usize,
}

/// Parses one raw record into a document, or `None` if unrecognised.
#[must_use]
pub fn parse_record(record: &Value) -> Option<Document> {
    let obj = record.as_object()?;
    let kind = match obj.get("type").and_then(Value::as_str) {
        Some(tag) => SourceKind::parse(tag)?,
        None => infer_kind(obj)?,
    };

    let id = obj.get("id").and_then(scalar_string);
    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_string();

    let (text, name, price) = match kind {
        SourceKind::Product => {
            let name = non_empty_str(obj, "name")?;
            let description = obj
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let attributes = obj
                .get("attributes")
                .and_then(Value::as_object)
                .map(attribute_map)
                .unwrap_or_default();
            let price = obj.get("price").and_then(parse_price);
            (
                product_text(&name, description.trim(), &attributes),
                Some(name),
                price,
            )
        }
        SourceKind::Faq => {
            let question = non_empty_str(obj, "question")?;
            let answer = non_empty_str(obj, "answer")?;
            (faq_text(&question, &answer), None, None)
        }
    };

    let metadata = DocumentMetadata {
        source: kind,
        category,
        name,
        price,
    };
    Some(Document::new(id.as_deref(), text, metadata))
}

/// Parses records into documents, dropping malformed ones and later
/// duplicates of an id.
///
/// Returns the documents and the number of skipped records.
pub fn parse_records(records: &[Value]) -> (Vec<Document>, usize) {
    let mut seen = HashSet::new();
    let mut documents = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for (position, record) in records.iter().enumerate() {
        match parse_record(record) {
            Some(doc) if seen.insert(doc.id.clone()) => documents.push(doc),
            Some(doc) => {
                warn!(id = %doc.id, position, "duplicate document id, keeping first");
                skipped += 1;
            }
            None => {
                warn!(position, "skipping unrecognised knowledge record");
                skipped += 1;
            }
        }
    }
    (documents, skipped)
}

/// Raw records loaded from disk.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    /// Records in file order, files in sorted path order.
    pub records: Vec<Value>,
    /// Files read.
    pub files_read: usize,
    /// Files skipped.
    pub files_skipped: usize,
}

/// Loads records from a `.json`/`.jsonl` file or a directory of them.
///
/// # Errors
///
/// Returns [`RetrievalError::Source`] if `path` does not exist or the
/// directory cannot be listed.
pub fn load_records(path: &Path) -> Result<LoadedRecords, RetrievalError> {
    let source_err = |message: String| RetrievalError::Source {
        path: path.to_path_buf(),
        message,
    };

    if !path.exists() {
        return Err(source_err("path does not exist".to_string()));
    }

    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files = fs::read_dir(path)
            .map_err(|e| source_err(e.to_string()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect::<Vec<_>>();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut loaded = LoadedRecords::default();
    for file in files {
        match read_file(&file) {
            Some(records) => {
                debug!(file = %file.display(), records = records.len(), "read knowledge file");
                loaded.records.extend(records);
                loaded.files_read += 1;
            }
            None => loaded.files_skipped += 1,
        }
    }
    Ok(loaded)
}

fn read_file(path: &Path) -> Option<Vec<Value>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let is_lines = match ext.as_deref() {
        Some("json") => false,
        Some("jsonl") => true,
        _ => {
            warn!(file = %path.display(), "skipping unsupported knowledge file type");
            return None;
        }
    };

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "skipping unreadable knowledge file");
            return None;
        }
    };

    if is_lines {
        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(v) => records.push(v),
                Err(e) => warn!(
                    file = %path.display(),
                    line = line_no + 1,
                    error = %e,
                    "skipping undecodable line"
                ),
            }
        }
        return Some(records);
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(items)) => Some(items),
        Ok(obj @ Value::Object(_)) => Some(vec![obj]),
        Ok(_) => {
            warn!(file = %path.display(), "knowledge file is neither an array nor an object");
            None
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "skipping undecodable knowledge file");
            None
        }
    }
}

fn infer_kind(obj: &Map<String, Value>) -> Option<SourceKind> {
    if obj.contains_key("question") && obj.contains_key("answer") {
        Some(SourceKind::Faq)
    } else if obj.contains_key("name") {
        Some(SourceKind::Product)
    } else {
        None
    }
}

fn non_empty_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_price(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    }
    .filter(|p: &f64| p.is_finite() && *p >= 0.0)
}

fn attribute_map(attrs: &Map<String, Value>) -> BTreeMap<String, String> {
    attrs
        .iter()
        .filter_map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(|i| scalar_string(i).or_else(|| i.as_bool().map(|b| b.to_string())))
                    .collect::<Vec<_>>()
                    .join(", "),
                Value::Null | Value::Object(_) => return None,
            };
            Some((k.clone(), value))
        })
        .collect()
}
