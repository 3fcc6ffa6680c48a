//! SQLite snapshot of the published index.
//!
//! The snapshot always mirrors exactly one published index: every save
//! replaces all rows in a single transaction. Vectors are stored as
//! little-endian `f32` blobs next to the model name and dimension they were
//! produced with.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};

use super::index::{IndexEntry, VectorIndex};
use crate::core::{Document, DocumentMetadata, SourceKind};
use crate::error::StorageError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS snapshot_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS documents (
    id        TEXT PRIMARY KEY,
    source    TEXT NOT NULL,
    category  TEXT NOT NULL,
    name      TEXT,
    price     REAL,
    text      TEXT NOT NULL,
    embedding BLOB NOT NULL
);
";

/// Persistent snapshot store.
pub struct SnapshotStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore").finish_non_exhaustive()
    }
}

impl SnapshotStore {
    /// Opens (creating if needed) the snapshot database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory or database cannot be
    /// created.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens a throwaway in-memory snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if SQLite cannot initialise.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Replaces the stored snapshot with `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on any SQLite failure; the previous snapshot
    /// is left intact.
    pub fn save(&self, index: &VectorIndex) -> Result<(), StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM documents", [])?;
        tx.execute("DELETE FROM snapshot_meta", [])?;
        tx.execute(
            "INSERT INTO snapshot_meta (key, value) VALUES ('model', ?1), ('dimensions', ?2)",
            params![index.model(), index.dimensions().to_string()],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (id, source, category, name, price, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for entry in index.entries() {
                let doc = &entry.document;
                stmt.execute(params![
                    doc.id,
                    doc.metadata.source.as_str(),
                    doc.metadata.category,
                    doc.metadata.name,
                    doc.metadata.price,
                    doc.text,
                    encode_vector(&entry.vector),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Loads the stored snapshot, or `None` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on SQLite failures or undecodable rows.
    pub fn load(&self) -> Result<Option<VectorIndex>, StorageError> {
        let conn = self.conn.lock();
        let meta = |key: &str| -> Result<Option<String>, StorageError> {
            Ok(conn
                .query_row(
                    "SELECT value FROM snapshot_meta WHERE key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()?)
        };

        let (Some(model), Some(dimensions)) = (meta("model")?, meta("dimensions")?) else {
            return Ok(None);
        };
        let dimensions: usize = dimensions.parse().map_err(|_| StorageError::Corrupt {
            id: "snapshot_meta".to_string(),
            message: format!("invalid dimensions '{dimensions}'"),
        })?;

        let mut stmt = conn.prepare(
            "SELECT id, source, category, name, price, text, embedding FROM documents ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Vec<u8>>(6)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, source, category, name, price, text, blob) = row?;
            let source = SourceKind::parse(&source).ok_or_else(|| StorageError::Corrupt {
                id: id.clone(),
                message: format!("unknown source '{source}'"),
            })?;
            let vector = decode_vector(&blob).ok_or_else(|| StorageError::Corrupt {
                id: id.clone(),
                message: format!("embedding blob of {} bytes", blob.len()),
            })?;
            entries.push(IndexEntry {
                document: Document {
                    id,
                    text,
                    metadata: DocumentMetadata {
                        source,
                        category,
                        name,
                        price,
                    },
                },
                vector,
            });
        }

        Ok(Some(VectorIndex::new(entries, model, dimensions)))
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn sample_index() -> VectorIndex {
        let doc = Document::new(
            Some("PROD-101"),
            "Product Name: Bohemian Jute & Wool Area Rug. Description: Handwoven".to_string(),
            DocumentMetadata {
                source: SourceKind::Product,
                category: "Rugs".to_string(),
                name: Some("Bohemian Jute & Wool Area Rug".to_string()),
                price: Some(249.0),
            },
        );
        VectorIndex::new(
            vec![IndexEntry {
                document: doc,
                vector: vec![0.25, -0.5, 1.0],
            }],
            "test-model".to_string(),
            3,
        )
    }

    #[test]
    fn test_empty_store_loads_none() {
        let store = SnapshotStore::in_memory().unwrap_or_else(|e| panic!("open: {e}"));
        assert!(store.load().unwrap_or_else(|e| panic!("load: {e}")).is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = SnapshotStore::in_memory().unwrap_or_else(|e| panic!("open: {e}"));
        store
            .save(&sample_index())
            .unwrap_or_else(|e| panic!("save: {e}"));

        let loaded = store
            .load()
            .unwrap_or_else(|e| panic!("load: {e}"))
            .unwrap_or_else(|| panic!("snapshot missing"));
        assert_eq!(loaded.model(), "test-model");
        assert_eq!(loaded.dimensions(), 3);
        assert_eq!(loaded.len(), 1);
        let entry = &loaded.entries()[0];
        assert_eq!(entry.vector, vec![0.25, -0.5, 1.0]);
        assert_eq!(entry.document.metadata.price, Some(249.0));
        assert_eq!(entry.document.metadata.category, "Rugs");
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let store = SnapshotStore::in_memory().unwrap_or_else(|e| panic!("open: {e}"));
        store
            .save(&sample_index())
            .unwrap_or_else(|e| panic!("save: {e}"));
        store
            .save(&VectorIndex::new(Vec::new(), "other".to_string(), 8))
            .unwrap_or_else(|e| panic!("save: {e}"));

        let loaded = store
            .load()
            .unwrap_or_else(|e| panic!("load: {e}"))
            .unwrap_or_else(|| panic!("snapshot missing"));
        assert!(loaded.is_empty());
        assert_eq!(loaded.model(), "other");
    }

    #[test]
    fn test_decode_rejects_ragged_blob() {
        assert!(decode_vector(&[0, 0, 0]).is_none());
        assert_eq!(decode_vector(&encode_vector(&[1.5])), Some(vec![1.5]));
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let path = dir.path().join("nested").join("knowledge.db");
        let store = SnapshotStore::open(&path).unwrap_or_else(|e| panic!("open: {e}"));
        store
            .save(&sample_index())
            .unwrap_or_else(|e| panic!("save: {e}"));
        assert!(path.exists());
    }
}
