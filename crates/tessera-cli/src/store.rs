//! JSON data files backing the in-memory database.
//!
//! A data file is one JSON object mapping table names to arrays of records:
//!
//! ```json
//! { "todos": [{ "id": 1, "title": "write docs" }] }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tessera::{Database, MemoryDatabase, MemoryError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid data file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("table '{0}' must be an array of records")]
    NotATable(String),

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// An in-memory database loaded from, and saved back to, a data file.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
    db: MemoryDatabase,
}

impl DataFile {
    /// Loads `path` into a fresh database. A missing file is an empty
    /// database.
    pub fn open(path: impl AsRef<Path>, db: MemoryDatabase) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let text = fs::read_to_string(&path).map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
            let tables: Map<String, Value> =
                serde_json::from_str(&text).map_err(|source| StoreError::Json {
                    path: path.clone(),
                    source,
                })?;
            for (name, rows) in tables {
                let Value::Array(rows) = rows else {
                    return Err(StoreError::NotATable(name));
                };
                debug!(table = %name, rows = rows.len(), "loaded table");
                db.create_table(name, rows);
            }
        }
        Ok(DataFile { path, db })
    }

    pub fn database(&self) -> &MemoryDatabase {
        &self.db
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes every table back to the data file.
    pub fn save(&self) -> Result<(), StoreError> {
        let mut tables = Map::new();
        for name in self.db.table_names() {
            let rows = self.db.table(&name).snapshot()?;
            tables.insert(name, Value::Array(rows));
        }

        let text = serde_json::to_string_pretty(&Value::Object(tables)).map_err(|source| {
            StoreError::Json {
                path: self.path.clone(),
                source,
            }
        })?;
        fs::write(&self.path, text + "\n").map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "saved data file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = DataFile::open(dir.path().join("none.json"), MemoryDatabase::new("t")).unwrap();
        assert!(file.database().table_names().is_empty());
    }

    #[test]
    fn save_then_open_keeps_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");

        let file = DataFile::open(&path, MemoryDatabase::new("t")).unwrap();
        file.database()
            .create_table("todos", vec![json!({"id": 1, "title": "a"})]);
        file.save().unwrap();

        let reopened = DataFile::open(&path, MemoryDatabase::new("t")).unwrap();
        let rows = reopened.database().table("todos").snapshot().unwrap();
        assert_eq!(rows, vec![json!({"id": 1, "title": "a"})]);
    }

    #[test]
    fn rejects_non_array_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"todos": {"id": 1}}"#).unwrap();

        let err = DataFile::open(&path, MemoryDatabase::new("t")).unwrap_err();
        assert_eq!(err.to_string(), "table 'todos' must be an array of records");
    }
}
