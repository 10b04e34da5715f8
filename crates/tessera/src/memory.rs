//! In-process reference driver.
//!
//! [`MemoryDatabase`] keeps named tables of JSON records in insertion order.
//! Pipelines are evaluated with [`TableQuery::evaluate`], so query results
//! follow the same semantics a server-side driver is expected to honor.
//!
//! ```rust
//! use serde_json::json;
//! use tessera::{Database, MemoryDatabase, Table};
//! use tessera_query::TableQuery;
//!
//! # futures::executor::block_on(async {
//! let db = MemoryDatabase::new("test");
//! let people = db.table("people");
//! people.insert(vec![json!({"name": "Alice"})]).await.unwrap();
//!
//! let rows = people.run(&TableQuery::scan()).await.unwrap();
//! assert_eq!(rows[0]["name"], "Alice");
//! assert!(rows[0]["id"].is_string());
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tessera_query::{type_name, values_equal, TableQuery};
use thiserror::Error;
use tracing::trace;
use uuid::Uuid;

use crate::driver::{Change, Changes, Database, Inserted, Selection, Table};

/// Primary key field used unless configured otherwise.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Errors raised by the in-memory driver.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("duplicate primary key {0}")]
    DuplicateKey(Value),

    #[error("expected an object, got {0}")]
    NotAnObject(&'static str),

    #[error("primary key {0} cannot be changed")]
    PrimaryKeyChanged(Value),

    #[error("table lock poisoned")]
    Poisoned,
}

/// A set of named in-memory tables.
///
/// Clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    name: Option<String>,
    primary_key: String,
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
}

impl MemoryDatabase {
    /// Creates an empty database with the given name selected.
    pub fn new(name: impl Into<String>) -> Self {
        MemoryDatabase {
            name: Some(name.into()),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            tables: Arc::default(),
        }
    }

    /// Creates a connection without a selected database.
    pub fn unselected() -> Self {
        MemoryDatabase {
            name: None,
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            tables: Arc::default(),
        }
    }

    /// Sets the primary key field of tables created from now on.
    pub fn with_primary_key(mut self, key: impl Into<String>) -> Self {
        self.primary_key = key.into();
        self
    }

    /// Creates (or replaces) a table holding `rows`.
    pub fn create_table(&self, name: impl Into<String>, rows: Vec<Value>) -> MemoryTable {
        let table = MemoryTable::with_rows(self.primary_key.clone(), rows);
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), table.clone());
        table
    }

    /// Names of the existing tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Database for MemoryDatabase {
    type Table = MemoryTable;

    fn db(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the named table, creating it empty on first use.
    fn table(&self, name: &str) -> MemoryTable {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert_with(|| MemoryTable::new(self.primary_key.clone()))
            .clone()
    }
}

/// A table of JSON records kept in insertion order.
///
/// Clones share the same rows.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    primary_key: String,
    rows: Arc<RwLock<Vec<Value>>>,
}

impl MemoryTable {
    /// Creates an empty table keyed by `primary_key`.
    pub fn new(primary_key: impl Into<String>) -> Self {
        Self::with_rows(primary_key, Vec::new())
    }

    /// Creates a table holding `rows`.
    pub fn with_rows(primary_key: impl Into<String>, rows: Vec<Value>) -> Self {
        MemoryTable {
            primary_key: primary_key.into(),
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Copy of every row in insertion order.
    pub fn snapshot(&self) -> Result<Vec<Value>, MemoryError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Value>>, MemoryError> {
        self.rows.read().map_err(|_| MemoryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Value>>, MemoryError> {
        self.rows.write().map_err(|_| MemoryError::Poisoned)
    }

    fn key_of<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        record.get(&self.primary_key)
    }

    fn has_key(&self, record: &Value, id: &Value) -> bool {
        self.key_of(record).is_some_and(|key| values_equal(key, id))
    }

    fn find<'a>(&self, rows: &'a [Value], id: &Value) -> Option<(usize, &'a Value)> {
        rows.iter().enumerate().find(|(_, r)| self.has_key(r, id))
    }

    /// Row positions a selection covers, ascending and without repeats.
    fn positions(&self, rows: &[Value], selection: &Selection) -> Vec<usize> {
        let mut positions: Vec<usize> = match selection {
            Selection::Id(id) => self.find(rows, id).map(|(i, _)| i).into_iter().collect(),
            Selection::Ids(ids) => ids
                .iter()
                .filter_map(|id| self.find(rows, id).map(|(i, _)| i))
                .collect(),
            Selection::Matching(predicate) => rows
                .iter()
                .enumerate()
                .filter(|(_, r)| predicate.matches(r))
                .map(|(i, _)| i)
                .collect(),
        };
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    fn ensure_key_kept(&self, old: &Value, new: &Value) -> Result<(), MemoryError> {
        match (self.key_of(old), self.key_of(new)) {
            (Some(a), Some(b)) if values_equal(a, b) => Ok(()),
            (None, None) => Ok(()),
            (key, _) => Err(MemoryError::PrimaryKeyChanged(
                key.cloned().unwrap_or(Value::Null),
            )),
        }
    }
}

fn object_of(value: Value) -> Result<Map<String, Value>, MemoryError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(MemoryError::NotAnObject(type_name(&other))),
    }
}

/// Merges `patch` into `target`, recursing into nested objects.
fn merge(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge(existing, nested),
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

#[async_trait]
impl Table for MemoryTable {
    type Error = MemoryError;

    async fn run(&self, query: &TableQuery) -> Result<Vec<Value>, MemoryError> {
        Ok(query.evaluate(&self.read()?))
    }

    async fn count(&self, query: &TableQuery) -> Result<u64, MemoryError> {
        Ok(query.count(&self.read()?) as u64)
    }

    async fn get(&self, id: &Value) -> Result<Option<Value>, MemoryError> {
        let rows = self.read()?;
        Ok(self.find(&rows, id).map(|(_, r)| r.clone()))
    }

    async fn get_all(&self, ids: &[Value]) -> Result<Vec<Value>, MemoryError> {
        let rows = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.find(&rows, id).map(|(_, r)| r.clone()))
            .collect())
    }

    async fn insert(&self, records: Vec<Value>) -> Result<Inserted, MemoryError> {
        let mut rows = self.write()?;
        let mut staged: Vec<Value> = Vec::with_capacity(records.len());
        let mut generated_keys = Vec::new();

        for record in records {
            let mut map = object_of(record)?;
            let key = match map.get(&self.primary_key) {
                Some(key) => key.clone(),
                None => {
                    let key = Value::String(Uuid::new_v4().to_string());
                    map.insert(self.primary_key.clone(), key.clone());
                    generated_keys.push(key.clone());
                    key
                }
            };
            if rows.iter().chain(&staged).any(|r| self.has_key(r, &key)) {
                return Err(MemoryError::DuplicateKey(key));
            }
            staged.push(Value::Object(map));
        }

        let inserted = staged.len();
        rows.extend(staged);
        trace!(inserted, generated = generated_keys.len(), "memory insert");
        Ok(Inserted {
            inserted,
            generated_keys,
        })
    }

    async fn update(&self, selection: &Selection, patch: Value) -> Result<Changes, MemoryError> {
        let patch = object_of(patch)?;
        let mut rows = self.write()?;

        let mut updated = Vec::new();
        for i in self.positions(&rows, selection) {
            let mut next = object_of(rows[i].clone())?;
            merge(&mut next, patch.clone());
            let next = Value::Object(next);
            self.ensure_key_kept(&rows[i], &next)?;
            updated.push((i, next));
        }

        let changes: Changes = updated
            .into_iter()
            .map(|(i, next)| Change {
                old_val: Some(std::mem::replace(&mut rows[i], next.clone())),
                new_val: Some(next),
            })
            .collect();
        trace!(updated = changes.len(), "memory update");
        Ok(changes)
    }

    async fn replace(&self, id: &Value, record: Value) -> Result<Changes, MemoryError> {
        let mut map = object_of(record)?;
        match map.get(&self.primary_key) {
            Some(key) if !values_equal(key, id) => {
                return Err(MemoryError::PrimaryKeyChanged(id.clone()))
            }
            Some(_) => {}
            None => {
                map.insert(self.primary_key.clone(), id.clone());
            }
        }
        let record = Value::Object(map);

        let mut rows = self.write()?;
        let position = self.find(&rows, id).map(|(i, _)| i);
        let change = match position {
            Some(i) => Change {
                old_val: Some(std::mem::replace(&mut rows[i], record.clone())),
                new_val: Some(record),
            },
            None => {
                rows.push(record.clone());
                Change {
                    old_val: None,
                    new_val: Some(record),
                }
            }
        };
        Ok(Changes {
            changes: vec![change],
        })
    }

    async fn delete(&self, selection: &Selection) -> Result<Changes, MemoryError> {
        let mut rows = self.write()?;
        let positions = self.positions(&rows, selection);

        let mut removed: Vec<Change> = positions
            .into_iter()
            .rev()
            .map(|i| Change {
                old_val: Some(rows.remove(i)),
                new_val: None,
            })
            .collect();
        removed.reverse();
        trace!(deleted = removed.len(), "memory delete");
        Ok(Changes { changes: removed })
    }
}
