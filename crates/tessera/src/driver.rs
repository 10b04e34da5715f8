//! Driver traits connecting the service to a document database.
//!
//! The service never talks to a database directly. It asks a [`Database`]
//! for a [`Table`] handle and hands that handle the pipelines built by
//! `tessera_query`. Implement these two traits to plug in a real driver;
//! [`MemoryDatabase`](crate::MemoryDatabase) is the in-process reference.
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera::{Changes, Database, Inserted, Selection, Table};
//! use tessera_query::TableQuery;
//!
//! #[async_trait::async_trait]
//! impl Table for RemoteTable {
//!     type Error = RemoteError;
//!
//!     async fn run(&self, query: &TableQuery) -> Result<Vec<Value>, Self::Error> {
//!         self.client.post("/run", query).await
//!     }
//!     // ...
//! }
//! ```
//!
//! # Design Notes
//!
//! - **Pipelines, not strings**: `run` and `count` receive a [`TableQuery`]
//!   value. Drivers compile its stages into their native query language, or
//!   evaluate it in-process with [`TableQuery::evaluate`].
//!
//! - **Returned changes**: every write reports the affected records as
//!   [`Changes`], with the pre-write value in `old_val` and the post-write
//!   value in `new_val`. The service builds its results from these.
//!
//! - **Shared handles**: a `Table` is cloned freely and shared between
//!   concurrent operations. Synchronization is the driver's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_query::{Predicate, TableQuery};

/// The records a write applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The record with this primary key.
    Id(Value),
    /// The records with these primary keys.
    Ids(Vec<Value>),
    /// Every record matching the predicate.
    Matching(Predicate),
}

impl Selection {
    /// Selection of every record.
    pub fn all() -> Self {
        Selection::Matching(Predicate::Always)
    }
}

/// One record affected by a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    /// The record before the write, `None` for inserts.
    pub old_val: Option<Value>,
    /// The record after the write, `None` for deletes.
    pub new_val: Option<Value>,
}

/// Records affected by a write, in the order the driver touched them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    pub changes: Vec<Change>,
}

impl Changes {
    /// Number of affected records.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns `true` if the write touched nothing.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Post-write values.
    pub fn new_values(self) -> Vec<Value> {
        self.changes.into_iter().filter_map(|c| c.new_val).collect()
    }

    /// Pre-write values.
    pub fn old_values(self) -> Vec<Value> {
        self.changes.into_iter().filter_map(|c| c.old_val).collect()
    }
}

impl FromIterator<Change> for Changes {
    fn from_iter<I: IntoIterator<Item = Change>>(iter: I) -> Self {
        Changes {
            changes: iter.into_iter().collect(),
        }
    }
}

/// Acknowledgment of an insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inserted {
    /// Number of records written.
    pub inserted: usize,
    /// Keys the database generated for records that had none, in insert order.
    pub generated_keys: Vec<Value>,
}

/// A database connection with a selected database.
pub trait Database {
    type Table: Table;

    /// Name of the selected database, `None` when no database is selected.
    fn db(&self) -> Option<&str>;

    /// Handle to the named table.
    fn table(&self, name: &str) -> Self::Table;
}

/// A handle to one table.
#[async_trait]
pub trait Table: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs a pipeline and returns the resulting records.
    async fn run(&self, query: &TableQuery) -> Result<Vec<Value>, Self::Error>;

    /// Counts the records a pipeline returns.
    async fn count(&self, query: &TableQuery) -> Result<u64, Self::Error>;

    /// Fetches a record by primary key.
    ///
    /// Drivers that answer identity lookups with a sequence may return an
    /// array; the service takes its first element.
    async fn get(&self, id: &Value) -> Result<Option<Value>, Self::Error>;

    /// Fetches the records with the given primary keys. Missing keys are
    /// skipped.
    async fn get_all(&self, ids: &[Value]) -> Result<Vec<Value>, Self::Error>;

    /// Inserts records, generating keys for those without one.
    async fn insert(&self, records: Vec<Value>) -> Result<Inserted, Self::Error>;

    /// Merges `patch` into every selected record.
    async fn update(&self, selection: &Selection, patch: Value) -> Result<Changes, Self::Error>;

    /// Replaces the record with primary key `id`, inserting it if absent.
    async fn replace(&self, id: &Value, record: Value) -> Result<Changes, Self::Error>;

    /// Deletes every selected record.
    async fn delete(&self, selection: &Selection) -> Result<Changes, Self::Error>;
}

/// The error type of a database's tables.
pub type DriverError<D> = <<D as Database>::Table as Table>::Error;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(old: Option<Value>, new: Option<Value>) -> Change {
        Change {
            old_val: old,
            new_val: new,
        }
    }

    #[test]
    fn changes_split_into_values() {
        let changes: Changes = vec![
            change(None, Some(json!({"id": 1}))),
            change(Some(json!({"id": 2})), None),
            change(Some(json!({"id": 3, "n": 1})), Some(json!({"id": 3, "n": 2}))),
        ]
        .into_iter()
        .collect();

        assert_eq!(changes.len(), 3);
        assert_eq!(
            changes.clone().new_values(),
            vec![json!({"id": 1}), json!({"id": 3, "n": 2})]
        );
        assert_eq!(
            changes.old_values(),
            vec![json!({"id": 2}), json!({"id": 3, "n": 1})]
        );
    }

    #[test]
    fn changes_deserialize_from_driver_json() {
        let changes: Changes = serde_json::from_value(json!({
            "changes": [{"old_val": null, "new_val": {"id": "a"}}]
        }))
        .unwrap();
        assert_eq!(changes.new_values(), vec![json!({"id": "a"})]);
    }

    #[test]
    fn select_all_is_unconstrained() {
        assert_eq!(Selection::all(), Selection::Matching(Predicate::Always));
    }
}
