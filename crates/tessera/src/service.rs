//! The CRUD service.
//!
//! [`Service`] exposes `find`, `get`, `create`, `patch`, `update` and
//! `remove` over one table. Reads go through [`assemble`], so every find
//! applies its stages in the same order:
//!
//! ```text
//! filter → select → sort → (count snapshot) → skip → limit
//! ```
//!
//! Writes that return records build them from the driver's returned changes:
//! `patch` and `update` return post-write values, `remove` returns pre-write
//! values.
//!
//! Patch and update read before they write. Nothing guards the gap between
//! the two calls; a concurrent writer may change a record after it was
//! resolved and before it is written.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tessera_query::{assemble, selection, Paginate, TableQuery};
use tracing::{debug, trace};

use crate::config::{ServiceOptions, DEFAULT_ID_FIELD};
use crate::driver::{Database, DriverError, Selection, Table};
use crate::error::{ConfigError, Error};
use crate::params::Params;

type Result<T, D> = std::result::Result<T, Error<DriverError<D>>>;

/// One page of find results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Number of records matching the query, before skip and limit.
    pub total: u64,
    /// Effective page size.
    pub limit: Option<usize>,
    /// Records skipped before this page.
    pub skip: usize,
    /// The records of this page.
    pub data: Vec<Value>,
}

/// Result of [`Service::find`]: a page envelope when pagination is
/// configured, a bare list otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FindResult {
    Page(Page),
    List(Vec<Value>),
}

impl FindResult {
    /// The returned records, dropping the envelope.
    pub fn into_records(self) -> Vec<Value> {
        match self {
            FindResult::Page(page) => page.data,
            FindResult::List(records) => records,
        }
    }

    pub fn records(&self) -> &[Value] {
        match self {
            FindResult::Page(page) => &page.data,
            FindResult::List(records) => records,
        }
    }

    /// Total match count, present for pages.
    pub fn total(&self) -> Option<u64> {
        match self {
            FindResult::Page(page) => Some(page.total),
            FindResult::List(_) => None,
        }
    }
}

/// Result of a write that may touch several records.
///
/// Exactly one affected record is returned as [`Mutation::One`]; none or
/// several as [`Mutation::Many`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mutation {
    One(Value),
    Many(Vec<Value>),
}

impl Mutation {
    pub fn from_values(mut values: Vec<Value>) -> Self {
        match values.len() {
            1 => Mutation::One(values.remove(0)),
            _ => Mutation::Many(values),
        }
    }

    /// The affected records as a list.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Mutation::One(value) => vec![value],
            Mutation::Many(values) => values,
        }
    }

    /// Number of affected records.
    pub fn len(&self) -> usize {
        match self {
            Mutation::One(_) => 1,
            Mutation::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Mutation> for Value {
    fn from(mutation: Mutation) -> Self {
        match mutation {
            Mutation::One(value) => value,
            Mutation::Many(values) => Value::Array(values),
        }
    }
}

/// What a remove call targets.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveTarget {
    /// The record with this identifier.
    Id(Value),
    /// Records matching the query; all records when the query is absent or
    /// empty.
    Matching(Params),
    /// Neither an id nor params were given.
    Unspecified,
}

/// CRUD service over one table.
pub struct Service<D: Database> {
    table: D::Table,
    name: String,
    id: String,
    paginate: Paginate,
}

impl<D: Database> fmt::Debug for Service<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("paginate", &self.paginate)
            .finish_non_exhaustive()
    }
}

/// An identifier counts as given unless absent or null.
fn given(id: Option<&Value>) -> Option<&Value> {
    id.filter(|id| !id.is_null())
}

/// Collapses sequences returned by identity lookups to their first element.
fn first_record(value: Value) -> Option<Value> {
    match value {
        Value::Array(values) => values.into_iter().next(),
        Value::Null => None,
        value => Some(value),
    }
}

impl<D: Database> Service<D> {
    /// Creates a service from options.
    ///
    /// Fails when the database handle is missing, has no database selected,
    /// or no table name is given.
    pub fn new(options: ServiceOptions<D>) -> std::result::Result<Self, ConfigError> {
        let model = options.model.ok_or(ConfigError::MissingModel)?;
        if model.db().is_none() {
            return Err(ConfigError::MissingDatabase);
        }
        let name = options
            .name
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingTableName)?;

        debug!(table = %name, db = ?model.db(), "created service");
        Ok(Service {
            table: model.table(&name),
            id: options.id.unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
            name,
            paginate: options.paginate,
        })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identifier field.
    pub fn id_field(&self) -> &str {
        &self.id
    }

    pub fn paginate(&self) -> &Paginate {
        &self.paginate
    }

    /// The underlying table handle.
    pub fn table(&self) -> &D::Table {
        &self.table
    }

    /// Finds the records matching `params.query`.
    pub async fn find(&self, params: Params) -> Result<FindResult, D> {
        let plan = assemble(&params.into_query(), &self.paginate)?;
        debug!(table = %self.name, records = %plan.records, "find");

        match plan.count {
            Some(count) => {
                trace!("starting: find with count");
                let (data, total) =
                    futures::try_join!(self.table.run(&plan.records), self.table.count(&count))
                        .map_err(Error::Driver)?;
                trace!("completed: find with count");
                Ok(FindResult::Page(Page {
                    total,
                    limit: plan.limit,
                    skip: plan.skip,
                    data,
                }))
            }
            None => {
                let data = self.table.run(&plan.records).await.map_err(Error::Driver)?;
                Ok(FindResult::List(data))
            }
        }
    }

    /// Fetches one record by identifier, or the first record matching
    /// `params.query` when no identifier is given.
    pub async fn get(&self, id: Option<&Value>, params: Params) -> Result<Value, D> {
        match given(id) {
            Some(id) => {
                debug!(table = %self.name, %id, "get");
                self.table
                    .get(id)
                    .await
                    .map_err(Error::Driver)?
                    .and_then(first_record)
                    .ok_or_else(|| Error::not_found(id))
            }
            None => {
                let query = params.into_query();
                let records = TableQuery::scan().filter(selection(&query)?).limit(1);
                debug!(table = %self.name, %records, "get by query");
                self.table
                    .run(&records)
                    .await
                    .map_err(Error::Driver)?
                    .into_iter()
                    .next()
                    .ok_or_else(|| Error::not_found(&Value::Object(query)))
            }
        }
    }

    /// Inserts a record and returns it with its generated identifier.
    ///
    /// An array inserts each element in order and returns the array of
    /// created records.
    pub async fn create(&self, data: Value, _params: Params) -> Result<Value, D> {
        match data {
            Value::Array(records) => {
                debug!(table = %self.name, count = records.len(), "bulk create");
                let mut created = Vec::with_capacity(records.len());
                for record in records {
                    created.push(self.create_one(record).await?);
                }
                Ok(Value::Array(created))
            }
            record => self.create_one(record).await,
        }
    }

    async fn create_one(&self, record: Value) -> Result<Value, D> {
        let Value::Object(mut record) = record else {
            return Err(Error::BadRequest(
                "Records to create must be objects".to_string(),
            ));
        };

        let inserted = self
            .table
            .insert(vec![Value::Object(record.clone())])
            .await
            .map_err(Error::Driver)?;
        if let Some(key) = inserted.generated_keys.into_iter().next() {
            record.insert(self.id.clone(), key);
        }
        debug!(table = %self.name, id = ?record.get(&self.id), "created");
        Ok(Value::Object(record))
    }

    /// Merges `data` into the record with `id`, or into every record matching
    /// `params.query`, and returns the updated records.
    pub async fn patch(&self, id: Option<&Value>, data: Value, params: Params) -> Result<Mutation, D> {
        let selection = match given(id) {
            Some(id) => {
                let existing = self.get(Some(id), Params::new()).await?;
                Selection::Id(self.identifier(&existing).unwrap_or(id).clone())
            }
            None if params.has_query() => {
                let targets = self.resolve(params.into_query()).await?;
                let mut ids: Vec<Value> = targets
                    .iter()
                    .filter_map(|record| self.identifier(record).cloned())
                    .collect();
                if ids.len() > 1 {
                    let current = self.table.get_all(&ids).await.map_err(Error::Driver)?;
                    ids = current
                        .iter()
                        .filter_map(|record| self.identifier(record).cloned())
                        .collect();
                }
                Selection::Ids(ids)
            }
            None => return Err(Error::BadRequest("Patch requires an ID or params".to_string())),
        };

        trace!("starting: patch");
        let changes = self
            .table
            .update(&selection, data)
            .await
            .map_err(Error::Driver)?;
        debug!(table = %self.name, patched = changes.len(), "patch");
        Ok(Mutation::from_values(changes.new_values()))
    }

    /// Replaces the record with `id` by `data` and returns the new record.
    ///
    /// The stored identifier is stamped onto `data`, so a replace never
    /// changes a record's identity.
    pub async fn update(&self, id: &Value, data: Value, _params: Params) -> Result<Value, D> {
        let Value::Object(mut record) = data else {
            return Err(Error::BadRequest(
                "Update requires a record object".to_string(),
            ));
        };

        let existing = self.get(Some(id), Params::new()).await?;
        let key = self.identifier(&existing).unwrap_or(id).clone();
        record.insert(self.id.clone(), key.clone());

        let changes = self
            .table
            .replace(&key, Value::Object(record))
            .await
            .map_err(Error::Driver)?;
        debug!(table = %self.name, %key, "update");
        changes
            .new_values()
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(id))
    }

    /// Removes the record with `id`, or the records matching
    /// `params.query`. With neither, every record is removed.
    ///
    /// Returns the removed records.
    pub async fn remove(&self, id: Option<&Value>, params: Params) -> Result<Mutation, D> {
        let target = match given(id) {
            Some(id) => RemoveTarget::Id(id.clone()),
            None => RemoveTarget::Matching(params),
        };
        self.remove_target(target).await
    }

    /// Removes the records a [`RemoveTarget`] names.
    ///
    /// Removing an identifier that no longer exists fails with
    /// [`Error::NotFound`].
    pub async fn remove_target(&self, target: RemoveTarget) -> Result<Mutation, D> {
        let selection = match target {
            RemoveTarget::Id(id) => {
                let changes = self
                    .table
                    .delete(&Selection::Id(id.clone()))
                    .await
                    .map_err(Error::Driver)?;
                if changes.is_empty() {
                    return Err(Error::not_found(&id));
                }
                debug!(table = %self.name, %id, "remove");
                return Ok(Mutation::from_values(changes.old_values()));
            }
            RemoveTarget::Matching(params) => Selection::Matching(selection(&params.into_query())?),
            RemoveTarget::Unspecified => {
                return Err(Error::BadRequest(
                    "You must pass either an id or params to remove.".to_string(),
                ))
            }
        };

        let changes = self
            .table
            .delete(&selection)
            .await
            .map_err(Error::Driver)?;
        debug!(table = %self.name, removed = changes.len(), "remove");
        Ok(Mutation::from_values(changes.old_values()))
    }

    /// Records a patch by query touches: every match, regardless of
    /// pagination. `$select` is ignored so identifiers survive.
    async fn resolve(&self, mut query: Map<String, Value>) -> Result<Vec<Value>, D> {
        query.remove("$select");
        let plan = assemble(&query, &Paginate::default())?;
        trace!(records = %plan.records, "resolving patch targets");
        self.table.run(&plan.records).await.map_err(Error::Driver)
    }

    fn identifier<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        record.get(&self.id).filter(|id| !id.is_null())
    }
}
