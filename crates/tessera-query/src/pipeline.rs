//! Native query pipelines.
//!
//! A [`TableQuery`] is the value a driver executes: an ordered list of
//! [`Stage`]s applied to a table scan. Every builder method consumes the
//! query and returns a new one, so a snapshot taken with `clone()` (such as
//! the pagination count query) is never affected by later stages.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::ordering::OrderBy;
use crate::predicate::Predicate;

/// One step of a table query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Keep records matching the predicate.
    Filter(Predicate),
    /// Restrict each record to exactly these fields.
    Pluck(Vec<String>),
    /// Sort records.
    OrderBy(OrderBy),
    /// Drop the first `n` records.
    Skip(usize),
    /// Keep at most `n` records.
    Limit(usize),
}

impl Stage {
    fn apply(&self, rows: Vec<Value>) -> Vec<Value> {
        match self {
            Stage::Filter(predicate) => rows.into_iter().filter(|r| predicate.matches(r)).collect(),
            Stage::Pluck(fields) => rows.into_iter().map(|r| pluck(r, fields)).collect(),
            Stage::OrderBy(order) => {
                let mut rows = rows;
                rows.sort_by(|a, b| order.compare(a, b));
                rows
            }
            Stage::Skip(n) => rows.into_iter().skip(*n).collect(),
            Stage::Limit(n) => {
                let mut rows = rows;
                rows.truncate(*n);
                rows
            }
        }
    }
}

fn pluck(record: Value, fields: &[String]) -> Value {
    match record {
        Value::Object(mut object) => {
            let mut plucked = Map::new();
            for name in fields {
                if let Some(value) = object.remove(name) {
                    plucked.insert(name.clone(), value);
                }
            }
            Value::Object(plucked)
        }
        other => other,
    }
}

/// An immutable-by-convention query over one table.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tessera_query::{OrderBy, Predicate, TableQuery};
///
/// let query = TableQuery::scan()
///     .filter(Predicate::eq("done", json!(false)))
///     .order_by(OrderBy::asc("name"))
///     .limit(1);
///
/// let rows = vec![
///     json!({"name": "b", "done": false}),
///     json!({"name": "a", "done": false}),
///     json!({"name": "c", "done": true}),
/// ];
/// assert_eq!(query.evaluate(&rows), vec![json!({"name": "a", "done": false})]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TableQuery {
    stages: Vec<Stage>,
}

impl TableQuery {
    /// An unfiltered scan of the table.
    pub fn scan() -> Self {
        TableQuery::default()
    }

    fn push(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Adds a filter stage. Filtering by [`Predicate::Always`] is a no-op.
    pub fn filter(self, predicate: Predicate) -> Self {
        if predicate.is_always() {
            self
        } else {
            self.push(Stage::Filter(predicate))
        }
    }

    /// Adds a projection stage.
    pub fn pluck<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Stage::Pluck(fields.into_iter().map(Into::into).collect()))
    }

    /// Adds an ordering stage.
    pub fn order_by(self, order: OrderBy) -> Self {
        self.push(Stage::OrderBy(order))
    }

    /// Adds a skip stage.
    pub fn skip(self, n: usize) -> Self {
        self.push(Stage::Skip(n))
    }

    /// Adds a limit stage.
    pub fn limit(self, n: usize) -> Self {
        self.push(Stage::Limit(n))
    }

    /// Returns the stages in application order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs the pipeline over in-memory rows.
    ///
    /// Sorting is stable, so records that compare equal keep their table
    /// order.
    pub fn evaluate(&self, rows: &[Value]) -> Vec<Value> {
        self.stages
            .iter()
            .fold(rows.to_vec(), |rows, stage| stage.apply(rows))
    }

    /// Counts the records the pipeline would return.
    pub fn count(&self, rows: &[Value]) -> usize {
        self.evaluate(rows).len()
    }
}

impl fmt::Display for TableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scan")?;
        for stage in &self.stages {
            match stage {
                Stage::Filter(p) => write!(f, " | filter {p}")?,
                Stage::Pluck(fields) => write!(f, " | pluck {}", fields.join(","))?,
                Stage::OrderBy(order) => write!(f, " | order_by {order}")?,
                Stage::Skip(n) => write!(f, " | skip {n}")?,
                Stage::Limit(n) => write!(f, " | limit {n}")?,
            }
        }
        Ok(())
    }
}
