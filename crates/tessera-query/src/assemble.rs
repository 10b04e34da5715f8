//! Read-query assembly.
//!
//! [`assemble`] turns a raw filter query into the record query and the
//! optional count query of one read. Directives are applied in a fixed
//! order:
//!
//! ```text
//! scan → $or filter → field filter → $select → $sort → (count snapshot) → $skip → $limit
//! ```
//!
//! The count snapshot is taken before skip and limit so the page total
//! reflects every matching record, and skip/limit come after sort so pages
//! are deterministic.

use serde_json::{Map, Value};
use tracing::debug;

use crate::directives::{Directives, Paginate};
use crate::error::Result;
use crate::pipeline::TableQuery;
use crate::predicate::Predicate;
use crate::translate::{build_filter, build_or_group};

/// The queries needed to answer one read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPlan {
    /// Query returning the records.
    pub records: TableQuery,
    /// Query counting all matches, present when pagination is enabled.
    pub count: Option<TableQuery>,
    /// Effective limit applied to `records`.
    pub limit: Option<usize>,
    /// Records skipped by `records` (0 when absent).
    pub skip: usize,
}

/// Assembles the record and count queries for a raw filter query.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tessera_query::{assemble, Paginate};
///
/// let query = json!({"done": false, "$sort": {"name": 1}, "$skip": 10});
/// let plan = assemble(query.as_object().unwrap(), &Paginate::new(5)).unwrap();
///
/// assert_eq!(plan.limit, Some(5));
/// assert_eq!(
///     plan.records.to_string(),
///     "scan | filter done == false | order_by name asc | skip 10 | limit 5"
/// );
/// assert_eq!(
///     plan.count.unwrap().to_string(),
///     "scan | filter done == false | order_by name asc"
/// );
/// ```
pub fn assemble(query: &Map<String, Value>, paginate: &Paginate) -> Result<ReadPlan> {
    let (directives, fields) = Directives::extract(query, paginate)?;

    let mut records = TableQuery::scan();
    if let Some(group) = &directives.or {
        records = records.filter(build_or_group(group)?);
    }
    records = records.filter(build_filter(&fields)?);

    if let Some(select) = directives.select {
        records = records.pluck(select);
    }
    if let Some(sort) = directives.sort {
        records = records.order_by(sort);
    }

    let count = paginate.is_enabled().then(|| records.clone());

    let skip = directives.skip.unwrap_or(0);
    if skip > 0 {
        records = records.skip(skip);
    }
    if let Some(limit) = directives.limit {
        records = records.limit(limit);
    }

    debug!(%records, paginated = count.is_some(), "assembled read plan");
    Ok(ReadPlan {
        records,
        count,
        limit: directives.limit,
        skip,
    })
}

/// Builds the record-selecting predicate of a query for writes.
///
/// Only `$or` and field conditions select records; `$select`, `$sort`,
/// `$skip` and `$limit` are validated but have no effect on which records a
/// bulk patch or remove touches.
pub fn selection(query: &Map<String, Value>) -> Result<Predicate> {
    let (directives, fields) = Directives::extract(query, &Paginate::default())?;
    let group = match &directives.or {
        Some(group) => build_or_group(group)?,
        None => Predicate::Always,
    };
    Ok(group.and(build_filter(&fields)?))
}
