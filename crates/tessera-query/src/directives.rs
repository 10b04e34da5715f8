//! Control directives and pagination settings.
//!
//! A raw filter query mixes field conditions with five reserved keys:
//! `$select`, `$sort`, `$or`, `$skip` and `$limit`. [`Directives::extract`]
//! pulls those out, validates them, and hands back the remaining field
//! conditions.
//!
//! Values arriving from query strings are text, so `$skip` and `$limit` also
//! accept numeric strings, and negative counts are taken by absolute value.
//! A sort direction is ascending only for `1` or `"1"`; every other value
//! sorts descending.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{QueryError, Result};
use crate::ordering::{Dir, OrderBy};
use crate::value::type_name;

pub const SELECT: &str = "$select";
pub const SORT: &str = "$sort";
pub const OR: &str = "$or";
pub const SKIP: &str = "$skip";
pub const LIMIT: &str = "$limit";

/// The reserved top-level keys.
pub const DIRECTIVES: [&str; 5] = [SELECT, SORT, OR, SKIP, LIMIT];

/// Returns `true` if `key` is one of the reserved control directives.
pub fn is_directive(key: &str) -> bool {
    DIRECTIVES.contains(&key)
}

/// Pagination settings of a service.
///
/// With no `default`, results are returned as a bare list. With a `default`,
/// results are wrapped in a page envelope and `$limit` falls back to the
/// default page size, clamped to `max` when one is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paginate {
    /// Page size used when the query does not set `$limit`.
    pub default: Option<usize>,
    /// Upper bound for `$limit`.
    pub max: Option<usize>,
}

impl Paginate {
    /// Pagination with the given default page size and no maximum.
    pub fn new(default: usize) -> Self {
        Paginate {
            default: Some(default),
            max: None,
        }
    }

    /// Sets the maximum page size.
    pub fn with_max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Returns `true` if results are wrapped in a page envelope.
    pub fn is_enabled(&self) -> bool {
        self.default.is_some()
    }

    /// Resolves the limit to apply for a requested `$limit`.
    ///
    /// Without pagination the request passes through unchanged.
    pub fn effective_limit(&self, requested: Option<usize>) -> Option<usize> {
        match self.default {
            Some(default) => {
                let limit = requested.unwrap_or(default);
                Some(self.max.map_or(limit, |max| limit.min(max)))
            }
            None => requested,
        }
    }
}

/// The control directives of one query, validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directives {
    /// Fields to project.
    pub select: Option<Vec<String>>,
    /// Single-field ordering.
    pub sort: Option<OrderBy>,
    /// OR group entries, in order.
    pub or: Option<Vec<Map<String, Value>>>,
    /// Records to skip.
    pub skip: Option<usize>,
    /// Effective record limit (after pagination defaults and clamping).
    pub limit: Option<usize>,
}

impl Directives {
    /// Splits a raw query into directives and field conditions.
    ///
    /// The returned map keeps the input's key order. Any other `$`-prefixed
    /// top-level key is rejected, since it is neither a field nor a supported
    /// directive.
    pub fn extract(
        query: &Map<String, Value>,
        paginate: &Paginate,
    ) -> Result<(Directives, Map<String, Value>)> {
        let mut directives = Directives::default();
        let mut fields = Map::new();
        let mut requested_limit = None;

        for (key, value) in query {
            match key.as_str() {
                SELECT => directives.select = Some(parse_select(value)?),
                SORT => directives.sort = parse_sort(value)?,
                OR => directives.or = Some(parse_or(value)?),
                SKIP => directives.skip = Some(parse_count(SKIP, value)?),
                LIMIT => requested_limit = Some(parse_count(LIMIT, value)?),
                other if other.starts_with('$') => {
                    return Err(QueryError::directive(other, "unsupported directive"));
                }
                _ => {
                    fields.insert(key.clone(), value.clone());
                }
            }
        }
        directives.limit = paginate.effective_limit(requested_limit);

        trace!(?directives, fields = fields.len(), "extracted query directives");
        Ok((directives, fields))
    }
}

fn parse_select(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(field) => Ok(vec![field.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(field) => Ok(field.clone()),
                _ => Err(QueryError::directive(SELECT, "field names must be strings")),
            })
            .collect(),
        _ => Err(QueryError::directive(
            SELECT,
            "expected a field name or an array of field names",
        )),
    }
}

fn parse_sort(value: &Value) -> Result<Option<OrderBy>> {
    let Value::Object(sort) = value else {
        return Err(QueryError::directive(SORT, "expected an object of field: direction"));
    };
    let mut entries = sort.iter();
    let Some((field, direction)) = entries.next() else {
        return Ok(None);
    };
    if entries.next().is_some() {
        return Err(QueryError::directive(SORT, "only one sort field is supported"));
    }
    Ok(Some(OrderBy::new(field.clone(), Dir::from_direction(direction))))
}

fn parse_or(value: &Value) -> Result<Vec<Map<String, Value>>> {
    let Value::Array(entries) = value else {
        return Err(QueryError::directive(OR, "expected an array of queries"));
    };
    if entries.is_empty() {
        return Err(QueryError::directive(OR, "must contain at least one query"));
    }
    entries
        .iter()
        .map(|entry| match entry {
            Value::Object(entry) => Ok(entry.clone()),
            _ => Err(QueryError::directive(OR, "entries must be objects")),
        })
        .collect()
}

fn parse_count(directive: &'static str, value: &Value) -> Result<usize> {
    parse_integer(value)
        .and_then(|n| usize::try_from(n.unsigned_abs()).ok())
        .ok_or_else(|| QueryError::directive(directive, "expected a number"))
}

fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|n| i64::try_from(n).unwrap_or(i64::MAX)))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        other => {
            trace!(kind = type_name(other), "non-numeric directive value");
            None
        }
    }
}
