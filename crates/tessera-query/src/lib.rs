//! Tessera query - translation of portable filter queries into native
//! table query pipelines.
//!
//! A filter query is a JSON object mapping field names to conditions, mixed
//! with a handful of control directives:
//!
//! ```json
//! {
//!   "status": "open",
//!   "priority": { "$gte": 3, "$lt": 8 },
//!   "owner": { "$in": ["ana", "ben"] },
//!   "$or": [{ "team": "core" }, { "team": "infra" }],
//!   "$select": ["id", "title"],
//!   "$sort": { "priority": -1 },
//!   "$skip": 20,
//!   "$limit": 10
//! }
//! ```
//!
//! This crate turns such a query into a [`TableQuery`]: a pipeline of filter,
//! projection, ordering, skip and limit stages that a database driver runs.
//! It supports:
//!
//! - Equality and the operators `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`,
//!   `$in`, `$nin`
//! - `$or` groups of equality queries
//! - Single-field ordering, projection and pagination with count snapshots
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tessera_query::{assemble, Paginate};
//!
//! let rows = vec![
//!     json!({"id": 1, "name": "Alice", "age": 31}),
//!     json!({"id": 2, "name": "Bob", "age": 27}),
//!     json!({"id": 3, "name": "Carol", "age": 45}),
//! ];
//!
//! let query = json!({"age": {"$gt": 28}, "$sort": {"age": -1}});
//! let plan = assemble(query.as_object().unwrap(), &Paginate::default()).unwrap();
//!
//! let names: Vec<_> = plan
//!     .records
//!     .evaluate(&rows)
//!     .into_iter()
//!     .map(|r| r["name"].clone())
//!     .collect();
//! assert_eq!(names, vec![json!("Carol"), json!("Alice")]);
//! ```
//!
//! # Semantics
//!
//! Field conditions combine with AND, in the query's key order:
//!
//! ```text
//! match = ($or group matches, or there is no $or)
//!       ∧ (every field condition matches)
//! ```
//!
//! Unknown operator keywords and nested conditions inside `$or` are rejected
//! with a [`QueryError`] rather than ignored.

mod assemble;
mod directives;
mod error;
mod op;
mod ordering;
mod pipeline;
mod predicate;
mod translate;
mod value;

// Re-export public API
pub use assemble::{assemble, selection, ReadPlan};
pub use directives::{is_directive, Directives, Paginate, DIRECTIVES};
pub use error::{QueryError, Result};
pub use op::Op;
pub use ordering::{Dir, OrderBy};
pub use pipeline::{Stage, TableQuery};
pub use predicate::Predicate;
pub use translate::{build_filter, build_or_group, translate_condition};
pub use value::{compare_values, field, total_cmp, type_name, values_equal};
