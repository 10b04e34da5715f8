//! Error types for the query crate.

use thiserror::Error;

/// Errors that can occur while translating a filter query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A condition object used a keyword outside the supported operator set.
    #[error("unknown operator '{keyword}' on field '{field}'")]
    UnknownOperator { field: String, keyword: String },

    /// An `$or` entry carried a condition object instead of a scalar.
    #[error("nested condition on field '{field}' is not supported inside $or")]
    NestedOrCondition { field: String },

    /// `$in` / `$nin` received something other than an array.
    #[error("operator '{op}' on field '{field}' expects an array operand")]
    InvalidSetOperand { field: String, op: &'static str },

    /// A control directive had an unusable value.
    #[error("invalid {directive}: {reason}")]
    InvalidDirective {
        directive: String,
        reason: &'static str,
    },

    /// The query itself was not a JSON object.
    #[error("query must be an object, got {0}")]
    NotAnObject(&'static str),
}

impl QueryError {
    pub(crate) fn directive(directive: impl Into<String>, reason: &'static str) -> Self {
        QueryError::InvalidDirective {
            directive: directive.into(),
            reason,
        }
    }
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
