//! Error taxonomy of the service.
//!
//! - [`ConfigError`]: construction-time problems, returned synchronously by
//!   [`Service::new`](crate::Service::new).
//! - [`Error`]: failures of service operations. Driver failures are carried
//!   in [`Error::Driver`] untouched, so callers can still match on the
//!   driver's own error type.

use serde_json::Value;
use tessera_query::QueryError;
use thiserror::Error;

/// Invalid service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("You must provide a database handle on options.model")]
    MissingModel,

    #[error("You must provide a database handle that has a database selected")]
    MissingDatabase,

    #[error("You must provide a table name on options.name")]
    MissingTableName,
}

/// Failure of a service operation.
///
/// `E` is the driver's error type.
#[derive(Debug, Error)]
pub enum Error<E> {
    /// No record matched an identifier or query.
    #[error("{0}")]
    NotFound(String),

    /// The call did not carry enough information to act on.
    #[error("{0}")]
    BadRequest(String),

    /// The filter query could not be translated.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The driver failed.
    #[error(transparent)]
    Driver(E),
}

impl<E> Error<E> {
    /// Not-found error naming the identifier.
    pub fn not_found(id: &Value) -> Self {
        Error::NotFound(format!("No record found for id '{}'", display_id(id)))
    }

    /// Returns `true` for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// HTTP-style status code for hosts that map errors to responses.
    pub fn code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::BadRequest(_) | Error::Query(_) => 400,
            Error::Driver(_) => 500,
        }
    }

    /// Name of the error class, matching the status code.
    pub fn class_name(&self) -> &'static str {
        match self.code() {
            404 => "not-found",
            400 => "bad-request",
            _ => "general-error",
        }
    }
}

/// Renders an identifier for messages: strings without quotes, anything else
/// as JSON.
pub(crate) fn display_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
