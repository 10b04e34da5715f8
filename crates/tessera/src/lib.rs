//! CRUD and query service over document tables.
//!
//! `tessera` exposes a small, framework-agnostic data-access contract over
//! one table of JSON records: `find`, `get`, `create`, `patch`, `update` and
//! `remove`. Filter queries are translated by [`tessera_query`] into
//! [`TableQuery`] pipelines, which a [`Table`] driver runs.
//!
//! # Features
//!
//! - **Portable queries**: equality, `$ne`/`$gt`/`$gte`/`$lt`/`$lte`,
//!   `$in`/`$nin`, `$or` groups, `$select`, `$sort`, `$skip`, `$limit`
//! - **Pagination**: optional page envelope with a total count, computed
//!   concurrently with the page itself
//! - **Returned state**: writes return the records they produced or removed
//! - **Driver seam**: [`Database`] and [`Table`] traits; [`MemoryDatabase`]
//!   is an in-process implementation
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use tessera::{MemoryDatabase, Paginate, Params, Service, ServiceOptions};
//!
//! # futures::executor::block_on(async {
//! let service = Service::new(
//!     ServiceOptions::new()
//!         .model(MemoryDatabase::new("app"))
//!         .name("todos")
//!         .paginate(Paginate::new(10)),
//! )
//! .unwrap();
//!
//! let todo = service
//!     .create(json!({"title": "write docs", "done": false}), Params::new())
//!     .await
//!     .unwrap();
//!
//! let page = service
//!     .find(Params::from_query(json!({"done": false})).unwrap())
//!     .await
//!     .unwrap();
//! assert_eq!(page.total(), Some(1));
//! assert_eq!(page.records()[0]["id"], todo["id"]);
//! # });
//! ```
//!
//! # Errors
//!
//! Operations fail with [`Error`]. Hosts that map failures to HTTP-style
//! responses use [`Error::code`]; [`Error::NotFound`] is always 404.

mod config;
mod driver;
mod error;
pub mod memory;
mod params;
mod service;

pub use config::{Paginate, ServiceOptions, ServiceSettings, DEFAULT_ID_FIELD};
pub use driver::{Change, Changes, Database, DriverError, Inserted, Selection, Table};
pub use error::{ConfigError, Error};
pub use memory::{MemoryDatabase, MemoryError, MemoryTable};
pub use params::Params;
pub use service::{FindResult, Mutation, Page, RemoveTarget, Service};

pub use tessera_query::{QueryError, TableQuery};
