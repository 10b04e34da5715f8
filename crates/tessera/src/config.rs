//! Service configuration.
//!
//! [`ServiceOptions`] carries everything [`Service::new`](crate::Service::new)
//! needs: the database handle, the table name, the identifier field and the
//! pagination settings. The serializable part lives in [`ServiceSettings`],
//! so hosts can keep it in a config file and attach the handle at runtime:
//!
//! ```yaml
//! name: todos
//! id: _id
//! paginate:
//!   default: 10
//!   max: 50
//! ```

use serde::{Deserialize, Serialize};

pub use tessera_query::Paginate;

/// Identifier field used when none is configured.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Construction options of a [`Service`](crate::Service).
#[derive(Debug, Clone)]
pub struct ServiceOptions<D> {
    /// Database handle with a selected database.
    pub model: Option<D>,
    /// Table name.
    pub name: Option<String>,
    /// Identifier field, `"id"` when unset.
    pub id: Option<String>,
    /// Pagination settings.
    pub paginate: Paginate,
}

impl<D> Default for ServiceOptions<D> {
    fn default() -> Self {
        ServiceOptions {
            model: None,
            name: None,
            id: None,
            paginate: Paginate::default(),
        }
    }
}

impl<D> ServiceOptions<D> {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database handle.
    pub fn model(mut self, model: D) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets the table name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the identifier field.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the pagination settings.
    pub fn paginate(mut self, paginate: Paginate) -> Self {
        self.paginate = paginate;
        self
    }
}

/// The serializable part of [`ServiceOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub name: Option<String>,
    pub id: Option<String>,
    pub paginate: Paginate,
}

impl ServiceSettings {
    /// Attaches a database handle, producing full options.
    pub fn with_model<D>(self, model: D) -> ServiceOptions<D> {
        ServiceOptions {
            model: Some(model),
            name: self.name,
            id: self.id,
            paginate: self.paginate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let options: ServiceOptions<()> = ServiceOptions::new()
            .model(())
            .name("todos")
            .id("_id")
            .paginate(Paginate::new(10).with_max(50));

        assert_eq!(options.model, Some(()));
        assert_eq!(options.name.as_deref(), Some("todos"));
        assert_eq!(options.id.as_deref(), Some("_id"));
        assert_eq!(options.paginate.default, Some(10));
        assert_eq!(options.paginate.max, Some(50));
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: ServiceSettings =
            serde_json::from_str(r#"{"name": "todos", "paginate": {"default": 5}}"#).unwrap();
        assert_eq!(settings.name.as_deref(), Some("todos"));
        assert_eq!(settings.id, None);
        assert_eq!(settings.paginate, Paginate::new(5));

        let empty: ServiceSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, ServiceSettings::default());
    }

    #[test]
    fn settings_attach_model() {
        let settings = ServiceSettings {
            name: Some("todos".to_string()),
            ..ServiceSettings::default()
        };
        let options = settings.with_model("handle");
        assert_eq!(options.model, Some("handle"));
        assert_eq!(options.name.as_deref(), Some("todos"));
    }
}
