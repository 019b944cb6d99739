//! # Declared Resource Store
//!
//! Local view of one declared resource: typed field access plus the stable
//! external identifier slot. The reconciliation driver owns persistence; the
//! synchronizer reads declared fields and writes computed ones through this
//! store, never the other way around.
//!
//! An unset field and a field set to the empty string are different things:
//! [`ResourceData::get`] returns `None` only for the former.

use std::collections::HashMap;

/// Field values of one declared resource instance.
///
/// Every field of the key-version resource is string-valued, so the store
/// keeps plain strings rather than a tagged value type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceData {
    id: String,
    fields: HashMap<String, String>,
}

impl ResourceData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment, convenient when declaring a resource.
    #[must_use]
    pub fn with_field(mut self, field: &str, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Builder-style id assignment, convenient for import flows.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Stable external identifier of the resource (the composite id once a
    /// create or import has completed).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Value of a declared or computed field. `None` means the field was
    /// never set with an explicit value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_string(), value.into());
    }
}
