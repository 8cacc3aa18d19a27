//! Form configuration model

use super::field::FieldDefinition;
use serde::{Deserialize, Serialize};

/// An ordered list of field definitions.
///
/// Order is significant: it is the display and tab order of the rendered
/// form. This is also the persisted document shape (`{"fields": [...]}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FormConfiguration {
    pub fields: Vec<FieldDefinition>,
}

impl FormConfiguration {
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Look up a field by its data key
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl From<Vec<FieldDefinition>> for FormConfiguration {
    fn from(fields: Vec<FieldDefinition>) -> Self {
        Self::new(fields)
    }
}
