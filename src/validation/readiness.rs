//! Readiness checks
//!
//! Decide whether a definition is complete enough to render or persist.
//! These gate autosave and the live preview.

use crate::models::{FieldDefinition, FieldKind};

/// A field is renderable once it has a name, a title and a type, and (for
/// select fields) at least one option.
pub fn is_field_renderable(field: &FieldDefinition) -> bool {
    if field.name.is_empty() || field.title.is_empty() || field.type_name().is_empty() {
        return false;
    }

    match &field.kind {
        FieldKind::Select(validation) => !validation.options.is_empty(),
        _ => true,
    }
}

/// True iff there is at least one field and every field is renderable.
pub fn is_form_renderable(fields: &[FieldDefinition]) -> bool {
    !fields.is_empty() && fields.iter().all(is_field_renderable)
}
