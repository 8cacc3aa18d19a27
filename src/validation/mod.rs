//! Validation functionality
//!
//! Provides:
//! - Validation derivation (field definitions to executable checks)
//! - Readiness checks (is a definition complete enough to render/persist)
//! - Definition validation (authoring rules for a whole configuration)

pub mod checks;
pub mod definition;
pub mod readiness;

pub use checks::{
    FieldCheck, FieldError, FormCheck, ValidationErrors, derive_field_check, derive_form_check,
};
pub use definition::{DefinitionIssue, validate_configuration};
pub use readiness::{is_field_renderable, is_form_renderable};
