//! Models module for the SDK
//!
//! Pure data: field definitions and the form configuration that orders
//! them. No behaviour beyond (de)serialization and structural equality.

pub mod field;
pub mod form;

pub use field::{
    FieldDefinition, FieldKind, FieldType, NumberValidation, NumberVariant, ScalarValue,
    SelectOption, SelectValidation, TextValidation, parse_options,
};
pub use form::FormConfiguration;
