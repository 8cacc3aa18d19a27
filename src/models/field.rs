//! Field definition model
//!
//! A field definition is a declarative description of one input in a form:
//! its data key, its label, whether it is required and the type-specific
//! validation rules. The wire shape is discriminated by the `type` attribute.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar that may be either text or a number.
///
/// Used for default values and select option values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScalarValue {
    Text(String),
    Number(f64),
}

impl ScalarValue {
    /// String form used when comparing submitted values against option values
    pub fn as_key(&self) -> String {
        self.to_string()
    }

    /// Convert into a JSON value for use as a form value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ScalarValue::Text(s) => serde_json::Value::String(s.clone()),
            ScalarValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(s) => f.write_str(s),
            ScalarValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Number(value)
    }
}

/// The closed set of field types the builder offers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Select,
}

impl FieldType {
    /// All selectable field types, in the order the builder lists them
    pub const ALL: [FieldType; 3] = [FieldType::Text, FieldType::Number, FieldType::Select];

    /// Wire name (`type` attribute value)
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Select => "select",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Text => "Text",
            FieldType::Number => "Number",
            FieldType::Select => "Select",
        }
    }

    /// Parse a wire name, returning `None` for anything unrecognized
    pub fn parse(value: &str) -> Option<Self> {
        FieldType::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

/// Informational presentation variant for number fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NumberVariant {
    Years,
    Temperature,
}

impl NumberVariant {
    pub const ALL: [NumberVariant; 2] = [NumberVariant::Years, NumberVariant::Temperature];

    pub fn label(&self) -> &'static str {
        match self {
            NumberVariant::Years => "Years",
            NumberVariant::Temperature => "Temperature",
        }
    }
}

/// Validation rules for text fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression a value must match (unanchored search)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_error: Option<String>,
}

/// Validation rules for number fields
///
/// Bounds may be negative (temperatures). Only `min <= max` is required,
/// and that is checked by `validate_configuration`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NumberValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_error: Option<String>,
}

/// One entry of a select field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: ScalarValue,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Validation rules for select fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectValidation {
    /// Ordered option list; must be non-empty for the field to render
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_error: Option<String>,
}

/// Type-specific part of a field definition
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(TextValidation),
    Number {
        variant: Option<NumberVariant>,
        validation: NumberValidation,
    },
    Select(SelectValidation),
    /// A `type` the model does not know (including the empty type of a
    /// freshly added field). The raw validation document is kept so the
    /// definition survives a save/load cycle unchanged.
    Unrecognized {
        type_name: String,
        validation: Option<serde_json::Value>,
    },
}

impl FieldKind {
    pub fn text() -> Self {
        FieldKind::Text(TextValidation::default())
    }

    pub fn number() -> Self {
        FieldKind::Number {
            variant: None,
            validation: NumberValidation::default(),
        }
    }

    pub fn select(options: Vec<SelectOption>) -> Self {
        FieldKind::Select(SelectValidation {
            options,
            custom_error: None,
        })
    }

    /// Fresh kind for the given type with empty validation
    pub fn for_type(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => FieldKind::text(),
            FieldType::Number => FieldKind::number(),
            FieldType::Select => FieldKind::select(Vec::new()),
        }
    }

    /// Wire name of the type
    pub fn type_name(&self) -> &str {
        match self {
            FieldKind::Text(_) => FieldType::Text.as_str(),
            FieldKind::Number { .. } => FieldType::Number.as_str(),
            FieldKind::Select(_) => FieldType::Select.as_str(),
            FieldKind::Unrecognized { type_name, .. } => type_name,
        }
    }

    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldKind::Text(_) => Some(FieldType::Text),
            FieldKind::Number { .. } => Some(FieldType::Number),
            FieldKind::Select(_) => Some(FieldType::Select),
            FieldKind::Unrecognized { .. } => None,
        }
    }
}

/// A single field definition
///
/// Serializes to a flat JSON object:
///
/// ```json
/// {"name": "age", "title": "Age", "type": "number", "required": true,
///  "validation": {"min": 0, "max": 120}}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawField", into = "RawField")]
pub struct FieldDefinition {
    /// Data key; unique within a configuration
    pub name: String,
    /// Display label
    pub title: String,
    pub required: bool,
    pub default_value: Option<ScalarValue>,
    pub kind: FieldKind,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, title: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            required: false,
            default_value: None,
            kind,
        }
    }

    /// The template appended by "Add Field": everything empty, no type yet.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            required: false,
            default_value: Some(ScalarValue::Text(String::new())),
            kind: FieldKind::Unrecognized {
                type_name: String::new(),
                validation: None,
            },
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_default(mut self, value: impl Into<ScalarValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Options of a select field, `None` for other types
    pub fn options(&self) -> Option<&[SelectOption]> {
        match &self.kind {
            FieldKind::Select(v) => Some(&v.options),
            _ => None,
        }
    }

    pub fn options_mut(&mut self) -> Option<&mut Vec<SelectOption>> {
        match &mut self.kind {
            FieldKind::Select(v) => Some(&mut v.options),
            _ => None,
        }
    }

    /// Placeholder text shown by an input for this field
    pub fn placeholder(&self) -> String {
        match self.kind {
            FieldKind::Select(_) => "Select an option".to_string(),
            _ => format!("Enter {}", self.title.to_lowercase()),
        }
    }
}

/// Parse comma-separated option entry into select options.
///
/// Each entry is trimmed and used as both label and value. Empty entries
/// are dropped.
pub fn parse_options(input: &str) -> Vec<SelectOption> {
    input
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| SelectOption::new(entry, entry))
        .collect()
}

/// Wire representation of a field definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    name: String,
    title: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variant: Option<NumberVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validation: Option<serde_json::Value>,
}

fn parse_validation<T>(field_type: &str, raw: Option<serde_json::Value>) -> Result<T, String>
where
    T: Default + serde::de::DeserializeOwned,
{
    match raw {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| format!("Invalid {} validation: {}", field_type, e)),
    }
}

impl TryFrom<RawField> for FieldDefinition {
    type Error = String;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        let kind = match FieldType::parse(&raw.field_type) {
            Some(FieldType::Text) => FieldKind::Text(parse_validation("text", raw.validation)?),
            Some(FieldType::Number) => FieldKind::Number {
                variant: raw.variant,
                validation: parse_validation("number", raw.validation)?,
            },
            Some(FieldType::Select) => {
                FieldKind::Select(parse_validation("select", raw.validation)?)
            }
            None => FieldKind::Unrecognized {
                type_name: raw.field_type,
                validation: raw.validation,
            },
        };

        Ok(FieldDefinition {
            name: raw.name,
            title: raw.title,
            required: raw.required,
            default_value: raw.default_value,
            kind,
        })
    }
}

impl From<FieldDefinition> for RawField {
    fn from(field: FieldDefinition) -> Self {
        let field_type = field.kind.type_name().to_string();
        let (variant, validation) = match field.kind {
            FieldKind::Text(v) => (None, serde_json::to_value(v).ok()),
            FieldKind::Number {
                variant,
                validation,
            } => (variant, serde_json::to_value(validation).ok()),
            FieldKind::Select(v) => (None, serde_json::to_value(v).ok()),
            FieldKind::Unrecognized { validation, .. } => (None, validation),
        };

        RawField {
            name: field.name,
            title: field.title,
            field_type,
            required: field.required,
            default_value: field.default_value,
            variant,
            validation,
        }
    }
}
