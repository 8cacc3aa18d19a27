//! Validation derivation
//!
//! Turns declarative field definitions into executable checks. A
//! [`FieldCheck`] validates one submitted value; a [`FormCheck`] composes
//! the field checks of a configuration keyed by field name and validates a
//! whole submission.
//!
//! Derivation is pure: deriving twice from the same definitions yields checks
//! with identical behaviour.

use crate::models::{FieldDefinition, FieldKind, ScalarValue};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Message for a required field with no value
pub const REQUIRED_MESSAGE: &str = "Required";
/// Default message for a text value not matching its pattern
pub const INVALID_FORMAT_MESSAGE: &str = "Invalid format";
/// Default message for a select value outside the declared options
pub const INVALID_OPTION_MESSAGE: &str = "Please select a valid option";
pub const EXPECTED_TEXT_MESSAGE: &str = "Expected text";
pub const EXPECTED_NUMBER_MESSAGE: &str = "Expected a number";

#[derive(Debug, Clone)]
enum Pattern {
    Compiled(Regex),
    /// The declared pattern does not compile; nothing can match it
    Invalid,
}

#[derive(Debug, Clone)]
struct Bound<T> {
    limit: T,
    message: String,
}

#[derive(Debug, Clone)]
enum Rule {
    Text {
        min_length: Option<Bound<usize>>,
        max_length: Option<Bound<usize>>,
        pattern: Option<(Pattern, String)>,
    },
    Number {
        min: Option<Bound<f64>>,
        max: Option<Bound<f64>>,
    },
    Select {
        allowed: Vec<String>,
        message: String,
    },
    /// Accepts any value. Used for field types this engine does not know.
    Any,
}

impl Rule {
    fn check(&self, value: &Value) -> Result<(), String> {
        match self {
            Rule::Text {
                min_length,
                max_length,
                pattern,
            } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| EXPECTED_TEXT_MESSAGE.to_string())?;
                let length = text.chars().count();
                if let Some(bound) = min_length
                    && length < bound.limit
                {
                    return Err(bound.message.clone());
                }
                if let Some(bound) = max_length
                    && length > bound.limit
                {
                    return Err(bound.message.clone());
                }
                if let Some((pattern, message)) = pattern {
                    let matches = match pattern {
                        Pattern::Compiled(re) => re.is_match(text),
                        Pattern::Invalid => false,
                    };
                    if !matches {
                        return Err(message.clone());
                    }
                }
                Ok(())
            }
            Rule::Number { min, max } => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| EXPECTED_NUMBER_MESSAGE.to_string())?;
                if let Some(bound) = min
                    && number < bound.limit
                {
                    return Err(bound.message.clone());
                }
                if let Some(bound) = max
                    && number > bound.limit
                {
                    return Err(bound.message.clone());
                }
                Ok(())
            }
            Rule::Select { allowed, message } => {
                let key = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => match n.as_f64() {
                        Some(f) => ScalarValue::Number(f).as_key(),
                        None => n.to_string(),
                    },
                    _ => return Err(message.clone()),
                };
                if allowed.contains(&key) {
                    Ok(())
                } else {
                    Err(message.clone())
                }
            }
            Rule::Any => Ok(()),
        }
    }
}

/// Executable check for a single field
#[derive(Debug, Clone)]
pub struct FieldCheck {
    name: String,
    required: bool,
    rule: Rule,
}

impl FieldCheck {
    /// Name of the field this check validates
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Validate a submitted value (`None` when the value is absent).
    ///
    /// Optional fields accept absent, null and empty-string values before any
    /// type-specific rule runs. Required fields reject absent and null values.
    pub fn check(&self, value: Option<&Value>) -> Result<(), String> {
        let value = match value {
            None | Some(Value::Null) => {
                return if self.required {
                    Err(REQUIRED_MESSAGE.to_string())
                } else {
                    Ok(())
                };
            }
            Some(Value::String(s)) if s.is_empty() && !self.required => return Ok(()),
            Some(v) => v,
        };

        self.rule.check(value)
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level failures of one submission, in form order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("Validation failed for {} field(s)", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message for a field, if it failed
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub(crate) fn remove(&mut self, field: &str) {
        self.errors.retain(|e| e.field != field);
    }

    fn push(&mut self, field: &str, message: String) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message,
        });
    }
}

/// Object-shaped check composed from per-field checks
#[derive(Debug, Clone, Default)]
pub struct FormCheck {
    fields: Vec<FieldCheck>,
}

impl FormCheck {
    pub fn fields(&self) -> &[FieldCheck] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldCheck> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a submission.
    ///
    /// On success returns the submitted values restricted to declared fields.
    /// Keys that were not submitted are left out; submitted values are passed
    /// through unchanged.
    pub fn validate(&self, values: &Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut output = Map::new();

        for check in &self.fields {
            let value = values.get(&check.name);
            match check.check(value) {
                Ok(()) => {
                    if let Some(v) = value {
                        output.insert(check.name.clone(), v.clone());
                    }
                }
                Err(message) => errors.push(&check.name, message),
            }
        }

        if errors.is_empty() {
            Ok(output)
        } else {
            Err(errors)
        }
    }
}

fn message_or(custom: &Option<String>, fallback: impl FnOnce() -> String) -> String {
    match custom {
        Some(message) if !message.is_empty() => message.clone(),
        _ => fallback(),
    }
}

/// Derive the executable check for one field definition.
///
/// Unrecognized field types yield a check that accepts any value.
pub fn derive_field_check(field: &FieldDefinition) -> FieldCheck {
    let rule = match &field.kind {
        FieldKind::Text(v) => Rule::Text {
            min_length: v.min_length.map(|limit| Bound {
                limit,
                message: message_or(&v.custom_error, || {
                    format!("Minimum {} characters required", limit)
                }),
            }),
            max_length: v.max_length.map(|limit| Bound {
                limit,
                message: message_or(&v.custom_error, || {
                    format!("Maximum {} characters allowed", limit)
                }),
            }),
            pattern: v.pattern.as_ref().map(|source| {
                let pattern = match Regex::new(source) {
                    Ok(re) => Pattern::Compiled(re),
                    Err(e) => {
                        warn!(
                            "Field '{}' has an invalid pattern '{}': {}",
                            field.name, source, e
                        );
                        Pattern::Invalid
                    }
                };
                (
                    pattern,
                    message_or(&v.custom_error, || INVALID_FORMAT_MESSAGE.to_string()),
                )
            }),
        },
        FieldKind::Number { validation: v, .. } => Rule::Number {
            min: v.min.map(|limit| Bound {
                limit,
                message: message_or(&v.custom_error, || format!("Minimum value is {}", limit)),
            }),
            max: v.max.map(|limit| Bound {
                limit,
                message: message_or(&v.custom_error, || format!("Maximum value is {}", limit)),
            }),
        },
        FieldKind::Select(v) => Rule::Select {
            allowed: v.options.iter().map(|o| o.value.as_key()).collect(),
            message: message_or(&v.custom_error, || INVALID_OPTION_MESSAGE.to_string()),
        },
        FieldKind::Unrecognized { type_name, .. } => {
            warn!(
                "Field '{}' has unrecognized type '{}'; any value will be accepted",
                field.name, type_name
            );
            Rule::Any
        }
    };

    FieldCheck {
        name: field.name.clone(),
        required: field.required,
        rule,
    }
}

/// Derive the form-level check for an ordered list of field definitions.
///
/// Checks are keyed by field name; a later definition with the same name
/// replaces the earlier one.
pub fn derive_form_check(fields: &[FieldDefinition]) -> FormCheck {
    let mut checks: Vec<FieldCheck> = Vec::with_capacity(fields.len());
    for field in fields {
        let check = derive_field_check(field);
        match checks.iter_mut().find(|c| c.name == check.name) {
            Some(existing) => *existing = check,
            None => checks.push(check),
        }
    }
    FormCheck { fields: checks }
}
