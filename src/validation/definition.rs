//! Definition validation
//!
//! Authoring-time checks on a whole configuration: the rules a definition
//! must satisfy before an explicit save. Unlike readiness, this collects
//! every problem so the builder can show them together.

use crate::models::{FieldKind, FormConfiguration};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// A problem with a form definition
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum DefinitionIssue {
    #[error("At least one field is required")]
    NoFields,

    #[error("Field {}: Field name is required", .index + 1)]
    MissingName { index: usize },

    #[error("Field {}: Question title is required", .index + 1)]
    MissingTitle { index: usize },

    #[error("Field {}: Field type is required", .index + 1)]
    MissingType { index: usize },

    #[error("Field {}: unsupported field type '{type_name}'", .index + 1)]
    UnsupportedType { index: usize, type_name: String },

    #[error("Field names must be unique: '{name}' is used more than once")]
    DuplicateName { name: String },

    #[error("Field '{field}': minimum length {min} exceeds maximum length {max}")]
    LengthBoundsInverted { field: String, min: usize, max: usize },

    #[error("Field '{field}': minimum value {min} exceeds maximum value {max}")]
    ValueBoundsInverted { field: String, min: f64, max: f64 },

    #[error("Field '{field}': invalid pattern: {reason}")]
    InvalidPattern { field: String, reason: String },

    #[error("Field '{field}': select fields need at least one option")]
    NoOptions { field: String },
}

/// Validate a configuration, collecting every issue found.
pub fn validate_configuration(configuration: &FormConfiguration) -> Result<(), Vec<DefinitionIssue>> {
    let mut issues = Vec::new();

    if configuration.is_empty() {
        issues.push(DefinitionIssue::NoFields);
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();

    for (index, field) in configuration.fields.iter().enumerate() {
        if field.name.is_empty() {
            issues.push(DefinitionIssue::MissingName { index });
        } else if !seen.insert(field.name.as_str()) && reported.insert(field.name.as_str()) {
            issues.push(DefinitionIssue::DuplicateName {
                name: field.name.clone(),
            });
        }

        if field.title.is_empty() {
            issues.push(DefinitionIssue::MissingTitle { index });
        }

        match &field.kind {
            FieldKind::Text(v) => {
                if let (Some(min), Some(max)) = (v.min_length, v.max_length)
                    && min > max
                {
                    issues.push(DefinitionIssue::LengthBoundsInverted {
                        field: field.name.clone(),
                        min,
                        max,
                    });
                }
                if let Some(pattern) = &v.pattern
                    && let Err(e) = Regex::new(pattern)
                {
                    issues.push(DefinitionIssue::InvalidPattern {
                        field: field.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            FieldKind::Number { validation: v, .. } => {
                if let (Some(min), Some(max)) = (v.min, v.max)
                    && min > max
                {
                    issues.push(DefinitionIssue::ValueBoundsInverted {
                        field: field.name.clone(),
                        min,
                        max,
                    });
                }
            }
            FieldKind::Select(v) => {
                if v.options.is_empty() {
                    issues.push(DefinitionIssue::NoOptions {
                        field: field.name.clone(),
                    });
                }
            }
            FieldKind::Unrecognized { type_name, .. } => {
                if type_name.is_empty() {
                    issues.push(DefinitionIssue::MissingType { index });
                } else {
                    issues.push(DefinitionIssue::UnsupportedType {
                        index,
                        type_name: type_name.clone(),
                    });
                }
            }
        }
    }

    if issues.is_empty() { Ok(()) } else { Err(issues) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        FieldDefinition, NumberValidation, SelectOption, TextValidation,
    };

    #[test]
    fn test_valid_configuration() {
        let config = FormConfiguration::new(vec![
            FieldDefinition::new("name", "Name", FieldKind::text()),
            FieldDefinition::new(
                "country",
                "Country",
                FieldKind::select(vec![SelectOption::new("USA", "usa")]),
            ),
        ]);
        assert!(validate_configuration(&config).is_ok());
    }

    #[test]
    fn test_empty_configuration() {
        let issues = validate_configuration(&FormConfiguration::default()).unwrap_err();
        assert_eq!(issues, vec![DefinitionIssue::NoFields]);
        assert_eq!(issues[0].to_string(), "At least one field is required");
    }

    #[test]
    fn test_blank_field_reports_everything() {
        let config = FormConfiguration::new(vec![FieldDefinition::blank()]);
        let issues = validate_configuration(&config).unwrap_err();
        assert_eq!(
            issues,
            vec![
                DefinitionIssue::MissingName { index: 0 },
                DefinitionIssue::MissingTitle { index: 0 },
                DefinitionIssue::MissingType { index: 0 },
            ]
        );
        assert_eq!(issues[0].to_string(), "Field 1: Field name is required");
    }

    #[test]
    fn test_duplicate_names_reported_once() {
        let config = FormConfiguration::new(vec![
            FieldDefinition::new("a", "A", FieldKind::text()),
            FieldDefinition::new("a", "A2", FieldKind::text()),
            FieldDefinition::new("a", "A3", FieldKind::number()),
        ]);
        let issues = validate_configuration(&config).unwrap_err();
        assert_eq!(
            issues,
            vec![DefinitionIssue::DuplicateName { name: "a".into() }]
        );
    }

    #[test]
    fn test_inverted_bounds() {
        let config = FormConfiguration::new(vec![
            FieldDefinition::new(
                "t",
                "T",
                FieldKind::Text(TextValidation {
                    min_length: Some(5),
                    max_length: Some(2),
                    ..Default::default()
                }),
            ),
            FieldDefinition::new(
                "n",
                "N",
                FieldKind::Number {
                    variant: None,
                    validation: NumberValidation {
                        min: Some(10.0),
                        max: Some(1.0),
                        custom_error: None,
                    },
                },
            ),
        ]);
        let issues = validate_configuration(&config).unwrap_err();
        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], DefinitionIssue::LengthBoundsInverted { .. }));
        assert!(matches!(issues[1], DefinitionIssue::ValueBoundsInverted { .. }));
    }

    #[test]
    fn test_negative_number_bounds_allowed() {
        let config = FormConfiguration::new(vec![FieldDefinition::new(
            "temp",
            "Temperature",
            FieldKind::Number {
                variant: None,
                validation: NumberValidation {
                    min: Some(-40.0),
                    max: Some(50.0),
                    custom_error: None,
                },
            },
        )]);
        assert!(validate_configuration(&config).is_ok());
    }

    #[test]
    fn test_invalid_pattern_and_missing_options() {
        let config = FormConfiguration::new(vec![
            FieldDefinition::new(
                "code",
                "Code",
                FieldKind::Text(TextValidation {
                    pattern: Some("[a-".into()),
                    ..Default::default()
                }),
            ),
            FieldDefinition::new("pick", "Pick", FieldKind::select(vec![])),
        ]);
        let issues = validate_configuration(&config).unwrap_err();
        assert!(matches!(&issues[0], DefinitionIssue::InvalidPattern { field, .. } if field == "code"));
        assert_eq!(issues[1], DefinitionIssue::NoOptions { field: "pick".into() });
    }
}
