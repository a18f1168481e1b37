//! Start-request schema validation.
//!
//! A start request carries the requested-knowledge schema as raw JSON plus
//! the force flag selecting the session mode. Validation walks every entry
//! and accumulates every defect before reporting, so the caller sees the
//! whole list at once instead of fixing one error per attempt.

use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::ValidationError;

use super::field::{FieldSpec, FieldType};
use super::phase::Mode;
use super::record::{normalize_null, KnowledgeRecord};

/// Validation failures for a start request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Requested knowledge must be a JSON object of field entries")]
    NotAnObject,

    #[error("Field key must be a non-empty string")]
    EmptyKey,

    #[error("Field '{key}' must be described by an object")]
    EntryNotAnObject { key: String },

    #[error("Field '{key}' must declare a type name")]
    TypeMissing { key: String },

    #[error("Field '{key}' has unsupported type '{type_name}'")]
    TypeUnsupported { key: String, type_name: String },

    #[error("Field '{key}' must have a non-empty description")]
    DescriptionMissing { key: String },

    #[error("Field '{key}' must have a non-empty question")]
    QuestionMissing { key: String },

    #[error("Field '{key}' has an enum that is not an array")]
    EnumNotAnArray { key: String },

    #[error("Field '{key}' has a preset value not matching declared type '{expected}'")]
    ValueTypeMismatch { key: String, expected: FieldType },

    #[error("Force flag must be boolean true or false")]
    ForceNotBoolean,

    #[error("Duplicate field '{key}'")]
    DuplicateField { key: String },

    #[error("Schema validation failed: {message}")]
    Generic { message: String },
}

impl From<ValidationError> for SchemaError {
    fn from(err: ValidationError) -> Self {
        SchemaError::Generic {
            message: err.to_string(),
        }
    }
}

/// Validates a raw start request and builds the session's record and mode.
///
/// Pure: no logging, no session state. All defects across all entries (and
/// the force flag) are accumulated; validation never short-circuits on the
/// first failure.
pub fn validate(requested: &Value, force: &Value) -> Result<(KnowledgeRecord, Mode), Vec<SchemaError>> {
    let mut errors = Vec::new();

    let mode = match force {
        Value::Bool(true) => Some(Mode::PerTurn),
        Value::Bool(false) => Some(Mode::Batch),
        _ => {
            errors.push(SchemaError::ForceNotBoolean);
            None
        }
    };

    let mut fields = Vec::new();
    match requested.as_object() {
        Some(entries) => {
            for (key, entry) in entries {
                match validate_entry(key, entry) {
                    Ok(field) => fields.push(field),
                    Err(mut entry_errors) => errors.append(&mut entry_errors),
                }
            }
        }
        None => errors.push(SchemaError::NotAnObject),
    }

    match (mode, errors.is_empty()) {
        (Some(mode), true) => {
            let record = KnowledgeRecord::from_fields(fields).map_err(|err| vec![err])?;
            Ok((record, mode))
        }
        _ => Err(errors),
    }
}

/// Checks one schema entry, accumulating every defect it carries.
fn validate_entry(key: &str, entry: &Value) -> Result<FieldSpec, Vec<SchemaError>> {
    let mut errors = Vec::new();

    if key.is_empty() {
        errors.push(SchemaError::EmptyKey);
    }

    let obj = match entry.as_object() {
        Some(obj) => obj,
        None => {
            // Without an object there is nothing further to check.
            errors.push(SchemaError::EntryNotAnObject {
                key: key.to_string(),
            });
            return Err(errors);
        }
    };

    let field_type = match obj.get("type").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => match FieldType::parse(name) {
            Some(ft) => Some(ft),
            None => {
                errors.push(SchemaError::TypeUnsupported {
                    key: key.to_string(),
                    type_name: name.to_string(),
                });
                None
            }
        },
        _ => {
            errors.push(SchemaError::TypeMissing {
                key: key.to_string(),
            });
            None
        }
    };

    let description = match obj.get("description").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => {
            errors.push(SchemaError::DescriptionMissing {
                key: key.to_string(),
            });
            None
        }
    };

    let question = match obj.get("question").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => {
            errors.push(SchemaError::QuestionMissing {
                key: key.to_string(),
            });
            None
        }
    };

    let allowed = match obj.get("enum") {
        None => None,
        Some(Value::Array(values)) => Some(values.clone()),
        Some(_) => {
            errors.push(SchemaError::EnumNotAnArray {
                key: key.to_string(),
            });
            None
        }
    };

    // A preset null means "still outstanding", not a defect. A preset of
    // the wrong type is checked independently so it reports alongside any
    // other defects of the entry.
    let preset = obj.get("value").cloned().and_then(normalize_null);
    let preset = match (preset, field_type) {
        (Some(value), Some(ft)) => {
            if ft.matches(&value) {
                Some(value)
            } else {
                errors.push(SchemaError::ValueTypeMismatch {
                    key: key.to_string(),
                    expected: ft,
                });
                None
            }
        }
        (value, _) => value,
    };

    match (field_type, description, question, errors.is_empty()) {
        (Some(ft), Some(description), Some(question), true) => {
            let mut field = FieldSpec::new(key, ft, description, question)
                .map_err(|err| vec![SchemaError::from(err)])?;
            if let Some(values) = allowed {
                field = field.with_allowed(values);
            }
            if let Some(value) = preset {
                field = field.with_value(value).map_err(|err| vec![SchemaError::from(err)])?;
            }
            Ok(field)
        }
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn email_schema() -> Value {
        json!({
            "email": {
                "type": "string",
                "description": "The user's email address",
                "question": "What is your email address?"
            }
        })
    }

    mod valid_schemas {
        use super::*;

        #[test]
        fn single_field_schema_builds_record() {
            let (record, mode) = validate(&email_schema(), &json!(true)).unwrap();
            assert_eq!(record.len(), 1);
            assert_eq!(mode, Mode::PerTurn);

            let field = record.get("email").unwrap();
            assert_eq!(field.field_type(), FieldType::String);
            assert_eq!(field.question(), "What is your email address?");
            assert!(field.is_outstanding());
        }

        #[test]
        fn force_false_selects_batch_mode() {
            let (_, mode) = validate(&email_schema(), &json!(false)).unwrap();
            assert_eq!(mode, Mode::Batch);
        }

        #[test]
        fn fields_keep_schema_order() {
            let schema = json!({
                "last_name": { "type": "string", "description": "d", "question": "q1?" },
                "age": { "type": "number", "description": "d", "question": "q2?" },
                "first_name": { "type": "string", "description": "d", "question": "q3?" }
            });
            let (record, _) = validate(&schema, &json!(true)).unwrap();
            let names: Vec<&str> = record.fields().iter().map(|f| f.name()).collect();
            assert_eq!(names, vec!["last_name", "age", "first_name"]);
        }

        #[test]
        fn enum_values_become_allowed_set() {
            let schema = json!({
                "size": {
                    "type": "string",
                    "description": "T-shirt size",
                    "question": "What size?",
                    "enum": ["small", "medium", "large"]
                }
            });
            let (record, _) = validate(&schema, &json!(true)).unwrap();
            assert_eq!(
                record.get("size").unwrap().allowed(),
                Some(&[json!("small"), json!("medium"), json!("large")][..])
            );
        }

        #[test]
        fn preset_value_of_matching_type_is_kept() {
            let schema = json!({
                "email": {
                    "type": "string",
                    "description": "d",
                    "question": "q?",
                    "value": "a@b.com"
                }
            });
            let (record, _) = validate(&schema, &json!(true)).unwrap();
            assert!(!record.get("email").unwrap().is_outstanding());
        }

        #[test]
        fn preset_null_leaves_field_outstanding() {
            let schema = json!({
                "email": { "type": "string", "description": "d", "question": "q?", "value": null }
            });
            let (record, _) = validate(&schema, &json!(true)).unwrap();
            assert!(record.get("email").unwrap().is_outstanding());
        }

        #[test]
        fn preset_null_string_leaves_field_outstanding() {
            let schema = json!({
                "email": { "type": "string", "description": "d", "question": "q?", "value": "null" }
            });
            let (record, _) = validate(&schema, &json!(true)).unwrap();
            assert!(record.get("email").unwrap().is_outstanding());
        }

        #[test]
        fn empty_schema_is_valid() {
            let (record, _) = validate(&json!({}), &json!(true)).unwrap();
            assert!(record.is_empty());
        }
    }

    mod error_accumulation {
        use super::*;

        #[test]
        fn two_defects_report_two_errors() {
            let schema = json!({
                "email": { "type": "string", "question": "q?" },
                "age": { "type": "integer", "description": "d", "question": "q?" }
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(errors.len(), 2);
            assert!(errors.contains(&SchemaError::DescriptionMissing {
                key: "email".to_string()
            }));
            assert!(errors.contains(&SchemaError::TypeUnsupported {
                key: "age".to_string(),
                type_name: "integer".to_string()
            }));
        }

        #[test]
        fn multiple_defects_in_one_entry_all_reported() {
            let schema = json!({
                "email": {}
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(errors.len(), 3);
            assert!(errors.contains(&SchemaError::TypeMissing {
                key: "email".to_string()
            }));
            assert!(errors.contains(&SchemaError::DescriptionMissing {
                key: "email".to_string()
            }));
            assert!(errors.contains(&SchemaError::QuestionMissing {
                key: "email".to_string()
            }));
        }

        #[test]
        fn non_object_entry_reports_once_and_continues() {
            let schema = json!({
                "email": "not an object",
                "age": { "type": "number", "description": "d" }
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(errors.len(), 2);
            assert!(errors.contains(&SchemaError::EntryNotAnObject {
                key: "email".to_string()
            }));
            assert!(errors.contains(&SchemaError::QuestionMissing {
                key: "age".to_string()
            }));
        }

        #[test]
        fn empty_key_is_reported() {
            let schema = json!({
                "": { "type": "string", "description": "d", "question": "q?" }
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(errors, vec![SchemaError::EmptyKey]);
        }

        #[test]
        fn non_string_type_reports_type_missing() {
            let schema = json!({
                "email": { "type": 42, "description": "d", "question": "q?" }
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(
                errors,
                vec![SchemaError::TypeMissing {
                    key: "email".to_string()
                }]
            );
        }

        #[test]
        fn schema_not_an_object_is_a_single_error() {
            let errors = validate(&json!(["email"]), &json!(true)).unwrap_err();
            assert_eq!(errors, vec![SchemaError::NotAnObject]);
        }

        #[test]
        fn preset_value_of_wrong_type_is_reported() {
            let schema = json!({
                "age": { "type": "number", "description": "d", "question": "q?", "value": "thirty" }
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(
                errors,
                vec![SchemaError::ValueTypeMismatch {
                    key: "age".to_string(),
                    expected: FieldType::Number
                }]
            );
        }

        #[test]
        fn enum_must_be_an_array() {
            let schema = json!({
                "size": { "type": "string", "description": "d", "question": "q?", "enum": "small" }
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(
                errors,
                vec![SchemaError::EnumNotAnArray {
                    key: "size".to_string()
                }]
            );
        }

        #[test]
        fn valid_entries_do_not_mask_invalid_ones() {
            let schema = json!({
                "email": { "type": "string", "description": "d", "question": "q?" },
                "age": { "type": "number", "description": "d" }
            });
            let errors = validate(&schema, &json!(true)).unwrap_err();
            assert_eq!(
                errors,
                vec![SchemaError::QuestionMissing {
                    key: "age".to_string()
                }]
            );
        }
    }

    mod force_flag {
        use super::*;

        #[test]
        fn non_boolean_force_is_rejected() {
            let errors = validate(&email_schema(), &json!("yes")).unwrap_err();
            assert_eq!(errors, vec![SchemaError::ForceNotBoolean]);
        }

        #[test]
        fn null_force_is_rejected() {
            let errors = validate(&email_schema(), &json!(null)).unwrap_err();
            assert_eq!(errors, vec![SchemaError::ForceNotBoolean]);
        }

        #[test]
        fn force_error_accumulates_with_schema_errors() {
            let schema = json!({
                "email": { "type": "string", "question": "q?" }
            });
            let errors = validate(&schema, &json!(1)).unwrap_err();
            assert_eq!(errors.len(), 2);
            assert!(errors.contains(&SchemaError::ForceNotBoolean));
        }
    }
}
