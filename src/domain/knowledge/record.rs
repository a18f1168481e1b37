//! The extraction record: requested fields plus their resolved values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::field::FieldSpec;
use super::schema::SchemaError;

/// Insertion-ordered collection of requested-knowledge fields, unique by
/// name.
///
/// Owned by the active session for its lifetime: created when a start
/// request is accepted, mutated only through `assign`, dropped on
/// completion or stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeRecord {
    fields: Vec<FieldSpec>,
}

impl KnowledgeRecord {
    /// Builds a record from already-validated fields, rejecting duplicate
    /// names.
    pub fn from_fields(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(SchemaError::DuplicateField {
                    key: field.name().to_string(),
                });
            }
        }
        Ok(Self { fields })
    }

    /// Returns all fields in insertion order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Returns the field with the given name, if present.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns the fields with no resolved value, in insertion order.
    pub fn outstanding(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_outstanding())
    }

    /// Returns the questions of the outstanding fields, in insertion order.
    pub fn questions(&self) -> Vec<&str> {
        self.outstanding().map(|f| f.question()).collect()
    }

    /// Returns true when every field holds a resolved value.
    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|f| !f.is_outstanding())
    }

    /// Sets a value on the named field and returns true, iff the field
    /// exists, is still outstanding, and the value matches its declared
    /// type. Anything else is skipped and returns false.
    ///
    /// Refusing already-resolved fields is what makes replayed model
    /// output a no-op.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|f| f.name() == name) {
            Some(field) if field.is_outstanding() && field.field_type().matches(&value) => {
                field.set_value(value);
                true
            }
            _ => false,
        }
    }

    /// Returns the resolved field-name to value map, in insertion order.
    pub fn resolved(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|f| f.value().map(|v| (f.name().to_string(), v.clone())))
            .collect()
    }

    /// Returns the number of fields in the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Normalizes an explicit "no value" answer.
///
/// JSON `null` and the literal string `"null"` both mean the model had no
/// answer for the field. The result is distinct from "never attempted":
/// normalized-away values are filtered before merging, so the field simply
/// stays outstanding.
pub fn normalize_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s == "null" => None,
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge::FieldType;
    use serde_json::json;

    fn two_field_record() -> KnowledgeRecord {
        KnowledgeRecord::from_fields(vec![
            FieldSpec::new(
                "email",
                FieldType::String,
                "The user's email address",
                "What is your email address?",
            )
            .unwrap(),
            FieldSpec::new(
                "age",
                FieldType::Number,
                "The user's age in years",
                "How old are you?",
            )
            .unwrap(),
        ])
        .unwrap()
    }

    mod construction {
        use super::*;

        #[test]
        fn from_fields_preserves_insertion_order() {
            let record = two_field_record();
            let names: Vec<&str> = record.fields().iter().map(|f| f.name()).collect();
            assert_eq!(names, vec!["email", "age"]);
        }

        #[test]
        fn from_fields_rejects_duplicate_names() {
            let result = KnowledgeRecord::from_fields(vec![
                FieldSpec::new("email", FieldType::String, "desc", "q?").unwrap(),
                FieldSpec::new("email", FieldType::Number, "other desc", "other q?").unwrap(),
            ]);
            assert_eq!(
                result,
                Err(SchemaError::DuplicateField {
                    key: "email".to_string()
                })
            );
        }

        #[test]
        fn empty_record_is_complete() {
            let record = KnowledgeRecord::from_fields(vec![]).unwrap();
            assert!(record.is_empty());
            assert!(record.is_complete());
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn outstanding_returns_unresolved_fields_in_order() {
            let record = two_field_record();
            let names: Vec<&str> = record.outstanding().map(|f| f.name()).collect();
            assert_eq!(names, vec!["email", "age"]);
        }

        #[test]
        fn outstanding_skips_resolved_fields() {
            let mut record = two_field_record();
            assert!(record.assign("email", json!("a@b.com")));

            let names: Vec<&str> = record.outstanding().map(|f| f.name()).collect();
            assert_eq!(names, vec!["age"]);
        }

        #[test]
        fn questions_follow_outstanding_order() {
            let record = two_field_record();
            assert_eq!(
                record.questions(),
                vec!["What is your email address?", "How old are you?"]
            );
        }

        #[test]
        fn is_complete_only_when_every_field_resolved() {
            let mut record = two_field_record();
            assert!(!record.is_complete());

            record.assign("email", json!("a@b.com"));
            assert!(!record.is_complete());

            record.assign("age", json!(30));
            assert!(record.is_complete());
        }

        #[test]
        fn prefilled_field_is_not_outstanding() {
            let record = KnowledgeRecord::from_fields(vec![
                FieldSpec::new("email", FieldType::String, "desc", "q?")
                    .unwrap()
                    .with_value(json!("a@b.com"))
                    .unwrap(),
                FieldSpec::new("age", FieldType::Number, "desc", "q?").unwrap(),
            ])
            .unwrap();
            assert_eq!(record.questions(), vec!["q?"]);
            let names: Vec<&str> = record.outstanding().map(|f| f.name()).collect();
            assert_eq!(names, vec!["age"]);
        }
    }

    mod assign {
        use super::*;

        #[test]
        fn assign_sets_matching_value() {
            let mut record = two_field_record();
            assert!(record.assign("email", json!("a@b.com")));
            assert_eq!(record.get("email").unwrap().value(), Some(&json!("a@b.com")));
        }

        #[test]
        fn assign_skips_unknown_field() {
            let mut record = two_field_record();
            assert!(!record.assign("nickname", json!("sam")));
            assert!(!record.is_complete());
        }

        #[test]
        fn assign_skips_type_mismatch() {
            let mut record = two_field_record();
            assert!(!record.assign("age", json!("thirty")));
            assert!(record.get("age").unwrap().is_outstanding());
        }

        #[test]
        fn assign_never_clobbers_resolved_value() {
            let mut record = two_field_record();
            assert!(record.assign("email", json!("first@b.com")));
            assert!(!record.assign("email", json!("second@b.com")));
            assert_eq!(
                record.get("email").unwrap().value(),
                Some(&json!("first@b.com"))
            );
        }

        #[test]
        fn assign_rejects_null() {
            let mut record = two_field_record();
            assert!(!record.assign("email", Value::Null));
            assert!(record.get("email").unwrap().is_outstanding());
        }
    }

    mod resolved {
        use super::*;

        #[test]
        fn resolved_returns_only_filled_fields() {
            let mut record = two_field_record();
            record.assign("age", json!(30));

            let resolved = record.resolved();
            assert_eq!(resolved.len(), 1);
            assert_eq!(resolved.get("age"), Some(&json!(30)));
        }

        #[test]
        fn resolved_preserves_insertion_order_when_complete() {
            let mut record = two_field_record();
            record.assign("age", json!(30));
            record.assign("email", json!("a@b.com"));

            let resolved = record.resolved();
            let keys: Vec<&String> = resolved.keys().collect();
            assert_eq!(keys, vec!["email", "age"]);
        }
    }

    mod normalize {
        use super::*;

        #[test]
        fn json_null_normalizes_to_none() {
            assert_eq!(normalize_null(Value::Null), None);
        }

        #[test]
        fn literal_null_string_normalizes_to_none() {
            assert_eq!(normalize_null(json!("null")), None);
        }

        #[test]
        fn other_strings_pass_through() {
            assert_eq!(normalize_null(json!("NULL")), Some(json!("NULL")));
            assert_eq!(normalize_null(json!("nullable")), Some(json!("nullable")));
        }

        #[test]
        fn ordinary_values_pass_through() {
            assert_eq!(normalize_null(json!(0)), Some(json!(0)));
            assert_eq!(normalize_null(json!(false)), Some(json!(false)));
            assert_eq!(normalize_null(json!("")), Some(json!("")));
        }
    }

    #[test]
    fn record_serde_roundtrip_preserves_values() {
        let mut record = two_field_record();
        record.assign("email", json!("a@b.com"));

        let json = serde_json::to_string(&record).unwrap();
        let restored: KnowledgeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }
}
