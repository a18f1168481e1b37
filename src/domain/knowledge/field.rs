//! Requested-knowledge field definitions.
//!
//! A `FieldSpec` describes one unit of knowledge to collect: the JSON type
//! the value must have, the description handed to the extraction model as
//! context, and the question asked while the value is still missing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// The JSON value types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    /// Returns all supported types in schema-name order.
    pub fn all() -> &'static [FieldType] {
        &[
            FieldType::String,
            FieldType::Number,
            FieldType::Boolean,
            FieldType::Object,
            FieldType::Array,
        ]
    }

    /// Parses a schema type name, returning None for unsupported names.
    pub fn parse(name: &str) -> Option<FieldType> {
        match name {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "boolean" => Some(FieldType::Boolean),
            "object" => Some(FieldType::Object),
            "array" => Some(FieldType::Array),
            _ => None,
        }
    }

    /// Returns the schema name for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }

    /// Returns true if the JSON value belongs to this type.
    ///
    /// Any JSON number counts as `Number`. `null` belongs to no type;
    /// null handling is the merge layer's concern, not a type match.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One requested-knowledge entry.
///
/// The value stays absent until the field is resolved. After construction
/// the only mutation path is `KnowledgeRecord::assign`, which enforces the
/// declared type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    name: String,
    #[serde(rename = "type")]
    field_type: FieldType,
    description: String,
    question: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    allowed: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl FieldSpec {
    /// Creates an outstanding field, rejecting empty name, description,
    /// or question.
    pub fn new(
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
        question: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let description = description.into();
        let question = question.into();

        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if description.is_empty() {
            return Err(ValidationError::empty_field("description"));
        }
        if question.is_empty() {
            return Err(ValidationError::empty_field("question"));
        }

        Ok(Self {
            name,
            field_type,
            description,
            question,
            allowed: None,
            value: None,
        })
    }

    /// Restricts the field to an ordered set of allowed values.
    ///
    /// The set is advisory context for the extraction model; assignment
    /// does not enforce membership.
    pub fn with_allowed(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Pre-resolves the field, for schemas that arrive partially filled.
    ///
    /// The value must match the declared type.
    pub fn with_value(mut self, value: Value) -> Result<Self, ValidationError> {
        if !self.field_type.matches(&value) {
            return Err(ValidationError::invalid_format(
                self.name.clone(),
                format!("value does not match declared type '{}'", self.field_type),
            ));
        }
        self.value = Some(value);
        Ok(self)
    }

    /// Returns the field name (the record key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared value type.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the description given to the extraction model.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the question asked while the field is outstanding.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Returns the allowed-value set, if declared.
    pub fn allowed(&self) -> Option<&[Value]> {
        self.allowed.as_deref()
    }

    /// Returns the resolved value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Returns true if the field has no resolved value yet.
    pub fn is_outstanding(&self) -> bool {
        self.value.is_none()
    }

    // Only the record mutates resolved values; type checking happens there.
    pub(crate) fn set_value(&mut self, value: Value) {
        self.value = Some(value);
    }
}
