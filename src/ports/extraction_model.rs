//! Extraction Model Port - Interface for the language-model extraction call.
//!
//! The host owns the model lifecycle: template lookup, context injection,
//! timeout enforcement, and teardown of the short-lived extraction model.
//! The engine only describes what to extract and consumes the raw text
//! answer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::knowledge::{FieldSpec, FieldType};

/// Default time budget for one extraction call, in milliseconds.
pub const DEFAULT_EXTRACT_TIMEOUT_MS: u64 = 10_000;

/// Default model the extraction call runs on.
pub const DEFAULT_EXTRACT_MODEL: &str = "gpt-3.5-turbo";

/// Default prompt template name for the extraction call.
pub const DEFAULT_EXTRACT_PROMPT: &str = "elicit:extract";

/// Port for running one extraction call against a language model.
#[async_trait]
pub trait ExtractionModel: Send + Sync {
    /// Runs the extraction and returns the model's raw text answer.
    ///
    /// The answer is expected to parse as a JSON object (or array of
    /// objects) of field/value pairs; interpreting it is the caller's
    /// concern. The timeout in the request is enforced by the
    /// implementation, not the caller.
    async fn extract(&self, request: ExtractionRequest) -> Result<String, ExtractionModelError>;
}

/// The model-facing view of one outstanding field.
///
/// Carries only what the model needs to fill the field; resolved values
/// never travel out through a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldContext {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
}

impl FieldContext {
    /// Builds the context view of a field.
    pub fn from_spec(spec: &FieldSpec) -> Self {
        Self {
            name: spec.name().to_string(),
            field_type: spec.field_type(),
            description: spec.description().to_string(),
            allowed: spec.allowed().map(|values| values.to_vec()),
        }
    }
}

/// Request for one extraction call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Outstanding fields the model should try to fill.
    pub fields: Vec<FieldContext>,
    /// Message to extract from.
    pub message: String,
    /// Named system-prompt template the host applies.
    pub prompt: String,
    /// Model the call runs on.
    pub model: String,
    /// Time budget for the call in milliseconds.
    pub timeout_ms: u64,
}

impl ExtractionRequest {
    /// Creates a request with default prompt, model, and timeout.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            message: message.into(),
            prompt: DEFAULT_EXTRACT_PROMPT.to_string(),
            model: DEFAULT_EXTRACT_MODEL.to_string(),
            timeout_ms: DEFAULT_EXTRACT_TIMEOUT_MS,
        }
    }

    /// Adds one field to the request context.
    pub fn with_field(mut self, field: FieldContext) -> Self {
        self.fields.push(field);
        self
    }

    /// Sets the full field context.
    pub fn with_fields(mut self, fields: Vec<FieldContext>) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the prompt template name.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Sets the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the call's time budget in milliseconds.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Extraction call errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionModelError {
    /// The call exceeded its time budget.
    #[error("extraction timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured budget.
        timeout_ms: u64,
    },

    /// The model service cannot be reached.
    #[error("model unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// The request was rejected before running.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ExtractionModelError {
    /// Creates a timeout error.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Returns true if a later identical call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractionModelError::Timeout { .. } | ExtractionModelError::Unavailable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Compile-time check that trait is object-safe
    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn ExtractionModel) {}

    #[test]
    fn request_defaults_match_extraction_contract() {
        let request = ExtractionRequest::new("my email is a@b.com");
        assert_eq!(request.timeout_ms, 10_000);
        assert_eq!(request.prompt, "elicit:extract");
        assert_eq!(request.model, "gpt-3.5-turbo");
        assert!(request.fields.is_empty());
    }

    #[test]
    fn request_builder_works() {
        let field = FieldContext {
            name: "email".to_string(),
            field_type: FieldType::String,
            description: "The user's email address".to_string(),
            allowed: None,
        };
        let request = ExtractionRequest::new("hello")
            .with_field(field.clone())
            .with_prompt("custom:extract")
            .with_model("gpt-4o-mini")
            .with_timeout_ms(5_000);

        assert_eq!(request.fields, vec![field]);
        assert_eq!(request.prompt, "custom:extract");
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.timeout_ms, 5_000);
    }

    #[test]
    fn field_context_copies_spec_without_value() {
        let spec = FieldSpec::new(
            "size",
            FieldType::String,
            "T-shirt size",
            "What size do you wear?",
        )
        .unwrap()
        .with_allowed(vec![json!("small"), json!("large")]);

        let context = FieldContext::from_spec(&spec);
        assert_eq!(context.name, "size");
        assert_eq!(context.field_type, FieldType::String);
        assert_eq!(context.allowed, Some(vec![json!("small"), json!("large")]));

        let as_json = serde_json::to_value(&context).unwrap();
        assert_eq!(as_json["type"], json!("string"));
        assert!(as_json.get("value").is_none());
    }

    #[test]
    fn error_retryable_classification() {
        assert!(ExtractionModelError::timeout(10_000).is_retryable());
        assert!(ExtractionModelError::unavailable("down").is_retryable());
        assert!(!ExtractionModelError::invalid_request("no fields").is_retryable());
    }

    #[test]
    fn error_displays_correctly() {
        let err = ExtractionModelError::timeout(10_000);
        assert_eq!(err.to_string(), "extraction timed out after 10000ms");

        let err = ExtractionModelError::unavailable("connection refused");
        assert_eq!(err.to_string(), "model unavailable: connection refused");
    }
}
