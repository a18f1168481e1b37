//! Engine configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ELICIT_` prefix and nested values use underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use elicit::config::EngineConfig;
//!
//! let config = EngineConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Extracting with {}", config.model);
//! ```

mod error;

pub use error::{ConfigError, ValidationError};

use serde::Deserialize;
use std::time::Duration;

use crate::ports::{DEFAULT_EXTRACT_MODEL, DEFAULT_EXTRACT_PROMPT, DEFAULT_EXTRACT_TIMEOUT_MS};

/// Extraction engine configuration
///
/// Every field has a working default, so [`EngineConfig::load()`] succeeds
/// from an empty environment and hosts only override what they need.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Model the extraction call runs on
    #[serde(default = "default_model")]
    pub model: String,

    /// Prompt template for the extraction call
    #[serde(default = "default_extract_prompt")]
    pub extract_prompt: String,

    /// Prompt template for batch-mode question injection
    #[serde(default = "default_add_questions_prompt")]
    pub add_questions_prompt: String,

    /// Extraction call timeout in milliseconds
    #[serde(default = "default_extract_timeout_ms")]
    pub extract_timeout_ms: u64,

    /// Question rounds before a session is aborted; unset means unlimited
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ELICIT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into the typed configuration struct
    ///
    /// # Environment Variable Format
    ///
    /// - `ELICIT__MODEL=gpt-4o-mini` -> `model = gpt-4o-mini`
    /// - `ELICIT__EXTRACT_TIMEOUT_MS=5000` -> `extract_timeout_ms = 5000`
    /// - `ELICIT__MAX_ROUNDS=3` -> `max_rounds = Some(3)`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ELICIT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("MODEL"));
        }
        if self.extract_prompt.trim().is_empty() {
            return Err(ValidationError::MissingRequired("EXTRACT_PROMPT"));
        }
        if self.add_questions_prompt.trim().is_empty() {
            return Err(ValidationError::MissingRequired("ADD_QUESTIONS_PROMPT"));
        }
        if self.extract_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_rounds == Some(0) {
            return Err(ValidationError::InvalidRoundLimit);
        }
        Ok(())
    }

    /// Get the extraction timeout as a Duration
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_millis(self.extract_timeout_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            extract_prompt: default_extract_prompt(),
            add_questions_prompt: default_add_questions_prompt(),
            extract_timeout_ms: default_extract_timeout_ms(),
            max_rounds: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_EXTRACT_MODEL.to_string()
}

fn default_extract_prompt() -> String {
    DEFAULT_EXTRACT_PROMPT.to_string()
}

fn default_add_questions_prompt() -> String {
    "elicit:add_questions".to_string()
}

fn default_extract_timeout_ms() -> u64 {
    DEFAULT_EXTRACT_TIMEOUT_MS
}
