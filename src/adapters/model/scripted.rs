//! Scripted extraction model for testing.
//!
//! Provides a configurable implementation of the ExtractionModel port,
//! allowing tests to run without calling a real language model.
//!
//! # Features
//!
//! - Pre-configured raw outputs (consumed in order)
//! - Error injection for containment testing
//! - Simulated delays
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let model = ScriptedModel::new()
//!     .with_output(r#"{"email": "a@b.com"}"#)
//!     .with_error(ScriptedError::Timeout { timeout_ms: 10_000 });
//!
//! let raw = model.extract(request).await?;
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{ExtractionModel, ExtractionModelError, ExtractionRequest};

/// Scripted extraction model for testing.
///
/// Configurable to return specific raw outputs, simulate delays, or
/// inject errors.
#[derive(Debug, Clone)]
pub struct ScriptedModel {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<ExtractionRequest>>>,
}

/// A configured scripted response.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Return this raw model output.
    Output(String),
    /// Return an error.
    Error(ScriptedError),
}

/// Scripted error kinds for testing containment.
#[derive(Debug, Clone)]
pub enum ScriptedError {
    /// Simulate an exceeded time budget.
    Timeout { timeout_ms: u64 },
    /// Simulate the model service being down.
    Unavailable { message: String },
    /// Simulate a rejected request.
    InvalidRequest { message: String },
}

impl From<ScriptedError> for ExtractionModelError {
    fn from(err: ScriptedError) -> Self {
        match err {
            ScriptedError::Timeout { timeout_ms } => ExtractionModelError::timeout(timeout_ms),
            ScriptedError::Unavailable { message } => ExtractionModelError::unavailable(message),
            ScriptedError::InvalidRequest { message } => {
                ExtractionModelError::invalid_request(message)
            }
        }
    }
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedModel {
    /// Creates a new scripted model with an empty queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a raw output to the queue.
    pub fn with_output(self, raw: impl Into<String>) -> Self {
        let mut responses = self.responses.lock().unwrap();
        responses.push_back(ScriptedResponse::Output(raw.into()));
        drop(responses);
        self
    }

    /// Adds an error to the queue.
    pub fn with_error(self, error: ScriptedError) -> Self {
        let mut responses = self.responses.lock().unwrap();
        responses.push_back(ScriptedResponse::Error(error));
        drop(responses);
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of extraction calls made.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<ExtractionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Gets the next response, or an empty object when exhausted.
    fn next_response(&self) -> ScriptedResponse {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedResponse::Output("{}".to_string()))
    }
}

#[async_trait]
impl ExtractionModel for ScriptedModel {
    async fn extract(&self, request: ExtractionRequest) -> Result<String, ExtractionModelError> {
        // Record the call
        self.calls.lock().unwrap().push(request);

        // Simulate delay
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            ScriptedResponse::Output(raw) => Ok(raw),
            ScriptedResponse::Error(err) => Err(err.into()),
        }
    }
}
