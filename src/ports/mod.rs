//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Model Ports
//!
//! - `ExtractionModel` - Port for the language-model extraction call
//!
//! ## Host Ports
//!
//! - `HostBridge` - Triggers, question dispatch, prompt augmentation,
//!   and lifecycle notifications from the embedding conversation host

mod extraction_model;
mod host_bridge;

pub use extraction_model::{
    ExtractionModel, ExtractionModelError, ExtractionRequest, FieldContext,
    DEFAULT_EXTRACT_MODEL, DEFAULT_EXTRACT_PROMPT, DEFAULT_EXTRACT_TIMEOUT_MS,
};
pub use host_bridge::{
    AbortReason, HostBridge, HostBridgeError, SessionEvent, TriggerKind,
};
