//! Extraction model adapters.
//!
//! Implementations of the ExtractionModel port:
//!
//! - `ScriptedModel` - Configurable scripted model for testing

mod scripted;

pub use scripted::{ScriptedError, ScriptedModel, ScriptedResponse};
