//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `model` - Extraction model implementations (scripted, for testing)
//! - `host` - Host bridge implementations (in-memory, for testing)

pub mod host;
pub mod model;

pub use host::{InMemoryHost, PromptAugmentation};
pub use model::{ScriptedError, ScriptedModel, ScriptedResponse};
