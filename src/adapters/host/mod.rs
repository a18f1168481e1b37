//! Host bridge adapters.
//!
//! Implementations of the HostBridge port:
//!
//! - `InMemoryHost` - Synchronous, in-process host for testing

mod in_memory;

pub use in_memory::{InMemoryHost, PromptAugmentation};
