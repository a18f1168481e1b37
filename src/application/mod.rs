//! Application layer - The engine and its session state.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! The engine consumes host triggers and drives the extraction dialogue;
//! the session module tracks the live session between triggers.

pub mod engine;
pub mod session;

pub use engine::{
    ExtractionEngine, PromptAssembly, StartError, StartPayload, TurnDisposition, UserTurn,
};
pub use session::{ActiveSession, BatchSession, PerTurnSession, SessionCore};
