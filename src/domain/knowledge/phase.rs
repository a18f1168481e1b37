//! Session phase machine and operating mode.
//!
//! Defines the lifecycle phases of an extraction session and the valid
//! transitions between them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// The lifecycle phase of an extraction session.
///
/// Sessions move through these phases from start to teardown:
/// - `Idle`: no session running
/// - `AwaitingInput`: subscribed, waiting for the next qualifying trigger
/// - `Processing`: merging a turn, possibly suspended on the model call
/// - `Complete`: every field resolved, completion published
/// - `Aborted`: torn down before completion (round limit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No extraction in flight.
    #[default]
    Idle,

    /// Session active, waiting for the host to deliver a trigger.
    AwaitingInput,

    /// A delivered turn is being merged.
    Processing,

    /// All requested values extracted, session torn down.
    Complete,

    /// Session torn down before completion.
    Aborted,
}

impl SessionPhase {
    /// Returns true while a session holds a record and a subscription.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::AwaitingInput | Self::Processing)
    }

    /// Returns true if a host trigger may start a turn in this phase.
    pub fn accepts_trigger(&self) -> bool {
        matches!(self, Self::AwaitingInput)
    }

    /// Returns true if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }
}

impl StateMachine for SessionPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            // Accepted start subscribes and waits for the first trigger
            (Idle, AwaitingInput) |
            // Qualifying trigger begins a turn
            (AwaitingInput, Processing) |
            // Turn merged, fields still outstanding
            (Processing, AwaitingInput) |
            // Turn merged, record complete
            (Processing, Complete) |
            // Round limit reached without completion
            (Processing, Aborted)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionPhase::*;
        match self {
            Idle => vec![AwaitingInput],
            AwaitingInput => vec![Processing],
            Processing => vec![AwaitingInput, Complete, Aborted],
            Complete => vec![],
            Aborted => vec![],
        }
    }
}

/// How a session folds its questions into the dialogue. Fixed at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One question per user turn, answering in place of the host's
    /// default flow.
    PerTurn,

    /// All outstanding questions folded into the prompt the host is
    /// assembling.
    Batch,
}

impl Mode {
    /// Maps the start request's force flag: forcing the user to answer
    /// means asking one question per turn.
    pub fn from_force_flag(force: bool) -> Self {
        if force {
            Mode::PerTurn
        } else {
            Mode::Batch
        }
    }
}

/// The subtype carried by a prompt-assembly trigger.
///
/// Only chat-style assemblies fold questions in; every other subtype
/// passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PromptAssemblyKind {
    Chat,
    ForceQuestionsAndChat,
    Other(String),
}

impl PromptAssemblyKind {
    /// Parses a host subtype string.
    pub fn parse(kind: &str) -> Self {
        match kind {
            "chat" => Self::Chat,
            "force questions and chat" => Self::ForceQuestionsAndChat,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true if this assembly kind should receive questions.
    pub fn qualifies(&self) -> bool {
        matches!(self, Self::Chat | Self::ForceQuestionsAndChat)
    }
}

impl fmt::Display for PromptAssemblyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::ForceQuestionsAndChat => write!(f, "force questions and chat"),
            Self::Other(kind) => write!(f, "{}", kind),
        }
    }
}
