//! Host Bridge Port - Interface to the embedding conversation host.
//!
//! The engine never talks to the user or the chat pipeline directly. It
//! subscribes to host triggers, hands questions back through the host,
//! and publishes lifecycle notifications the host can route to other
//! components.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::{ModelHandle, SessionId, SubscriptionId, Timestamp};
use crate::domain::knowledge::Mode;

/// Host triggers a session can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// A user-authored turn was delivered to the host.
    UserTurn,
    /// The host is assembling the next model prompt.
    PromptAssembly,
}

impl From<Mode> for TriggerKind {
    /// Per-turn sessions intercept user turns; batch sessions ride the
    /// host's prompt assembly.
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::PerTurn => TriggerKind::UserTurn,
            Mode::Batch => TriggerKind::PromptAssembly,
        }
    }
}

/// Why a session ended without completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// The configured question-round limit was reached.
    RoundLimitReached,
}

/// Lifecycle notifications published to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Every requested field holds a validated value.
    Completed {
        session: SessionId,
        values: Map<String, Value>,
        occurred_at: Timestamp,
    },
    /// A start request failed validation.
    Rejected {
        errors: Vec<String>,
        occurred_at: Timestamp,
    },
    /// The session was torn down before completion.
    Aborted {
        session: SessionId,
        reason: AbortReason,
        occurred_at: Timestamp,
    },
}

impl SessionEvent {
    /// Creates a completion event stamped now.
    pub fn completed(session: SessionId, values: Map<String, Value>) -> Self {
        Self::Completed {
            session,
            values,
            occurred_at: Timestamp::now(),
        }
    }

    /// Creates a rejection event stamped now.
    pub fn rejected(errors: Vec<String>) -> Self {
        Self::Rejected {
            errors,
            occurred_at: Timestamp::now(),
        }
    }

    /// Creates an abort event stamped now.
    pub fn aborted(session: SessionId, reason: AbortReason) -> Self {
        Self::Aborted {
            session,
            reason,
            occurred_at: Timestamp::now(),
        }
    }

    /// Event kind name, used for routing and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::Completed { .. } => "completed",
            SessionEvent::Rejected { .. } => "rejected",
            SessionEvent::Aborted { .. } => "aborted",
        }
    }
}

/// Host bridge errors.
#[derive(Debug, thiserror::Error)]
pub enum HostBridgeError {
    /// The subscription handle is not registered.
    #[error("unknown subscription")]
    UnknownSubscription,

    /// The model handle does not name a live conversation model.
    #[error("unknown model handle")]
    UnknownModel,

    /// The host rejected or could not complete the operation.
    #[error("host unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

impl HostBridgeError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Port for everything the engine asks of its host.
///
/// Implementations are expected to deliver triggers one at a time per
/// session; the engine relies on that for its processing guard.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Registers interest in a trigger and returns a revocation handle.
    async fn subscribe(&self, trigger: TriggerKind) -> Result<SubscriptionId, HostBridgeError>;

    /// Revokes a subscription.
    ///
    /// Revocation is keyed by the handle alone; no trigger kind or
    /// callback identity is needed.
    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), HostBridgeError>;

    /// Sends a reply (typically the next question) into the conversation.
    async fn dispatch_reply(&self, content: &str) -> Result<(), HostBridgeError>;

    /// Injects questions into the prompt under assembly.
    ///
    /// The host renders the named template with the questions and applies
    /// it to the given conversation model's pending prompt.
    async fn augment_prompt(
        &self,
        model: ModelHandle,
        questions: Vec<String>,
        prompt: &str,
    ) -> Result<(), HostBridgeError>;

    /// Returns the conversation transcript, oldest first.
    ///
    /// The last entry is the latest user message.
    async fn recent_conversation(&self, model: ModelHandle)
        -> Result<Vec<String>, HostBridgeError>;

    /// Publishes a session lifecycle notification.
    async fn publish(&self, event: SessionEvent) -> Result<(), HostBridgeError>;
}
