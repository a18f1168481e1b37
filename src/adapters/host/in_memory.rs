//! In-memory host bridge implementation for testing.
//!
//! Provides synchronous, deterministic host behavior for unit tests:
//! subscriptions are tracked in a map, dispatched replies and prompt
//! augmentations are captured, and conversation transcripts are seeded
//! by the test.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in
//! production. It uses `.expect()` on lock operations which will panic
//! if locks are poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{ModelHandle, SubscriptionId};
use crate::ports::{HostBridge, HostBridgeError, SessionEvent, TriggerKind};

/// A captured prompt augmentation.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptAugmentation {
    pub model: ModelHandle,
    pub questions: Vec<String>,
    pub prompt: String,
}

/// In-memory host bridge for testing.
///
/// Features:
/// - Subscription tracking with live handles
/// - Reply / augmentation / event capture for assertions
/// - Seedable conversation transcripts
/// - Optional subscribe failure injection
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
///
/// # Example
///
/// ```ignore
/// let host = Arc::new(InMemoryHost::new());
/// host.seed_conversation(model, vec!["my email is a@b.com".to_string()]);
///
/// // ... drive the engine ...
///
/// assert_eq!(host.dispatched_replies(), vec!["What is your email?"]);
/// assert!(host.has_event("completed"));
/// ```
pub struct InMemoryHost {
    subscriptions: RwLock<HashMap<SubscriptionId, TriggerKind>>,
    replies: RwLock<Vec<String>>,
    augmentations: RwLock<Vec<PromptAugmentation>>,
    conversations: RwLock<HashMap<ModelHandle, Vec<String>>>,
    events: RwLock<Vec<SessionEvent>>,
    subscribe_failure: RwLock<Option<String>>,
}

impl InMemoryHost {
    /// Creates a new empty host bridge.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            replies: RwLock::new(Vec::new()),
            augmentations: RwLock::new(Vec::new()),
            conversations: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
            subscribe_failure: RwLock::new(None),
        }
    }

    /// Makes every following `subscribe` call fail with the given message.
    pub fn with_subscribe_failure(self, message: impl Into<String>) -> Self {
        *self
            .subscribe_failure
            .write()
            .expect("InMemoryHost: failure lock poisoned") = Some(message.into());
        self
    }

    // === Test Helpers ===

    /// Seeds the transcript returned for a conversation model.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn seed_conversation(&self, model: ModelHandle, entries: Vec<String>) {
        self.conversations
            .write()
            .expect("InMemoryHost: conversations write lock poisoned")
            .insert(model, entries);
    }

    /// Appends one message to a seeded transcript.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn append_message(&self, model: ModelHandle, entry: impl Into<String>) {
        self.conversations
            .write()
            .expect("InMemoryHost: conversations write lock poisoned")
            .entry(model)
            .or_default()
            .push(entry.into());
    }

    /// Returns the number of live subscriptions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions
            .read()
            .expect("InMemoryHost: subscriptions lock poisoned")
            .len()
    }

    /// Checks whether a subscription handle is still live.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn is_subscribed(&self, subscription: SubscriptionId) -> bool {
        self.subscriptions
            .read()
            .expect("InMemoryHost: subscriptions lock poisoned")
            .contains_key(&subscription)
    }

    /// Returns the trigger kinds of the live subscriptions.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn subscribed_triggers(&self) -> Vec<TriggerKind> {
        self.subscriptions
            .read()
            .expect("InMemoryHost: subscriptions lock poisoned")
            .values()
            .copied()
            .collect()
    }

    /// Returns every dispatched reply, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn dispatched_replies(&self) -> Vec<String> {
        self.replies
            .read()
            .expect("InMemoryHost: replies lock poisoned")
            .clone()
    }

    /// Returns every captured prompt augmentation, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn prompt_augmentations(&self) -> Vec<PromptAugmentation> {
        self.augmentations
            .read()
            .expect("InMemoryHost: augmentations lock poisoned")
            .clone()
    }

    /// Returns all published session events (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn published_events(&self) -> Vec<SessionEvent> {
        self.events
            .read()
            .expect("InMemoryHost: events lock poisoned")
            .clone()
    }

    /// Returns events of a specific kind (`"completed"`, `"rejected"`,
    /// `"aborted"`).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn events_of_kind(&self, kind: &str) -> Vec<SessionEvent> {
        self.published_events()
            .into_iter()
            .filter(|event| event.kind() == kind)
            .collect()
    }

    /// Checks if an event of the given kind was published.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn has_event(&self, kind: &str) -> bool {
        self.published_events()
            .iter()
            .any(|event| event.kind() == kind)
    }

    /// Returns count of published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn event_count(&self) -> usize {
        self.events
            .read()
            .expect("InMemoryHost: events lock poisoned")
            .len()
    }

    /// Clears captured replies, augmentations, and events (for test
    /// isolation). Subscriptions and transcripts are kept.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear(&self) {
        self.replies
            .write()
            .expect("InMemoryHost: replies write lock poisoned")
            .clear();
        self.augmentations
            .write()
            .expect("InMemoryHost: augmentations write lock poisoned")
            .clear();
        self.events
            .write()
            .expect("InMemoryHost: events write lock poisoned")
            .clear();
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostBridge for InMemoryHost {
    async fn subscribe(&self, trigger: TriggerKind) -> Result<SubscriptionId, HostBridgeError> {
        if let Some(message) = self
            .subscribe_failure
            .read()
            .expect("InMemoryHost: failure lock poisoned")
            .clone()
        {
            return Err(HostBridgeError::unavailable(message));
        }

        let subscription = SubscriptionId::new();
        self.subscriptions
            .write()
            .expect("InMemoryHost: subscriptions write lock poisoned")
            .insert(subscription, trigger);
        Ok(subscription)
    }

    async fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), HostBridgeError> {
        let removed = self
            .subscriptions
            .write()
            .expect("InMemoryHost: subscriptions write lock poisoned")
            .remove(&subscription);
        match removed {
            Some(_) => Ok(()),
            None => Err(HostBridgeError::UnknownSubscription),
        }
    }

    async fn dispatch_reply(&self, content: &str) -> Result<(), HostBridgeError> {
        self.replies
            .write()
            .expect("InMemoryHost: replies write lock poisoned")
            .push(content.to_string());
        Ok(())
    }

    async fn augment_prompt(
        &self,
        model: ModelHandle,
        questions: Vec<String>,
        prompt: &str,
    ) -> Result<(), HostBridgeError> {
        self.augmentations
            .write()
            .expect("InMemoryHost: augmentations write lock poisoned")
            .push(PromptAugmentation {
                model,
                questions,
                prompt: prompt.to_string(),
            });
        Ok(())
    }

    async fn recent_conversation(
        &self,
        model: ModelHandle,
    ) -> Result<Vec<String>, HostBridgeError> {
        self.conversations
            .read()
            .expect("InMemoryHost: conversations lock poisoned")
            .get(&model)
            .cloned()
            .ok_or(HostBridgeError::UnknownModel)
    }

    async fn publish(&self, event: SessionEvent) -> Result<(), HostBridgeError> {
        self.events
            .write()
            .expect("InMemoryHost: events write lock poisoned")
            .push(event);
        Ok(())
    }
}
