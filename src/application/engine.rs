//! ExtractionEngine - Drives one knowledge-elicitation dialogue.
//!
//! The engine owns the single-session guard and the live session state,
//! validates start requests, and processes host triggers: each turn runs
//! one extraction call, merges the output into the record, and either
//! completes the session or issues the next question round.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::application::session::ActiveSession;
use crate::config::EngineConfig;
use crate::domain::foundation::{ModelHandle, SessionId, Timestamp};
use crate::domain::knowledge::{
    merge_response, validate, FieldSpec, KnowledgeRecord, Mode, PromptAssemblyKind, SchemaError,
    SessionPhase,
};
use crate::ports::{
    AbortReason, ExtractionModel, ExtractionRequest, FieldContext, HostBridge, HostBridgeError,
    SessionEvent, TriggerKind,
};

/// How the engine wants the host to continue after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDisposition {
    /// The engine consumed the turn; the host suppresses its default flow.
    Handled,
    /// The host proceeds with its normal flow.
    PassThrough,
}

/// Start request, shaped like the host's start event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct StartPayload {
    /// The requested-knowledge schema, validated before use.
    #[serde(default)]
    pub requested_knowledge: Value,
    /// Mode selector; must be exactly `true` (per-turn) or `false` (batch).
    #[serde(default)]
    pub force: Value,
}

/// A user-authored turn, delivered in per-turn mode.
#[derive(Debug, Clone, Deserialize)]
pub struct UserTurn {
    /// The message text.
    pub value: String,
}

impl UserTurn {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A prompt-assembly trigger, delivered in batch mode.
#[derive(Debug, Clone)]
pub struct PromptAssembly {
    /// The conversation model whose prompt is being assembled.
    pub model: ModelHandle,
    /// The assembly subtype.
    pub kind: PromptAssemblyKind,
}

impl PromptAssembly {
    pub fn new(model: ModelHandle, kind: PromptAssemblyKind) -> Self {
        Self { model, kind }
    }

    /// Builds the trigger from the host's raw subtype string.
    pub fn from_subtype(model: ModelHandle, subtype: &str) -> Self {
        Self {
            model,
            kind: PromptAssemblyKind::parse(subtype),
        }
    }
}

/// Error type for starting sessions
#[derive(Debug)]
pub enum StartError {
    /// An extraction session is already live on this engine
    SessionInUse,
    /// The start request failed schema validation
    Invalid(Vec<SchemaError>),
    /// The host could not register the trigger subscription
    Host(HostBridgeError),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::SessionInUse => write!(f, "Extraction already in use"),
            StartError::Invalid(errors) => {
                let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "Schema validation failed: {}", rendered.join("; "))
            }
            StartError::Host(err) => write!(f, "Host error: {}", err),
        }
    }
}

impl std::error::Error for StartError {}

impl From<HostBridgeError> for StartError {
    fn from(err: HostBridgeError) -> Self {
        StartError::Host(err)
    }
}

/// The extraction engine: one live session at a time, driven by host
/// triggers.
///
/// The host is expected to await each entry point before delivering the
/// next trigger; the engine's `&mut self` receivers encode that contract.
/// Separate engine values give separate hosts (or conversations) fully
/// isolated sessions.
pub struct ExtractionEngine<M: ?Sized + ExtractionModel> {
    model: Arc<M>,
    host: Arc<dyn HostBridge>,
    config: EngineConfig,
    session: Option<ActiveSession>,
}

impl<M: ?Sized + ExtractionModel> ExtractionEngine<M> {
    pub fn new(model: Arc<M>, host: Arc<dyn HostBridge>, config: EngineConfig) -> Self {
        Self {
            model,
            host,
            config,
            session: None,
        }
    }

    /// True while a session is live on this engine.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// The live session's id, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|session| session.id())
    }

    /// The live session's phase, `Idle` when none.
    pub fn phase(&self) -> SessionPhase {
        self.session
            .as_ref()
            .map(|session| session.phase())
            .unwrap_or_default()
    }

    /// The live session's mode, if any.
    pub fn mode(&self) -> Option<Mode> {
        self.session.as_ref().map(|session| session.mode())
    }

    /// Starts a session from a host start payload.
    ///
    /// Rejections (live session, schema defects) are surfaced both as the
    /// returned error and as a `SessionEvent::Rejected` notification.
    pub async fn start(&mut self, payload: StartPayload) -> Result<SessionId, StartError> {
        // 1. Single-session guard, checked before any schema validation
        if self.session.is_some() {
            warn!("Start requested while an extraction session is live; rejecting");
            self.publish_rejection(vec![StartError::SessionInUse.to_string()])
                .await;
            return Err(StartError::SessionInUse);
        }

        // 2. Validate the requested knowledge with full error accumulation
        let (record, mode) = match validate(&payload.requested_knowledge, &payload.force) {
            Ok(validated) => validated,
            Err(errors) => {
                warn!(errors = errors.len(), "Start request failed schema validation");
                self.publish_rejection(errors.iter().map(ToString::to_string).collect())
                    .await;
                return Err(StartError::Invalid(errors));
            }
        };

        self.activate(record, mode).await
    }

    /// Starts a session from already-typed fields.
    pub async fn start_with_fields(
        &mut self,
        fields: Vec<FieldSpec>,
        mode: Mode,
    ) -> Result<SessionId, StartError> {
        if self.session.is_some() {
            warn!("Start requested while an extraction session is live; rejecting");
            self.publish_rejection(vec![StartError::SessionInUse.to_string()])
                .await;
            return Err(StartError::SessionInUse);
        }

        let record = match KnowledgeRecord::from_fields(fields) {
            Ok(record) => record,
            Err(error) => {
                warn!(error = %error, "Start request rejected");
                self.publish_rejection(vec![error.to_string()]).await;
                return Err(StartError::Invalid(vec![error]));
            }
        };

        self.activate(record, mode).await
    }

    /// Processes a user turn. Per-turn sessions only.
    pub async fn handle_user_turn(&mut self, turn: UserTurn) -> TurnDisposition {
        // 1. Only a live per-turn session consumes user turns
        let Some(ActiveSession::PerTurn(session)) = self.session.as_mut() else {
            debug!("User turn without a live per-turn session; ignoring");
            return TurnDisposition::PassThrough;
        };

        // 2. Drop triggers delivered while a turn is still processing
        if !session.core_mut().begin_processing() {
            debug!(session = %session.core().id(), "User turn while processing; dropped");
            return TurnDisposition::PassThrough;
        }

        // 3. Extract from the carried message and merge into the record
        Self::extract_and_merge(
            self.model.as_ref(),
            &self.config,
            session.core_mut().record_mut(),
            &turn.value,
        )
        .await;

        // 4. Completion tears the session down
        if session.core().record().is_complete() {
            session.core_mut().complete();
            self.finish_completed().await;
            return TurnDisposition::PassThrough;
        }

        // 5. An exhausted round limit aborts instead of asking again
        if session.core().round_limit_reached(self.config.max_rounds) {
            session.core_mut().abort();
            self.finish_aborted(AbortReason::RoundLimitReached).await;
            return TurnDisposition::PassThrough;
        }

        // 6. Ask the first outstanding question; the turn is handled
        let question = session.next_question();
        session.core_mut().note_round_issued();
        session.core_mut().await_input();

        if let Some(question) = question {
            if let Err(err) = self.host.dispatch_reply(&question).await {
                warn!(error = %err, "Failed to dispatch next question");
            }
        }
        TurnDisposition::Handled
    }

    /// Processes a prompt-assembly trigger. Batch sessions only.
    pub async fn handle_prompt_assembly(&mut self, trigger: PromptAssembly) -> TurnDisposition {
        // 1. Only a live batch session rides prompt assembly
        let Some(ActiveSession::Batch(session)) = self.session.as_mut() else {
            debug!("Prompt assembly without a live batch session; ignoring");
            return TurnDisposition::PassThrough;
        };

        // 2. Only chat-bearing assembly subtypes carry a user turn
        if !trigger.kind.qualifies() {
            debug!(kind = %trigger.kind, "Prompt assembly subtype ignored");
            return TurnDisposition::PassThrough;
        }

        // 3. Drop triggers delivered while a turn is still processing
        if !session.core_mut().begin_processing() {
            debug!(session = %session.core().id(), "Prompt assembly while processing; dropped");
            return TurnDisposition::PassThrough;
        }

        // 4. The latest user message is the last transcript entry
        match self.host.recent_conversation(trigger.model).await {
            Ok(transcript) => match transcript.last() {
                Some(message) => {
                    Self::extract_and_merge(
                        self.model.as_ref(),
                        &self.config,
                        session.core_mut().record_mut(),
                        message,
                    )
                    .await
                }
                None => debug!("Conversation transcript empty; nothing to extract"),
            },
            Err(err) => warn!(error = %err, "Failed to read recent conversation"),
        }

        // 5. Completion tears the session down
        if session.core().record().is_complete() {
            session.core_mut().complete();
            self.finish_completed().await;
            return TurnDisposition::PassThrough;
        }

        // 6. An exhausted round limit aborts instead of asking again
        if session.core().round_limit_reached(self.config.max_rounds) {
            session.core_mut().abort();
            self.finish_aborted(AbortReason::RoundLimitReached).await;
            return TurnDisposition::PassThrough;
        }

        // 7. Stage every outstanding question into the prompt under assembly
        let questions = session.remaining_questions();
        session.core_mut().note_round_issued();
        session.core_mut().await_input();

        if let Err(err) = self
            .host
            .augment_prompt(trigger.model, questions, &self.config.add_questions_prompt)
            .await
        {
            warn!(error = %err, "Failed to augment prompt with outstanding questions");
        }
        TurnDisposition::PassThrough
    }

    /// Stops the live session without publishing an event.
    ///
    /// Any model call the host still has in flight is the host's to
    /// cancel. Idempotent.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        info!(session = %session.id(), "Extraction session stopped");
        if let Err(err) = self.host.unsubscribe(session.subscription()).await {
            warn!(error = %err, "Failed to revoke host subscription");
        }
    }

    /// Subscribes and stores the session, or completes outright when the
    /// record holds no outstanding fields.
    async fn activate(
        &mut self,
        record: KnowledgeRecord,
        mode: Mode,
    ) -> Result<SessionId, StartError> {
        let session_id = SessionId::new();

        // Preset values can resolve the whole record before any dialogue
        if record.is_complete() {
            info!(session = %session_id, "Requested knowledge already resolved; completing immediately");
            if let Err(err) = self
                .host
                .publish(SessionEvent::completed(session_id, record.resolved()))
                .await
            {
                warn!(error = %err, "Failed to publish completion event");
            }
            return Ok(session_id);
        }

        let trigger = TriggerKind::from(mode);
        let subscription = self.host.subscribe(trigger).await?;

        info!(
            session = %session_id,
            mode = ?mode,
            outstanding = record.outstanding().count(),
            "Extraction session started"
        );
        self.session = Some(ActiveSession::activate(session_id, record, mode, subscription));
        Ok(session_id)
    }

    /// Runs one extraction call and merges its output into the record.
    ///
    /// Model and merge failures are contained: logged, record unchanged,
    /// so the same fields are asked again next turn.
    async fn extract_and_merge(
        model: &M,
        config: &EngineConfig,
        record: &mut KnowledgeRecord,
        message: &str,
    ) {
        let fields: Vec<FieldContext> =
            record.outstanding().map(FieldContext::from_spec).collect();
        let request = ExtractionRequest::new(message)
            .with_fields(fields)
            .with_prompt(config.extract_prompt.clone())
            .with_model(config.model.clone())
            .with_timeout_ms(config.extract_timeout_ms);

        let raw = match model.extract(request).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "Extraction call failed; fields stay outstanding");
                return;
            }
        };

        match merge_response(record, &raw) {
            Ok(report) => debug!(
                applied = report.applied,
                dropped_null = report.dropped_null,
                dropped_unmatched = report.dropped_unmatched,
                "Merged extraction output"
            ),
            Err(err) => {
                warn!(error = %err, "Extraction output rejected; fields stay outstanding")
            }
        }
    }

    /// Publishes `Completed` exactly once and tears the session down.
    async fn finish_completed(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let session_id = session.id();
        let values = session.record().resolved();
        let elapsed = Timestamp::now().duration_since(&session.core().started_at());
        info!(
            session = %session_id,
            fields = values.len(),
            duration_ms = elapsed.num_milliseconds(),
            "All requested values extracted"
        );
        if let Err(err) = self.host.unsubscribe(session.subscription()).await {
            warn!(error = %err, "Failed to revoke host subscription");
        }
        if let Err(err) = self
            .host
            .publish(SessionEvent::completed(session_id, values))
            .await
        {
            warn!(error = %err, "Failed to publish completion event");
        }
    }

    /// Publishes `Aborted` and tears the session down.
    async fn finish_aborted(&mut self, reason: AbortReason) {
        let Some(session) = self.session.take() else {
            return;
        };
        let session_id = session.id();
        info!(
            session = %session_id,
            reason = ?reason,
            rounds = session.core().rounds_issued(),
            "Extraction session aborted"
        );
        if let Err(err) = self.host.unsubscribe(session.subscription()).await {
            warn!(error = %err, "Failed to revoke host subscription");
        }
        if let Err(err) = self
            .host
            .publish(SessionEvent::aborted(session_id, reason))
            .await
        {
            warn!(error = %err, "Failed to publish abort event");
        }
    }

    async fn publish_rejection(&self, errors: Vec<String>) {
        if let Err(err) = self.host.publish(SessionEvent::rejected(errors)).await {
            warn!(error = %err, "Failed to publish rejection event");
        }
    }
}
