//! ActiveSession - Per-session state for a running extraction.
//!
//! The session owns the knowledge record, the host subscription handle,
//! and the phase machine for exactly one extraction dialogue. The two
//! dialogue modes are separate types behind one enum, so each turn
//! handler works with its own variant and there are no mode conditionals
//! in the turn logic.

use crate::domain::foundation::{SessionId, StateMachine, SubscriptionId, Timestamp};
use crate::domain::knowledge::{KnowledgeRecord, Mode, SessionPhase};
use crate::ports::TriggerKind;

/// State shared by both session variants.
#[derive(Debug)]
pub struct SessionCore {
    id: SessionId,
    record: KnowledgeRecord,
    subscription: SubscriptionId,
    phase: SessionPhase,
    rounds_issued: u32,
    started_at: Timestamp,
}

impl SessionCore {
    fn new(id: SessionId, record: KnowledgeRecord, subscription: SubscriptionId) -> Self {
        Self {
            id,
            record,
            subscription,
            phase: SessionPhase::AwaitingInput,
            rounds_issued: 0,
            started_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn record(&self) -> &KnowledgeRecord {
        &self.record
    }

    pub(crate) fn record_mut(&mut self) -> &mut KnowledgeRecord {
        &mut self.record
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Question rounds issued so far.
    pub fn rounds_issued(&self) -> u32 {
        self.rounds_issued
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Attempts the `AwaitingInput -> Processing` transition.
    ///
    /// Returns false when the session is not awaiting input, which is how
    /// a trigger delivered at the wrong moment gets dropped.
    pub(crate) fn begin_processing(&mut self) -> bool {
        match self.phase.transition_to(SessionPhase::Processing) {
            Ok(next) => {
                self.phase = next;
                true
            }
            Err(_) => false,
        }
    }

    /// Returns to `AwaitingInput` after a turn that left fields outstanding.
    ///
    /// Only called from `Processing`.
    pub(crate) fn await_input(&mut self) {
        self.phase = SessionPhase::AwaitingInput;
    }

    /// Enters the terminal `Complete` phase. Only called from `Processing`.
    pub(crate) fn complete(&mut self) {
        self.phase = SessionPhase::Complete;
    }

    /// Enters the terminal `Aborted` phase. Only called from `Processing`.
    pub(crate) fn abort(&mut self) {
        self.phase = SessionPhase::Aborted;
    }

    /// Counts one issued question round.
    pub(crate) fn note_round_issued(&mut self) {
        self.rounds_issued += 1;
    }

    /// True once `limit` question rounds have been issued without completion.
    pub(crate) fn round_limit_reached(&self, limit: Option<u32>) -> bool {
        limit.is_some_and(|rounds| self.rounds_issued >= rounds)
    }
}

/// A session that intercepts user turns and asks one question at a time.
#[derive(Debug)]
pub struct PerTurnSession {
    core: SessionCore,
}

impl PerTurnSession {
    /// The single question dispatched this round: the first outstanding one.
    pub fn next_question(&self) -> Option<String> {
        self.core
            .record
            .outstanding()
            .next()
            .map(|field| field.question().to_string())
    }

    pub(crate) fn core(&self) -> &SessionCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

/// A session that rides the host's prompt assembly and stages all
/// questions at once.
#[derive(Debug)]
pub struct BatchSession {
    core: SessionCore,
}

impl BatchSession {
    /// Every outstanding question, insertion order.
    pub fn remaining_questions(&self) -> Vec<String> {
        self.core
            .record
            .questions()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub(crate) fn core(&self) -> &SessionCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }
}

/// One running extraction session, in whichever mode it was started.
#[derive(Debug)]
pub enum ActiveSession {
    PerTurn(PerTurnSession),
    Batch(BatchSession),
}

impl ActiveSession {
    /// Builds the session variant for `mode`, already awaiting input.
    pub(crate) fn activate(
        id: SessionId,
        record: KnowledgeRecord,
        mode: Mode,
        subscription: SubscriptionId,
    ) -> Self {
        let core = SessionCore::new(id, record, subscription);
        match mode {
            Mode::PerTurn => ActiveSession::PerTurn(PerTurnSession { core }),
            Mode::Batch => ActiveSession::Batch(BatchSession { core }),
        }
    }

    pub fn core(&self) -> &SessionCore {
        match self {
            ActiveSession::PerTurn(session) => session.core(),
            ActiveSession::Batch(session) => session.core(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.core().id()
    }

    pub fn phase(&self) -> SessionPhase {
        self.core().phase()
    }

    pub fn record(&self) -> &KnowledgeRecord {
        self.core().record()
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.core().subscription()
    }

    pub fn mode(&self) -> Mode {
        match self {
            ActiveSession::PerTurn(_) => Mode::PerTurn,
            ActiveSession::Batch(_) => Mode::Batch,
        }
    }

    /// The host trigger this session listens on.
    pub fn trigger(&self) -> TriggerKind {
        TriggerKind::from(self.mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::knowledge::{FieldSpec, FieldType};

    fn two_field_record() -> KnowledgeRecord {
        KnowledgeRecord::from_fields(vec![
            FieldSpec::new("email", FieldType::String, "Email address", "What is your email?")
                .unwrap(),
            FieldSpec::new("age", FieldType::Number, "Age in years", "How old are you?")
                .unwrap(),
        ])
        .unwrap()
    }

    fn activate(mode: Mode) -> ActiveSession {
        ActiveSession::activate(
            SessionId::new(),
            two_field_record(),
            mode,
            SubscriptionId::new(),
        )
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn activation_starts_awaiting_input() {
            let session = activate(Mode::PerTurn);
            assert_eq!(session.phase(), SessionPhase::AwaitingInput);
            assert_eq!(session.core().rounds_issued(), 0);
        }

        #[test]
        fn mode_selects_the_variant_and_trigger() {
            let per_turn = activate(Mode::PerTurn);
            assert!(matches!(per_turn, ActiveSession::PerTurn(_)));
            assert_eq!(per_turn.trigger(), TriggerKind::UserTurn);

            let batch = activate(Mode::Batch);
            assert!(matches!(batch, ActiveSession::Batch(_)));
            assert_eq!(batch.trigger(), TriggerKind::PromptAssembly);
        }

        #[test]
        fn begin_processing_only_from_awaiting_input() {
            let mut session = activate(Mode::PerTurn);
            let core = match &mut session {
                ActiveSession::PerTurn(s) => s.core_mut(),
                ActiveSession::Batch(s) => s.core_mut(),
            };

            assert!(core.begin_processing());
            assert_eq!(core.phase(), SessionPhase::Processing);

            // A second trigger while processing is dropped
            assert!(!core.begin_processing());

            core.await_input();
            assert!(core.begin_processing());
        }

        #[test]
        fn terminal_phases_are_reached_from_processing() {
            let mut session = activate(Mode::PerTurn);
            let core = match &mut session {
                ActiveSession::PerTurn(s) => s.core_mut(),
                ActiveSession::Batch(s) => s.core_mut(),
            };

            core.begin_processing();
            core.complete();
            assert_eq!(core.phase(), SessionPhase::Complete);
        }
    }

    mod rounds {
        use super::*;

        #[test]
        fn round_counter_tracks_issued_questions() {
            let mut session = activate(Mode::PerTurn);
            let core = match &mut session {
                ActiveSession::PerTurn(s) => s.core_mut(),
                ActiveSession::Batch(s) => s.core_mut(),
            };

            assert!(!core.round_limit_reached(Some(2)));
            core.note_round_issued();
            assert!(!core.round_limit_reached(Some(2)));
            core.note_round_issued();
            assert!(core.round_limit_reached(Some(2)));
        }

        #[test]
        fn no_limit_is_never_reached() {
            let mut session = activate(Mode::Batch);
            let core = match &mut session {
                ActiveSession::PerTurn(s) => s.core_mut(),
                ActiveSession::Batch(s) => s.core_mut(),
            };

            for _ in 0..100 {
                core.note_round_issued();
            }
            assert!(!core.round_limit_reached(None));
        }
    }

    mod questions {
        use super::*;

        #[test]
        fn per_turn_session_offers_first_outstanding_question() {
            let session = match activate(Mode::PerTurn) {
                ActiveSession::PerTurn(s) => s,
                ActiveSession::Batch(_) => unreachable!(),
            };
            assert_eq!(session.next_question().as_deref(), Some("What is your email?"));
        }

        #[test]
        fn batch_session_offers_every_outstanding_question() {
            let session = match activate(Mode::Batch) {
                ActiveSession::Batch(s) => s,
                ActiveSession::PerTurn(_) => unreachable!(),
            };
            assert_eq!(
                session.remaining_questions(),
                vec!["What is your email?".to_string(), "How old are you?".to_string()]
            );
        }

        #[test]
        fn next_question_follows_the_record() {
            let mut session = match activate(Mode::PerTurn) {
                ActiveSession::PerTurn(s) => s,
                ActiveSession::Batch(_) => unreachable!(),
            };
            session
                .core_mut()
                .record_mut()
                .assign("email", serde_json::json!("a@b.com"));

            assert_eq!(session.next_question().as_deref(), Some("How old are you?"));
        }
    }
}
