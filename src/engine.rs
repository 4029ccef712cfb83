// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The host-facing facade.
//!
//! One engine owns one buffer, one registry, one session and one query
//! debouncer, plus the injected provider and presenter. Hosts feed text
//! edits, cursor moves, focus changes and chooser selections in; the engine
//! keeps the session, the chooser and the mention registry in sync and
//! reports what happened through registered notification handlers.
//!
//! Everything here runs on one logical control thread. Providers that
//! complete elsewhere either hand replies back through
//! [`MentionsEngine::provider_results`] or go through the
//! [`crate::runtime`] bridge.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use tracing::{trace, warn};

use crate::chooser::ChooserPresenter;
use crate::config::MentionsConfig;
use crate::model::{
    BufferError, EntityRecord, MentionRange, ResolvedMention, TextBuffer, TextEdit,
};
use crate::provider::{EntityProvider, ProviderReply, ReplyQueue, ReplyRoute, ResultSink};
use crate::query::{QueryAdmission, QueryDebouncer};
use crate::registry::{MentionRegistry, RegistryError, TrimRequest};
use crate::scan::{scan, MentionCandidate};
use crate::session::{
    CancelReason, Effects, MentionSession, SessionEffect, SessionError, SessionPhase,
    SessionPolicies,
};

/// What the engine tells its observers. The counterpart of the original
/// delegate surface, as plain values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineNotification {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    ChooserActivated,
    ChooserDeactivated,
    MentionCreated(ResolvedMention),
    MentionTrimmed(ResolvedMention),
    MentionDeleted(ResolvedMention),
}

pub type NotificationHandler = Box<dyn FnMut(&EngineNotification) + Send>;

pub struct MentionsEngine {
    config: MentionsConfig,
    buffer: TextBuffer,
    registry: MentionRegistry,
    session: MentionSession,
    debouncer: QueryDebouncer,
    provider: Arc<dyn EntityProvider>,
    chooser: Box<dyn ChooserPresenter>,
    replies: ReplyQueue,
    route: Arc<dyn ReplyRoute>,
    observers: Vec<NotificationHandler>,
    focused: bool,
}

impl MentionsEngine {
    /// Build an engine over an empty buffer. The view is assumed focused
    /// until the host says otherwise.
    pub fn new(
        config: MentionsConfig,
        provider: Arc<dyn EntityProvider>,
        chooser: Box<dyn ChooserPresenter>,
    ) -> Self {
        let policies = SessionPolicies {
            resume_after_focus_loss: config.resume_after_focus_loss,
            cancel_when_final_results_empty: config.cancel_when_final_results_empty,
        };
        let registry = MentionRegistry::with_trim_on_tail_deletion(config.trim_on_tail_deletion);
        let replies = ReplyQueue::new();
        let route: Arc<dyn ReplyRoute> = Arc::new(replies.clone());
        Self {
            config,
            buffer: TextBuffer::new(),
            registry,
            session: MentionSession::new(policies),
            debouncer: QueryDebouncer::new(),
            provider,
            chooser,
            replies,
            route,
            observers: Vec::new(),
            focused: true,
        }
    }

    /// Build an engine over pre-existing text (cursor at the end). No scan
    /// runs until the host performs an edit or moves the cursor.
    pub fn with_text(
        config: MentionsConfig,
        provider: Arc<dyn EntityProvider>,
        chooser: Box<dyn ChooserPresenter>,
        text: impl Into<String>,
    ) -> Self {
        let mut engine = Self::new(config, provider, chooser);
        engine.buffer = TextBuffer::with_text(text);
        engine
    }

    /// Register a notification handler. Handlers run on the control thread,
    /// in registration order, after the state they describe is in place.
    pub fn observe(&mut self, handler: NotificationHandler) {
        self.observers.push(handler);
    }

    pub fn text(&self) -> &str {
        self.buffer.text()
    }

    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn config(&self) -> &MentionsConfig {
        &self.config
    }

    pub fn mentions(&self) -> Vec<&ResolvedMention> {
        self.registry.mentions().collect()
    }

    pub fn mention_at(&self, offset: usize) -> Option<&ResolvedMention> {
        self.registry.lookup(offset)
    }

    /// The entities currently offered for selection, if any.
    pub fn presented_entities(&self) -> Option<&[EntityRecord]> {
        self.session.presented_entities()
    }

    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<(), EngineError> {
        let edit = self.buffer.insert(offset, text)?;
        self.after_edit(&edit);
        self.drain_replies();
        Ok(())
    }

    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<(), EngineError> {
        let edit = self.buffer.delete(start, end)?;
        self.after_edit(&edit);
        self.drain_replies();
        Ok(())
    }

    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<(), EngineError> {
        let edit = self.buffer.replace_range(start, end, text)?;
        self.after_edit(&edit);
        self.drain_replies();
        Ok(())
    }

    pub fn set_cursor(&mut self, offset: usize) -> Result<(), EngineError> {
        self.buffer.set_cursor(offset)?;
        self.refresh_session(CancelReason::CursorLeft);
        self.drain_replies();
        Ok(())
    }

    pub fn focus_changed(&mut self, focused: bool) {
        if self.focused == focused {
            return;
        }
        self.focused = focused;
        if !focused {
            let effects = self.session.cancel(CancelReason::FocusLost);
            self.debouncer.reset();
            self.apply_effects(effects);
        } else if let Some(parked) = self.session.suspended_candidate().cloned() {
            let found = scan(&self.buffer, self.buffer.cursor(), &self.registry, &self.config)
                .unwrap_or(None);
            match found {
                Some(candidate) if candidate == parked => {
                    let effects = self.session.resume(candidate);
                    self.apply_effects(effects);
                }
                _ => self.session.discard_suspension(),
            }
        }
        self.drain_replies();
    }

    /// The user picked entry `index` of the presented list.
    pub fn select_entity(&mut self, index: usize) -> Result<(), EngineError> {
        let effects = self.session.selected(index).map_err(EngineError::Selection)?;
        self.apply_effects(effects);
        self.drain_replies();
        Ok(())
    }

    /// Abort the active session without resolving it.
    pub fn cancel_mention(&mut self) {
        let effects = self.session.cancel(CancelReason::HostRequest);
        self.debouncer.reset();
        self.apply_effects(effects);
        self.drain_replies();
    }

    /// Hand a provider result batch to the engine. For hosts that call the
    /// provider themselves; the sink-based flow ends up here as well.
    pub fn provider_results(&mut self, seq: u64, entities: Vec<EntityRecord>, is_final: bool) {
        self.ingest(ProviderReply::Batch {
            seq,
            entities,
            is_final,
        });
        self.drain_replies();
    }

    /// Report a failed query. Recovered as an empty final result set; the
    /// session never crashes on provider trouble.
    pub fn provider_failed(&mut self, seq: u64) {
        self.ingest(ProviderReply::Failure { seq });
        self.drain_replies();
    }

    /// A watchdog decided the query will never answer. Cancels the session
    /// if that query is still the active one.
    pub fn query_timed_out(&mut self, seq: u64) {
        if self.debouncer.admission(seq) == QueryAdmission::Fresh {
            warn!(seq, "entity query timed out");
            let effects = self.session.cancel(CancelReason::ProviderTimeout);
            self.debouncer.reset();
            self.apply_effects(effects);
        }
        self.drain_replies();
    }

    /// Register a mention that was not created interactively, e.g. when
    /// rehydrating a persisted draft. The buffer text under the mention's
    /// range must equal its display name. Does not notify observers.
    pub fn add_mention(&mut self, mention: ResolvedMention) -> Result<(), EngineError> {
        let range = mention.range();
        let covered = self.buffer.slice(range.start(), range.end())?;
        if covered != mention.display_name() {
            return Err(EngineError::MentionTextMismatch {
                range,
                expected: SmolStr::new(mention.display_name()),
                found: covered.to_owned(),
            });
        }
        self.registry.insert(mention).map_err(EngineError::Registry)
    }

    /// Drain provider replies that arrived since the last entry point.
    pub fn pump(&mut self) {
        self.drain_replies();
    }

    pub(crate) fn set_reply_route(&mut self, route: Arc<dyn ReplyRoute>) {
        self.route = route;
    }

    pub(crate) fn reply_queue(&self) -> ReplyQueue {
        self.replies.clone()
    }

    pub(crate) fn provider_handle(&self) -> Arc<dyn EntityProvider> {
        Arc::clone(&self.provider)
    }

    pub(crate) fn set_provider(&mut self, provider: Arc<dyn EntityProvider>) {
        self.provider = provider;
    }

    fn after_edit(&mut self, edit: &TextEdit) {
        let delta = self.registry.edit_applied(edit);
        for mention in delta.invalidated {
            self.notify(EngineNotification::MentionDeleted(mention));
        }
        if let Some(trim) = delta.trim {
            self.apply_trim(trim);
        }
        let reason = if edit.is_pure_deletion() {
            CancelReason::TriggerDeleted
        } else {
            CancelReason::CursorLeft
        };
        self.refresh_session(reason);
    }

    fn apply_trim(&mut self, trim: TrimRequest) {
        let start = trim.mention.range().start();
        let edit = match self
            .buffer
            .replace_range(start, trim.residue_end, trim.trimmed_name.as_str())
        {
            Ok(edit) => edit,
            Err(err) => {
                warn!(%err, "mention trim could not rewrite the buffer");
                self.notify(EngineNotification::MentionDeleted(trim.mention));
                return;
            }
        };
        let delta = self.registry.edit_applied(&edit);
        for mention in delta.invalidated {
            self.notify(EngineNotification::MentionDeleted(mention));
        }
        let trimmed = trim
            .mention
            .clone()
            .with_range(MentionRange::new(start, start + trim.trimmed_name.len()))
            .with_display_name(trim.trimmed_name.clone());
        match self.registry.insert(trimmed.clone()) {
            Ok(()) => self.notify(EngineNotification::MentionTrimmed(trimmed)),
            Err(err) => warn!(%err, "trimmed mention could not be re-registered"),
        }
    }

    fn refresh_session(&mut self, lost_reason: CancelReason) {
        let found = scan(&self.buffer, self.buffer.cursor(), &self.registry, &self.config)
            .unwrap_or(None);

        let effects: Effects = match (self.session.candidate().cloned(), found) {
            (None, Some(candidate)) => {
                if self.focused {
                    self.session.begin(candidate)
                } else {
                    Effects::new()
                }
            }
            (Some(current), Some(candidate)) => {
                if current.same_anchor(&candidate) {
                    if current.raw_query_text() != candidate.raw_query_text() {
                        self.session.candidate_changed(candidate)
                    } else {
                        Effects::new()
                    }
                } else {
                    let mut effects = self.session.cancel(lost_reason);
                    self.debouncer.reset();
                    if self.focused {
                        effects.extend(self.session.begin(candidate));
                    }
                    effects
                }
            }
            (Some(_), None) => {
                let effects = self.session.cancel(lost_reason);
                self.debouncer.reset();
                effects
            }
            (None, None) => Effects::new(),
        };
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Effects) {
        for effect in effects {
            match effect {
                SessionEffect::RequestQuery(candidate) => self.dispatch_query(candidate),
                SessionEffect::ShowChooser(entities) => {
                    self.chooser.show(&entities);
                    self.notify(EngineNotification::ChooserActivated);
                }
                SessionEffect::UpdateChooser(entities) => self.chooser.update(&entities),
                SessionEffect::HideChooser => {
                    self.chooser.hide();
                    self.notify(EngineNotification::ChooserDeactivated);
                }
                SessionEffect::Commit { entity, candidate } => self.commit(entity, candidate),
                SessionEffect::PhaseChanged { from, to } => {
                    self.notify(EngineNotification::PhaseChanged { from, to });
                }
            }
        }
    }

    fn dispatch_query(&mut self, candidate: MentionCandidate) {
        let request = candidate.to_query_request();
        match self.debouncer.submit(request.clone()) {
            Some(handle) => {
                let effects = self.session.query_submitted(handle.seq());
                self.apply_effects(effects);
                let sink = ResultSink::new(handle.seq(), Arc::clone(&self.route));
                let provider = Arc::clone(&self.provider);
                provider.query(&request, sink);
            }
            None => {
                // Identical query already in flight; the session rides on it.
                if let Some(seq) = self.debouncer.active_seq() {
                    let effects = self.session.query_submitted(seq);
                    self.apply_effects(effects);
                }
            }
        }
    }

    fn commit(&mut self, entity: EntityRecord, candidate: MentionCandidate) {
        let start = candidate.start_offset();
        let control_len = candidate
            .control_character()
            .map_or(0, |c| c.len_utf8());
        let end = start + control_len + candidate.raw_query_text().len();
        let display = entity.display_name().to_owned();

        let edit = match self.buffer.replace_range(start, end, &display) {
            Ok(edit) => edit,
            Err(err) => {
                warn!(%err, "mention commit could not rewrite the buffer");
                return;
            }
        };
        let delta = self.registry.edit_applied(&edit);
        for mention in delta.invalidated {
            self.notify(EngineNotification::MentionDeleted(mention));
        }

        let mention = ResolvedMention::for_entity(&entity, start);
        for removed in self.registry.remove_overlapping(mention.range()) {
            self.notify(EngineNotification::MentionDeleted(removed));
        }
        match self.registry.insert(mention.clone()) {
            Ok(()) => {
                self.debouncer.reset();
                self.notify(EngineNotification::MentionCreated(mention));
            }
            Err(err) => warn!(%err, "resolved mention could not be registered"),
        }
    }

    fn ingest(&mut self, reply: ProviderReply) {
        match reply {
            ProviderReply::Batch {
                seq,
                entities,
                is_final,
            } => match self.debouncer.admission(seq) {
                QueryAdmission::Stale => {
                    trace!(seq, "discarding stale provider reply");
                }
                QueryAdmission::Fresh => {
                    if is_final {
                        self.debouncer.settle(seq);
                    }
                    let effects = self.session.results(entities, is_final);
                    self.apply_effects(effects);
                }
            },
            ProviderReply::Failure { seq } => match self.debouncer.admission(seq) {
                QueryAdmission::Stale => {
                    trace!(seq, "discarding stale provider failure");
                }
                QueryAdmission::Fresh => {
                    warn!(seq, "entity query failed; presenting empty results");
                    self.debouncer.settle(seq);
                    let effects = self.session.results(Vec::new(), true);
                    self.apply_effects(effects);
                }
            },
        }
    }

    fn drain_replies(&mut self) {
        while let Some(reply) = self.replies.pop() {
            self.ingest(reply);
        }
    }

    fn notify(&mut self, notification: EngineNotification) {
        for observer in &mut self.observers {
            observer(&notification);
        }
    }
}

impl fmt::Debug for MentionsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MentionsEngine")
            .field("text", &self.buffer.text())
            .field("cursor", &self.buffer.cursor())
            .field("phase", &self.session.phase())
            .field("mentions", &self.registry.len())
            .field("focused", &self.focused)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Buffer(BufferError),
    Selection(SessionError),
    MentionTextMismatch {
        range: MentionRange,
        expected: SmolStr,
        found: String,
    },
    Registry(RegistryError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer(err) => write!(f, "buffer edit rejected: {err}"),
            Self::Selection(err) => write!(f, "selection rejected: {err}"),
            Self::MentionTextMismatch {
                range,
                expected,
                found,
            } => write!(
                f,
                "buffer text {found:?} at [{}, {}) does not match mention text {expected:?}",
                range.start(),
                range.end()
            ),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<BufferError> for EngineError {
    fn from(err: BufferError) -> Self {
        Self::Buffer(err)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{EngineNotification, MentionsEngine};
    use crate::chooser::{ChooserCall, NullChooser, RecordingChooser};
    use crate::config::MentionsConfig;
    use crate::model::{EntityId, EntityRecord, MentionRange, ResolvedMention};
    use crate::provider::{
        EntityProvider, FuzzyEntityProvider, QueryRequest, ResultSink,
    };
    use crate::session::SessionPhase;

    fn entity(id: &str, name: &str) -> EntityRecord {
        EntityRecord::new(EntityId::new(id).expect("entity id"), name)
    }

    /// Provider that answers nothing on its own; the test drives replies
    /// through the captured sinks.
    #[derive(Default)]
    struct ManualProvider {
        calls: Arc<Mutex<Vec<(QueryRequest, ResultSink)>>>,
    }

    impl ManualProvider {
        fn new() -> (Arc<Self>, Arc<Mutex<Vec<(QueryRequest, ResultSink)>>>) {
            let provider = Arc::new(Self::default());
            let calls = Arc::clone(&provider.calls);
            (provider, calls)
        }
    }

    impl EntityProvider for ManualProvider {
        fn query(&self, request: &QueryRequest, sink: ResultSink) {
            self.calls
                .lock()
                .expect("manual provider poisoned")
                .push((request.clone(), sink));
        }
    }

    fn fuzzy_engine() -> MentionsEngine {
        let provider = Arc::new(FuzzyEntityProvider::from_entries([
            ("1", "David"),
            ("2", "Dave"),
        ]));
        MentionsEngine::new(MentionsConfig::default(), provider, Box::new(NullChooser))
    }

    #[test]
    fn typing_a_control_character_and_token_presents_results() {
        let mut engine = fuzzy_engine();
        engine.insert_text(0, "Hello @da").expect("edit");
        assert_eq!(engine.phase(), SessionPhase::PresentingResults);
        let names: Vec<&str> = engine
            .presented_entities()
            .expect("presented")
            .iter()
            .map(|e| e.display_name())
            .collect();
        assert!(names.contains(&"David"));
    }

    #[test]
    fn selecting_an_entity_rewrites_the_buffer_and_registers_the_mention() {
        let mut engine = fuzzy_engine();
        engine.insert_text(0, "Hello @dav").expect("edit");
        let index = engine
            .presented_entities()
            .expect("presented")
            .iter()
            .position(|e| e.display_name() == "David")
            .expect("David listed");

        engine.select_entity(index).expect("selection");

        assert_eq!(engine.text(), "Hello David");
        assert_eq!(engine.phase(), SessionPhase::Idle);
        let mentions = engine.mentions();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].range(), MentionRange::new(6, 11));
        assert_eq!(mentions[0].display_name(), "David");
        assert_eq!(engine.cursor(), 11);
    }

    #[test]
    fn late_replies_from_a_superseded_query_are_discarded() {
        let (provider, calls) = ManualProvider::new();
        let (chooser, log) = RecordingChooser::new();
        let mut engine =
            MentionsEngine::new(MentionsConfig::default(), provider, Box::new(chooser));

        engine.insert_text(0, "@da").expect("edit");
        engine.insert_text(3, "v").expect("edit");

        let captured: Vec<(QueryRequest, ResultSink)> =
            calls.lock().expect("calls").drain(..).collect();
        assert_eq!(captured.len(), 2);
        let (first_request, first_sink) = &captured[0];
        let (second_request, second_sink) = &captured[1];
        assert_eq!(first_request.text(), "da");
        assert_eq!(second_request.text(), "dav");

        // The superseded query answers late: nothing may reach the chooser.
        first_sink.finish(vec![entity("e:stale", "Stale Result")]);
        engine.pump();
        assert_eq!(engine.phase(), SessionPhase::AwaitingResults);
        assert!(log.calls().is_empty());

        second_sink.finish(vec![entity("e:2", "David")]);
        engine.pump();
        assert_eq!(engine.phase(), SessionPhase::PresentingResults);
        assert_eq!(log.last(), Some(ChooserCall::Show(vec!["David".into()])));
    }

    #[test]
    fn provider_failure_presents_an_empty_final_result_set() {
        let (provider, calls) = ManualProvider::new();
        let (chooser, log) = RecordingChooser::new();
        let mut engine =
            MentionsEngine::new(MentionsConfig::default(), provider, Box::new(chooser));

        engine.insert_text(0, "@dav").expect("edit");
        let (_, sink) = calls.lock().expect("calls").pop().expect("one query");
        sink.fail();
        engine.pump();

        assert_eq!(engine.phase(), SessionPhase::PresentingResults);
        assert_eq!(log.last(), Some(ChooserCall::Show(Vec::new())));
    }

    #[test]
    fn deleting_the_token_cancels_and_hides_the_chooser() {
        let (chooser, log) = RecordingChooser::new();
        let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
        let mut engine =
            MentionsEngine::new(MentionsConfig::default(), provider, Box::new(chooser));

        engine.insert_text(0, "Hi @da").expect("edit");
        assert_eq!(engine.phase(), SessionPhase::PresentingResults);

        engine.delete_range(4, 6).expect("edit");
        assert_eq!(engine.phase(), SessionPhase::Idle);
        assert_eq!(log.last(), Some(ChooserCall::Hide));
    }

    #[test]
    fn edits_before_a_mention_keep_its_text_aligned() {
        let mut engine = fuzzy_engine();
        engine.insert_text(0, "Hi @dav").expect("edit");
        engine.select_entity(0).expect("selection");
        let range = engine.mentions()[0].range();

        engine.insert_text(0, ">> ").expect("edit");
        let mentions = engine.mentions();
        assert_eq!(mentions.len(), 1);
        let shifted = mentions[0].range();
        assert_eq!(shifted.start(), range.start() + 3);
        // Round-trip: the text under the shifted range is still the name.
        assert_eq!(
            &engine.text()[shifted.start()..shifted.end()],
            mentions[0].display_name()
        );
    }

    #[test]
    fn editing_inside_a_mention_deletes_it_and_notifies() {
        let deleted: Arc<Mutex<Vec<ResolvedMention>>> = Arc::default();
        let deleted_log = Arc::clone(&deleted);

        let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
        let mut engine =
            MentionsEngine::new(MentionsConfig::default(), provider, Box::new(NullChooser));
        engine.observe(Box::new(move |notification| {
            if let EngineNotification::MentionDeleted(mention) = notification {
                deleted_log
                    .lock()
                    .expect("deleted log poisoned")
                    .push(mention.clone());
            }
        }));

        engine.insert_text(0, "Hi @dav").expect("edit");
        engine.select_entity(0).expect("selection");
        assert_eq!(engine.text(), "Hi David");

        engine.delete_range(5, 6).expect("edit");
        assert!(engine.mentions().is_empty());
        let deleted = deleted.lock().expect("deleted log poisoned");
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].display_name(), "David");
    }

    #[test]
    fn tail_deletion_trims_to_the_first_word_under_the_policy() {
        let config = MentionsConfig {
            trim_on_tail_deletion: true,
            ..MentionsConfig::default()
        };
        let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David Bowman")]));
        let mut engine = MentionsEngine::new(config, provider, Box::new(NullChooser));

        engine.insert_text(0, "Hi @dav").expect("edit");
        engine.select_entity(0).expect("selection");
        assert_eq!(engine.text(), "Hi David Bowman");

        // Backspace over the final 'n'.
        engine.delete_range(14, 15).expect("edit");

        assert_eq!(engine.text(), "Hi David");
        let mentions = engine.mentions();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].display_name(), "David");
        assert_eq!(mentions[0].range(), MentionRange::new(3, 8));
    }

    #[test]
    fn add_mention_validates_the_covered_text() {
        let mut engine = MentionsEngine::with_text(
            MentionsConfig::default(),
            Arc::new(FuzzyEntityProvider::from_entries([("1", "David")])),
            Box::new(NullChooser),
            "Hi David",
        );

        let good = ResolvedMention::new(
            MentionRange::new(3, 8),
            EntityId::new("e:1").expect("entity id"),
            "David",
        );
        engine.add_mention(good).expect("rehydrate");
        assert_eq!(engine.mentions().len(), 1);

        let bad = ResolvedMention::new(
            MentionRange::new(0, 2),
            EntityId::new("e:2").expect("entity id"),
            "Hal",
        );
        assert!(engine.add_mention(bad).is_err());
    }

    #[test]
    fn focus_loss_cancels_and_refocus_resumes_under_the_policy() {
        let config = MentionsConfig {
            resume_after_focus_loss: true,
            ..MentionsConfig::default()
        };
        let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
        let mut engine = MentionsEngine::new(config, provider, Box::new(NullChooser));

        engine.insert_text(0, "@dav").expect("edit");
        assert_eq!(engine.phase(), SessionPhase::PresentingResults);

        engine.focus_changed(false);
        assert_eq!(engine.phase(), SessionPhase::Idle);

        engine.focus_changed(true);
        assert_eq!(engine.phase(), SessionPhase::PresentingResults);
    }

    #[test]
    fn refocus_after_a_deletion_does_not_resume() {
        let config = MentionsConfig {
            resume_after_focus_loss: true,
            ..MentionsConfig::default()
        };
        let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
        let mut engine = MentionsEngine::new(config, provider, Box::new(NullChooser));

        engine.insert_text(0, "@dav").expect("edit");
        engine.focus_changed(false);
        // The candidate text changes while focus is away.
        engine.delete_range(3, 4).expect("edit");
        engine.focus_changed(true);
        assert_eq!(engine.phase(), SessionPhase::Idle);
    }
}
