// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end scenarios through the public engine API, typed one keystroke
//! at a time the way a text view host would deliver them.

use std::sync::Arc;

use smallvec::SmallVec;

use galatea::chooser::{ChooserCall, RecordingChooser};
use galatea::config::MentionsConfig;
use galatea::engine::{EngineNotification, MentionsEngine};
use galatea::model::MentionRange;
use galatea::provider::{EntityProvider, FuzzyEntityProvider, QueryRequest, ResultSink};
use galatea::session::SessionPhase;

/// Provider that counts queries, for the no-query-ever-issued scenario.
struct CountingProvider {
    inner: FuzzyEntityProvider,
    queries: Arc<std::sync::Mutex<Vec<String>>>,
}

impl EntityProvider for CountingProvider {
    fn query(&self, request: &QueryRequest, sink: ResultSink) {
        self.queries
            .lock()
            .expect("query log poisoned")
            .push(request.text().to_owned());
        self.inner.query(request, sink);
    }
}

fn type_str(engine: &mut MentionsEngine, text: &str) {
    for ch in text.chars() {
        let cursor = engine.cursor();
        engine
            .insert_text(cursor, &ch.to_string())
            .expect("keystroke applies");
    }
}

fn backspace(engine: &mut MentionsEngine) {
    let cursor = engine.cursor();
    let previous = engine.text()[..cursor]
        .chars()
        .next_back()
        .expect("character to delete");
    engine
        .delete_range(cursor - previous.len_utf8(), cursor)
        .expect("backspace applies");
}

#[test]
fn explicit_mention_keystroke_by_keystroke() {
    let config = MentionsConfig {
        control_characters: SmallVec::from_slice(&['@', '+']),
        min_search_length: 3,
        ..MentionsConfig::default()
    };
    let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
    let (chooser, log) = RecordingChooser::new();
    let mut engine = MentionsEngine::new(config, provider, Box::new(chooser));

    type_str(&mut engine, "Hello ");
    assert_eq!(engine.phase(), SessionPhase::Idle);

    // "@da" starts composition with token "da" after '@'.
    type_str(&mut engine, "@da");
    assert_eq!(engine.phase(), SessionPhase::PresentingResults);

    // One more character keeps the session alive and re-queries "dav".
    type_str(&mut engine, "v");
    assert_eq!(engine.phase(), SessionPhase::PresentingResults);
    let shown: Vec<&str> = engine
        .presented_entities()
        .expect("presented")
        .iter()
        .map(|e| e.display_name())
        .collect();
    assert_eq!(shown, vec!["David"]);

    // Selecting rewrites "@dav" into the display name and hides the chooser.
    engine.select_entity(0).expect("selection");
    assert_eq!(engine.text(), "Hello David");
    assert_eq!(engine.phase(), SessionPhase::Idle);
    assert_eq!(log.last(), Some(ChooserCall::Hide));

    let mentions = engine.mentions();
    assert_eq!(mentions.len(), 1);
    assert_eq!(mentions[0].entity_id().as_str(), "1");
    assert_eq!(mentions[0].range(), MentionRange::new(6, 11));
    assert_eq!(
        &engine.text()[mentions[0].range().start()..mentions[0].range().end()],
        "David"
    );
}

#[test]
fn bare_control_character_never_issues_a_query() {
    let queries = Arc::new(std::sync::Mutex::new(Vec::new()));
    let provider = Arc::new(CountingProvider {
        inner: FuzzyEntityProvider::from_entries([("1", "David")]),
        queries: Arc::clone(&queries),
    });
    let (chooser, log) = RecordingChooser::new();
    let mut engine = MentionsEngine::new(MentionsConfig::default(), provider, Box::new(chooser));

    type_str(&mut engine, "@");
    assert_eq!(engine.phase(), SessionPhase::Idle);

    type_str(&mut engine, " ");
    assert_eq!(engine.phase(), SessionPhase::Idle);

    assert!(queries.lock().expect("query log poisoned").is_empty());
    assert!(log.calls().is_empty());
}

#[test]
fn bare_control_character_fetches_the_initial_list_when_enabled() {
    let queries = Arc::new(std::sync::Mutex::new(Vec::new()));
    let provider = Arc::new(CountingProvider {
        inner: FuzzyEntityProvider::from_entries([("1", "David"), ("2", "Frank")]),
        queries: Arc::clone(&queries),
    });
    let config = MentionsConfig {
        initial_fetch_on_control: true,
        ..MentionsConfig::default()
    };
    let mut engine = MentionsEngine::new(config, provider, Box::new(RecordingChooser::new().0));

    type_str(&mut engine, "@");
    assert_eq!(engine.phase(), SessionPhase::PresentingResults);
    assert_eq!(engine.presented_entities().map(|list| list.len()), Some(2));
    assert_eq!(*queries.lock().expect("query log poisoned"), vec![String::new()]);
}

#[test]
fn implicit_mention_lifecycle_with_length_threshold() {
    let config = MentionsConfig {
        control_characters: SmallVec::new(),
        min_search_length: 3,
        ..MentionsConfig::default()
    };
    let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "abcde")]));
    let (chooser, log) = RecordingChooser::new();
    let mut engine = MentionsEngine::new(config, provider, Box::new(chooser));

    // Below the threshold nothing happens.
    type_str(&mut engine, "ab");
    assert_eq!(engine.phase(), SessionPhase::Idle);

    // The third character triggers implicit composition.
    type_str(&mut engine, "c");
    assert_eq!(engine.phase(), SessionPhase::PresentingResults);

    // A fourth keeps it alive.
    type_str(&mut engine, "d");
    assert_eq!(engine.phase(), SessionPhase::PresentingResults);

    // Deleting back below the threshold cancels.
    backspace(&mut engine);
    assert_eq!(engine.phase(), SessionPhase::PresentingResults);
    backspace(&mut engine);
    assert_eq!(engine.phase(), SessionPhase::Idle);
    assert_eq!(log.last(), Some(ChooserCall::Hide));
}

#[test]
fn moving_the_cursor_out_of_the_candidate_cancels() {
    let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
    let mut engine =
        MentionsEngine::new(MentionsConfig::default(), provider, Box::new(RecordingChooser::new().0));

    type_str(&mut engine, "Hi @da");
    assert_eq!(engine.phase(), SessionPhase::PresentingResults);

    engine.set_cursor(0).expect("cursor move");
    assert_eq!(engine.phase(), SessionPhase::Idle);
}

#[test]
fn resolved_mentions_shift_under_earlier_edits_and_die_under_overlap() {
    let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
    let mut engine =
        MentionsEngine::new(MentionsConfig::default(), provider, Box::new(RecordingChooser::new().0));

    type_str(&mut engine, "Hi @dav");
    engine.select_entity(0).expect("selection");
    assert_eq!(engine.text(), "Hi David");
    let original = engine.mentions()[0].range();

    // Insert before: range shifts, text round-trips.
    engine.insert_text(0, "Oh! ").expect("edit");
    let shifted = engine.mentions()[0].range();
    assert_eq!(shifted.start(), original.start() + 4);
    assert_eq!(
        &engine.text()[shifted.start()..shifted.end()],
        engine.mentions()[0].display_name()
    );

    // Typing inside the mention kills it.
    engine
        .insert_text(shifted.start() + 2, "x")
        .expect("edit");
    assert!(engine.mentions().is_empty());
}

#[test]
fn typing_into_a_resolved_mention_never_retriggers_composition() {
    let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
    let mut engine =
        MentionsEngine::new(MentionsConfig::default(), provider, Box::new(RecordingChooser::new().0));

    type_str(&mut engine, "Hi @dav");
    engine.select_entity(0).expect("selection");

    let range = engine.mentions()[0].range();
    // Park the cursor in the middle of the mention; no scan may trigger.
    engine.set_cursor(range.start() + 2).expect("cursor move");
    assert_eq!(engine.phase(), SessionPhase::Idle);
}

#[test]
fn notifications_report_the_full_lifecycle() {
    let provider = Arc::new(FuzzyEntityProvider::from_entries([("1", "David")]));
    let mut engine =
        MentionsEngine::new(MentionsConfig::default(), provider, Box::new(RecordingChooser::new().0));

    let phases: Arc<std::sync::Mutex<Vec<(SessionPhase, SessionPhase)>>> = Arc::default();
    let created: Arc<std::sync::Mutex<Vec<String>>> = Arc::default();
    let phases_log = Arc::clone(&phases);
    let created_log = Arc::clone(&created);
    engine.observe(Box::new(move |notification| match notification {
        EngineNotification::PhaseChanged { from, to } => {
            phases_log.lock().expect("phase log").push((*from, *to));
        }
        EngineNotification::MentionCreated(mention) => {
            created_log
                .lock()
                .expect("created log")
                .push(mention.display_name().to_owned());
        }
        _ => {}
    }));

    type_str(&mut engine, "@dav");
    engine.select_entity(0).expect("selection");

    assert_eq!(*created.lock().expect("created log"), vec!["David".to_owned()]);
    let phases = phases.lock().expect("phase log");
    assert_eq!(
        phases.first(),
        Some(&(SessionPhase::Idle, SessionPhase::Composing))
    );
    assert!(phases.contains(&(SessionPhase::AwaitingResults, SessionPhase::PresentingResults)));
    assert!(phases.contains(&(SessionPhase::PresentingResults, SessionPhase::Resolved)));
    assert_eq!(
        phases.last(),
        Some(&(SessionPhase::Resolved, SessionPhase::Idle))
    );
}
