// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The chooser surface the engine drives.
//!
//! A presenter is purely reactive: it renders whatever list it was last
//! given and owns no session state. Selection flows the other way, with the
//! host calling [`crate::engine::MentionsEngine::select_entity`] on the
//! picked index.

use std::sync::{Arc, Mutex};

use smol_str::SmolStr;

use crate::model::EntityRecord;

pub trait ChooserPresenter: Send {
    /// Present a fresh result list; the chooser becomes visible.
    fn show(&mut self, entities: &[EntityRecord]);

    /// Replace the list of an already-visible chooser.
    fn update(&mut self, entities: &[EntityRecord]);

    /// Dismiss the chooser.
    fn hide(&mut self);
}

/// Presenter that renders nothing. Useful for headless hosts and tests that
/// only care about the registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChooser;

impl ChooserPresenter for NullChooser {
    fn show(&mut self, _entities: &[EntityRecord]) {}

    fn update(&mut self, _entities: &[EntityRecord]) {}

    fn hide(&mut self) {}
}

/// One observed presenter call, reduced to display names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooserCall {
    Show(Vec<SmolStr>),
    Update(Vec<SmolStr>),
    Hide,
}

/// Shared view of a [`RecordingChooser`]'s call log.
#[derive(Debug, Clone, Default)]
pub struct ChooserLog {
    calls: Arc<Mutex<Vec<ChooserCall>>>,
}

impl ChooserLog {
    pub fn calls(&self) -> Vec<ChooserCall> {
        self.calls.lock().expect("chooser log poisoned").clone()
    }

    pub fn last(&self) -> Option<ChooserCall> {
        self.calls
            .lock()
            .expect("chooser log poisoned")
            .last()
            .cloned()
    }

    pub fn clear(&self) {
        self.calls.lock().expect("chooser log poisoned").clear();
    }

    fn record(&self, call: ChooserCall) {
        self.calls.lock().expect("chooser log poisoned").push(call);
    }
}

/// Presenter that records every call; the companion [`ChooserLog`] stays
/// with the test while the presenter moves into the engine.
#[derive(Debug, Default)]
pub struct RecordingChooser {
    log: ChooserLog,
}

impl RecordingChooser {
    pub fn new() -> (Self, ChooserLog) {
        let chooser = Self::default();
        let log = chooser.log.clone();
        (chooser, log)
    }
}

fn names(entities: &[EntityRecord]) -> Vec<SmolStr> {
    entities
        .iter()
        .map(|entity| SmolStr::new(entity.display_name()))
        .collect()
}

impl ChooserPresenter for RecordingChooser {
    fn show(&mut self, entities: &[EntityRecord]) {
        self.log.record(ChooserCall::Show(names(entities)));
    }

    fn update(&mut self, entities: &[EntityRecord]) {
        self.log.record(ChooserCall::Update(names(entities)));
    }

    fn hide(&mut self) {
        self.log.record(ChooserCall::Hide);
    }
}
