// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The entity-source side of the engine.
//!
//! A provider answers search queries for a mention session. Results are
//! streamed: any number of non-final batches may arrive (each replacing the
//! previously shown set) before a final batch settles the query. Failures
//! are reported through the sink and recovered by the session as an empty
//! final result set; a provider never crashes the state machine.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::model::EntityRecord;

mod fuzzy;

pub use fuzzy::{FuzzyEntityProvider, MatchMode};

/// How the query text was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchType {
    /// The user typed a control character and then the query text.
    Explicit,
    /// The query text reached the configured length threshold on its own.
    Implicit,
    /// A bare control character; the query text is empty and the provider
    /// should return its default list.
    Initial,
}

/// One search request, as handed to an [`EntityProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    text: String,
    search_type: SearchType,
    control_character: Option<char>,
}

impl QueryRequest {
    pub fn new(
        text: impl Into<String>,
        search_type: SearchType,
        control_character: Option<char>,
    ) -> Self {
        Self {
            text: text.into(),
            search_type,
            control_character,
        }
    }

    /// The text to search for. May be empty (`SearchType::Initial`); the
    /// provider must tolerate that and return a default list.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn control_character(&self) -> Option<char> {
        self.control_character
    }
}

/// A reply travelling back from a provider, tagged with the sequence number
/// of the query that produced it so the engine can discard superseded
/// results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderReply {
    Batch {
        seq: u64,
        entities: Vec<EntityRecord>,
        is_final: bool,
    },
    Failure {
        seq: u64,
    },
}

impl ProviderReply {
    pub fn seq(&self) -> u64 {
        match self {
            Self::Batch { seq, .. } | Self::Failure { seq } => *seq,
        }
    }
}

/// Where a provider's replies go. The engine supplies an implementation
/// that re-marshals onto its control thread; replies may be delivered from
/// any thread.
pub trait ReplyRoute: Send + Sync {
    fn deliver(&self, reply: ProviderReply);
}

/// The write end a provider uses to answer one query.
///
/// Cheap to clone; a provider may hand it to background work. Once the
/// query is superseded the engine discards whatever still arrives, so a
/// slow provider can keep writing without harm.
#[derive(Clone)]
pub struct ResultSink {
    seq: u64,
    route: Arc<dyn ReplyRoute>,
}

impl ResultSink {
    pub fn new(seq: u64, route: Arc<dyn ReplyRoute>) -> Self {
        Self { seq, route }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Deliver a batch with more to follow. The shown set is replaced, not
    /// appended to.
    pub fn push(&self, entities: Vec<EntityRecord>) {
        self.route.deliver(ProviderReply::Batch {
            seq: self.seq,
            entities,
            is_final: false,
        });
    }

    /// Deliver the last batch for this query.
    pub fn finish(&self, entities: Vec<EntityRecord>) {
        self.route.deliver(ProviderReply::Batch {
            seq: self.seq,
            entities,
            is_final: true,
        });
    }

    /// Report that the query errored out. The session recovers by treating
    /// this as an empty final result set.
    pub fn fail(&self) {
        self.route.deliver(ProviderReply::Failure { seq: self.seq });
    }
}

impl std::fmt::Debug for ResultSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSink").field("seq", &self.seq).finish()
    }
}

/// An external entity source.
///
/// `query` must be safe to call repeatedly for the same session and must
/// tolerate empty query text. Implementations are free to answer
/// synchronously (before `query` returns) or from background work; either
/// way the replies funnel through the sink.
pub trait EntityProvider: Send + Sync {
    fn query(&self, request: &QueryRequest, sink: ResultSink);
}

/// FIFO reply route for single-threaded hosts: replies pile up here and the
/// engine drains them at its next entry point.
#[derive(Debug, Clone, Default)]
pub struct ReplyQueue {
    inner: Arc<Mutex<VecDeque<ProviderReply>>>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&self) -> Option<ProviderReply> {
        self.inner.lock().expect("reply queue poisoned").pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().expect("reply queue poisoned").is_empty()
    }
}

impl ReplyRoute for ReplyQueue {
    fn deliver(&self, reply: ProviderReply) {
        self.inner
            .lock()
            .expect("reply queue poisoned")
            .push_back(reply);
    }
}
