// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Query lifecycle bookkeeping.
//!
//! At most one query is logically active per session. Submissions are
//! numbered from a monotonic counter; a new submission supersedes the
//! previous query, whose late replies then fail [`QueryDebouncer::admission`]
//! and are discarded. Superseding never aborts the in-flight provider call;
//! cancellation here is purely cooperative.

use crate::provider::QueryRequest;

/// Ticket for one submitted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryHandle {
    seq: u64,
}

impl QueryHandle {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Verdict on an arriving reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryAdmission {
    /// The reply belongs to the active, unsettled query.
    Fresh,
    /// The reply belongs to a superseded or settled query and must be
    /// discarded without touching session state.
    Stale,
}

#[derive(Debug, Clone)]
struct ActiveQuery {
    seq: u64,
    request: QueryRequest,
    settled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryDebouncer {
    next_seq: u64,
    active: Option<ActiveQuery>,
}

impl QueryDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a request, superseding whatever was active. Returns `None`
    /// when the request is identical to the still-unsettled active query;
    /// resubmitting it would only churn the provider for the same answer.
    pub fn submit(&mut self, request: QueryRequest) -> Option<QueryHandle> {
        if let Some(active) = &self.active {
            if !active.settled && active.request == request {
                return None;
            }
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        self.active = Some(ActiveQuery {
            seq,
            request,
            settled: false,
        });
        Some(QueryHandle { seq })
    }

    pub fn admission(&self, seq: u64) -> QueryAdmission {
        match &self.active {
            Some(active) if active.seq == seq && !active.settled => QueryAdmission::Fresh,
            _ => QueryAdmission::Stale,
        }
    }

    /// Mark the active query as settled (its final batch arrived). Later
    /// replies for the same sequence number are stale.
    pub fn settle(&mut self, seq: u64) {
        if let Some(active) = &mut self.active {
            if active.seq == seq {
                active.settled = true;
            }
        }
    }

    /// Drop the active query entirely; every in-flight reply becomes stale.
    /// Called when the session resolves or cancels.
    pub fn reset(&mut self) {
        self.active = None;
    }

    pub fn active_seq(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.seq)
    }
}
