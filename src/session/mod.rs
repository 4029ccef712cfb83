// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Lifecycle of a single in-progress mention.
//!
//! One session is active per engine. Transitions never call collaborators
//! directly; every entry point returns the [`SessionEffect`]s the caller
//! must carry out, in order. That keeps the machine synchronous, fully
//! deterministic and trivially testable.
//!
//! ```text
//! Idle -> Composing -> AwaitingResults -> PresentingResults -> Resolved -> Idle
//!            ^     \________________________/       |
//!            |         (typing re-submits)          v
//!            +-----------------------------------(select)
//! any active state --(cursor escape / deletion / focus loss)--> Cancelled -> Idle
//! ```

use std::fmt;

use smallvec::SmallVec;
use tracing::debug;

use crate::model::EntityRecord;
use crate::scan::MentionCandidate;

/// Externally observable session state. `Resolved` and `Cancelled` are
/// reported as transition targets; the machine itself immediately re-enters
/// `Idle` and is ready for the next trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Composing,
    AwaitingResults,
    PresentingResults,
    Resolved,
    Cancelled,
}

impl SessionPhase {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::Composing | Self::AwaitingResults | Self::PresentingResults
        )
    }
}

/// Why a session was cancelled. Only `FocusLost` can park the candidate for
/// the resume-on-refocus policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    CursorLeft,
    TriggerDeleted,
    FocusLost,
    ProviderTimeout,
    HostRequest,
}

/// Side effect the caller must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    /// Submit (or re-submit) a query for the candidate.
    RequestQuery(MentionCandidate),
    /// Present a fresh list; the chooser becomes visible.
    ShowChooser(Vec<EntityRecord>),
    /// Replace the visible chooser's list.
    UpdateChooser(Vec<EntityRecord>),
    /// Dismiss the chooser.
    HideChooser,
    /// Replace the candidate text with the entity's display name and record
    /// the resolved mention.
    Commit {
        entity: EntityRecord,
        candidate: MentionCandidate,
    },
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
}

pub type Effects = SmallVec<[SessionEffect; 4]>;

/// Policies a host can toggle without touching the structural transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionPolicies {
    pub resume_after_focus_loss: bool,
    pub cancel_when_final_results_empty: bool,
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Composing {
        candidate: MentionCandidate,
    },
    AwaitingResults {
        candidate: MentionCandidate,
        seq: u64,
    },
    PresentingResults {
        candidate: MentionCandidate,
        seq: u64,
        entities: Vec<EntityRecord>,
        is_final: bool,
    },
    /// Parked after a focus-loss cancellation under the resume policy.
    /// Externally indistinguishable from `Idle`.
    Suspended {
        candidate: MentionCandidate,
    },
}

#[derive(Debug, Clone)]
pub struct MentionSession {
    state: State,
    policies: SessionPolicies,
    chooser_visible: bool,
}

impl MentionSession {
    pub fn new(policies: SessionPolicies) -> Self {
        Self {
            state: State::Idle,
            policies,
            chooser_visible: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.state {
            State::Idle | State::Suspended { .. } => SessionPhase::Idle,
            State::Composing { .. } => SessionPhase::Composing,
            State::AwaitingResults { .. } => SessionPhase::AwaitingResults,
            State::PresentingResults { .. } => SessionPhase::PresentingResults,
        }
    }

    /// The candidate of the active session, if any. A suspended candidate
    /// is not active.
    pub fn candidate(&self) -> Option<&MentionCandidate> {
        match &self.state {
            State::Composing { candidate }
            | State::AwaitingResults { candidate, .. }
            | State::PresentingResults { candidate, .. } => Some(candidate),
            State::Idle | State::Suspended { .. } => None,
        }
    }

    pub fn suspended_candidate(&self) -> Option<&MentionCandidate> {
        match &self.state {
            State::Suspended { candidate } => Some(candidate),
            _ => None,
        }
    }

    pub fn chooser_visible(&self) -> bool {
        self.chooser_visible
    }

    /// The entities currently offered for selection.
    pub fn presented_entities(&self) -> Option<&[EntityRecord]> {
        match &self.state {
            State::PresentingResults { entities, .. } => Some(entities),
            _ => None,
        }
    }

    /// A valid trigger appeared while idle.
    pub fn begin(&mut self, candidate: MentionCandidate) -> Effects {
        debug_assert!(self.candidate().is_none(), "begin() while a session is active");
        let from = self.phase();
        debug!(query = candidate.raw_query_text(), "mention composition started");
        let mut effects = Effects::new();
        effects.push(SessionEffect::PhaseChanged {
            from,
            to: SessionPhase::Composing,
        });
        effects.push(SessionEffect::RequestQuery(candidate.clone()));
        self.state = State::Composing { candidate };
        effects
    }

    /// The keystroke extended or shortened the token but the candidate is
    /// still valid: back to `Composing`, re-submitting the query.
    pub fn candidate_changed(&mut self, candidate: MentionCandidate) -> Effects {
        let from = self.phase();
        if !from.is_active() {
            debug!("candidate change ignored outside an active session");
            return Effects::new();
        }
        let mut effects = Effects::new();
        if from != SessionPhase::Composing {
            effects.push(SessionEffect::PhaseChanged {
                from,
                to: SessionPhase::Composing,
            });
        }
        effects.push(SessionEffect::RequestQuery(candidate.clone()));
        self.state = State::Composing { candidate };
        effects
    }

    /// The engine submitted the query under `seq`.
    pub fn query_submitted(&mut self, seq: u64) -> Effects {
        let State::Composing { candidate } = &self.state else {
            debug!(seq, "query submission ignored outside Composing");
            return Effects::new();
        };
        let candidate = candidate.clone();
        let mut effects = Effects::new();
        effects.push(SessionEffect::PhaseChanged {
            from: SessionPhase::Composing,
            to: SessionPhase::AwaitingResults,
        });
        self.state = State::AwaitingResults { candidate, seq };
        effects
    }

    /// An admitted (non-stale) result batch arrived.
    pub fn results(&mut self, entities: Vec<EntityRecord>, is_final: bool) -> Effects {
        match &mut self.state {
            State::AwaitingResults { candidate, seq } => {
                let candidate = candidate.clone();
                let seq = *seq;
                if is_final
                    && entities.is_empty()
                    && self.policies.cancel_when_final_results_empty
                {
                    debug!(seq, "empty final result set cancels the session");
                    return self.cancel_internal(SessionPhase::AwaitingResults, false);
                }
                let mut effects = Effects::new();
                effects.push(SessionEffect::PhaseChanged {
                    from: SessionPhase::AwaitingResults,
                    to: SessionPhase::PresentingResults,
                });
                effects.push(self.present(&entities));
                self.state = State::PresentingResults {
                    candidate,
                    seq,
                    entities,
                    is_final,
                };
                effects
            }
            State::PresentingResults {
                entities: shown,
                is_final: shown_final,
                seq,
                ..
            } => {
                let seq = *seq;
                if is_final
                    && entities.is_empty()
                    && self.policies.cancel_when_final_results_empty
                {
                    debug!(seq, "empty final result set cancels the session");
                    return self.cancel_internal(SessionPhase::PresentingResults, false);
                }
                *shown = entities;
                *shown_final = is_final;
                let entities = shown.clone();
                let mut effects = Effects::new();
                effects.push(self.present(&entities));
                effects
            }
            _ => {
                debug!("result batch ignored outside an awaiting/presenting session");
                Effects::new()
            }
        }
    }

    /// The user picked an entity from the chooser.
    pub fn selected(&mut self, index: usize) -> Result<Effects, SessionError> {
        let State::PresentingResults {
            candidate, entities, ..
        } = &self.state
        else {
            return Err(SessionError::NoPresentedResults);
        };
        let Some(entity) = entities.get(index) else {
            return Err(SessionError::SelectionOutOfRange {
                index,
                available: entities.len(),
            });
        };
        let entity = entity.clone();
        let candidate = candidate.clone();
        debug!(entity = entity.display_name(), "mention resolved");

        let mut effects = Effects::new();
        effects.push(SessionEffect::Commit {
            entity,
            candidate,
        });
        if self.chooser_visible {
            self.chooser_visible = false;
            effects.push(SessionEffect::HideChooser);
        }
        effects.push(SessionEffect::PhaseChanged {
            from: SessionPhase::PresentingResults,
            to: SessionPhase::Resolved,
        });
        effects.push(SessionEffect::PhaseChanged {
            from: SessionPhase::Resolved,
            to: SessionPhase::Idle,
        });
        self.state = State::Idle;
        Ok(effects)
    }

    /// Cancel the active session. With the resume policy on, a focus-loss
    /// cancellation parks the candidate instead of dropping it.
    pub fn cancel(&mut self, reason: CancelReason) -> Effects {
        let from = self.phase();
        match &self.state {
            State::Idle => Effects::new(),
            State::Suspended { .. } => {
                // Already externally idle; a further cancel just drops the
                // parked candidate.
                self.state = State::Idle;
                Effects::new()
            }
            _ => {
                debug!(?reason, "mention composition cancelled");
                let park = reason == CancelReason::FocusLost && self.policies.resume_after_focus_loss;
                self.cancel_internal(from, park)
            }
        }
    }

    /// Focus returned and the parked candidate is still intact.
    pub fn resume(&mut self, candidate: MentionCandidate) -> Effects {
        debug_assert!(
            matches!(self.state, State::Suspended { .. }),
            "resume() without a suspended session"
        );
        debug!(query = candidate.raw_query_text(), "mention composition resumed");
        let mut effects = Effects::new();
        effects.push(SessionEffect::PhaseChanged {
            from: SessionPhase::Idle,
            to: SessionPhase::Composing,
        });
        effects.push(SessionEffect::RequestQuery(candidate.clone()));
        self.state = State::Composing { candidate };
        effects
    }

    /// Drop a parked candidate without effects (the buffer changed while
    /// focus was away).
    pub fn discard_suspension(&mut self) {
        if matches!(self.state, State::Suspended { .. }) {
            self.state = State::Idle;
        }
    }

    fn cancel_internal(&mut self, from: SessionPhase, park: bool) -> Effects {
        let mut effects = Effects::new();
        if self.chooser_visible {
            self.chooser_visible = false;
            effects.push(SessionEffect::HideChooser);
        }
        effects.push(SessionEffect::PhaseChanged {
            from,
            to: SessionPhase::Cancelled,
        });
        effects.push(SessionEffect::PhaseChanged {
            from: SessionPhase::Cancelled,
            to: SessionPhase::Idle,
        });
        self.state = if park {
            match self.candidate().cloned() {
                Some(candidate) => State::Suspended { candidate },
                None => State::Idle,
            }
        } else {
            State::Idle
        };
        effects
    }

    fn present(&mut self, entities: &[EntityRecord]) -> SessionEffect {
        if self.chooser_visible {
            SessionEffect::UpdateChooser(entities.to_vec())
        } else {
            self.chooser_visible = true;
            SessionEffect::ShowChooser(entities.to_vec())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    NoPresentedResults,
    SelectionOutOfRange { index: usize, available: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresentedResults => f.write_str("no results are being presented"),
            Self::SelectionOutOfRange { index, available } => {
                write!(f, "selection index {index} out of range ({available} presented)")
            }
        }
    }
}

impl std::error::Error for SessionError {}
