// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Host configuration for the mentions engine.
///
/// Deserializable so hosts can ship it inside their own settings files; every
/// field has a default matching the plain `@`-mentions setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionsConfig {
    /// Characters that explicitly begin a mention (e.g. `@`, `+`). Empty
    /// disables explicit triggering.
    pub control_characters: SmallVec<[char; 4]>,

    /// Token length (in chars) at which composition starts without a control
    /// character. `0` disables implicit triggering.
    pub min_search_length: usize,

    /// When enabled, a bare control character immediately preceding the
    /// cursor starts a session with an empty query (`SearchType::Initial`),
    /// letting the provider return a default list.
    pub initial_fetch_on_control: bool,

    /// Re-enter composition when focus returns after a cancellation that was
    /// caused solely by focus loss and the candidate text is still intact.
    pub resume_after_focus_loss: bool,

    /// Cancel the session when a final result set comes back empty instead
    /// of presenting zero items.
    pub cancel_when_final_results_empty: bool,

    /// On a deletion that removes the tail of a multi-word mention, trim the
    /// mention to its first word instead of discarding it.
    pub trim_on_tail_deletion: bool,
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            control_characters: SmallVec::from_slice(&['@']),
            min_search_length: 3,
            initial_fetch_on_control: false,
            resume_after_focus_loss: false,
            cancel_when_final_results_empty: false,
            trim_on_tail_deletion: false,
        }
    }
}

impl MentionsConfig {
    pub fn is_control_character(&self, c: char) -> bool {
        self.control_characters.contains(&c)
    }

    pub fn implicit_enabled(&self) -> bool {
        self.min_search_length > 0
    }
}
