// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Trigger detection: decide whether the text around the cursor is a
//! mention being composed.
//!
//! The scan walks backward from the cursor collecting word-like characters
//! into a token, then classifies the stop point. A control character
//! immediately before the token starts an explicit candidate; a long enough
//! token on its own starts an implicit one. The walk never crosses into a
//! resolved mention, so text adjacent to an existing mention cannot
//! retrigger composition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::MentionsConfig;
use crate::model::TextBuffer;
use crate::provider::{QueryRequest, SearchType};
use crate::registry::MentionRegistry;

/// A mention in the middle of being composed. Exists only while the session
/// is active; resolution or cancellation destroys it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionCandidate {
    control_character: Option<char>,
    start_offset: usize,
    raw_query_text: String,
    search_type: SearchType,
}

impl MentionCandidate {
    pub fn new(
        control_character: Option<char>,
        start_offset: usize,
        raw_query_text: impl Into<String>,
        search_type: SearchType,
    ) -> Self {
        Self {
            control_character,
            start_offset,
            raw_query_text: raw_query_text.into(),
            search_type,
        }
    }

    pub fn control_character(&self) -> Option<char> {
        self.control_character
    }

    /// Byte offset where the completed mention will begin: the control
    /// character's position for explicit candidates, the token start for
    /// implicit ones.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub fn raw_query_text(&self) -> &str {
        &self.raw_query_text
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    /// True when `other` continues the same composition: same anchor, same
    /// trigger, only the typed token differs.
    pub fn same_anchor(&self, other: &MentionCandidate) -> bool {
        self.start_offset == other.start_offset
            && self.control_character == other.control_character
    }

    pub fn to_query_request(&self) -> QueryRequest {
        QueryRequest::new(
            self.raw_query_text.clone(),
            self.search_type,
            self.control_character,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The cursor is out of bounds or not on a char boundary. A caller bug,
    /// not a recoverable condition.
    InvalidRange { offset: usize, len: usize },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange { offset, len } => {
                write!(f, "scan cursor {offset} is not a valid offset (len={len})")
            }
        }
    }
}

impl std::error::Error for ScanError {}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\''
}

enum Stop {
    /// Reached the beginning of the buffer.
    Start,
    /// Hit a non-word character at `at`.
    NonWord { at: usize, ch: char },
    /// Hit a character that belongs to a resolved mention.
    MentionBoundary,
}

/// Scan the text immediately before `cursor` for a mention candidate.
///
/// Returns `Ok(None)` when nothing around the cursor qualifies: the token is
/// empty, the walk ran into a resolved mention, or a control character sits
/// mid-word (e.g. the `@` of an email address). With multiple control
/// characters configured the nearest preceding one wins; anything earlier is
/// ordinary text.
pub fn scan(
    buffer: &TextBuffer,
    cursor: usize,
    registry: &MentionRegistry,
    config: &MentionsConfig,
) -> Result<Option<MentionCandidate>, ScanError> {
    let text = buffer.text();
    if cursor > text.len() || !text.is_char_boundary(cursor) {
        return Err(ScanError::InvalidRange {
            offset: cursor,
            len: text.len(),
        });
    }

    let mut token_start = cursor;
    let mut stop = Stop::Start;
    for (at, ch) in text[..cursor].char_indices().rev() {
        if registry.lookup(at).is_some() {
            stop = Stop::MentionBoundary;
            break;
        }
        if is_word_char(ch) {
            token_start = at;
            continue;
        }
        stop = Stop::NonWord { at, ch };
        break;
    }

    let token = &text[token_start..cursor];

    match stop {
        Stop::NonWord { at, ch } if config.is_control_character(ch) => {
            // A control character glued to the previous word is a false
            // positive (email addresses, `foo@bar`).
            if text[..at].chars().next_back().is_some_and(is_word_char) {
                return Ok(None);
            }
            if token.is_empty() {
                if config.initial_fetch_on_control {
                    return Ok(Some(MentionCandidate {
                        control_character: Some(ch),
                        start_offset: at,
                        raw_query_text: String::new(),
                        search_type: SearchType::Initial,
                    }));
                }
                return Ok(None);
            }
            Ok(Some(MentionCandidate {
                control_character: Some(ch),
                start_offset: at,
                raw_query_text: token.to_owned(),
                search_type: SearchType::Explicit,
            }))
        }
        Stop::Start | Stop::NonWord { .. } => {
            if config.implicit_enabled() && token.chars().count() >= config.min_search_length {
                Ok(Some(MentionCandidate {
                    control_character: None,
                    start_offset: token_start,
                    raw_query_text: token.to_owned(),
                    search_type: SearchType::Implicit,
                }))
            } else {
                Ok(None)
            }
        }
        Stop::MentionBoundary => Ok(None),
    }
}
