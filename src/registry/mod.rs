// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Registry of resolved mentions anchored in the buffer.
//!
//! Entries are kept sorted by start offset and never overlap. Every buffer
//! edit is replayed into the registry: entries past the edit shift by the
//! edit's length delta, entries whose text was touched are invalidated (or,
//! under the trim policy, reduced to their first word).

use std::collections::BTreeMap;
use std::fmt;

use smol_str::SmolStr;

use crate::model::{MentionRange, ResolvedMention, TextEdit};

/// Outcome of replaying one edit into the registry.
///
/// `invalidated` entries have already been removed. A `trim` is a request,
/// not a done deal: the engine owns the buffer rewrite and re-inserts the
/// trimmed entry afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryDelta {
    pub invalidated: Vec<ResolvedMention>,
    pub trim: Option<TrimRequest>,
}

/// A mention whose tail was deleted and which can survive as its first word.
///
/// `residue_end` is the end (post-edit coordinates) of what is left of the
/// mention text in the buffer; the engine replaces
/// `[mention.range().start(), residue_end)` with `trimmed_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimRequest {
    pub mention: ResolvedMention,
    pub trimmed_name: SmolStr,
    pub residue_end: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MentionRegistry {
    mentions: BTreeMap<usize, ResolvedMention>,
    trim_on_tail_deletion: bool,
}

impl MentionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trim_on_tail_deletion(trim_on_tail_deletion: bool) -> Self {
        Self {
            mentions: BTreeMap::new(),
            trim_on_tail_deletion,
        }
    }

    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    pub fn clear(&mut self) {
        self.mentions.clear();
    }

    /// Entries in buffer order.
    pub fn mentions(&self) -> impl Iterator<Item = &ResolvedMention> {
        self.mentions.values()
    }

    /// The entry whose range contains `offset`, if any.
    pub fn lookup(&self, offset: usize) -> Option<&ResolvedMention> {
        self.mentions
            .range(..=offset)
            .next_back()
            .map(|(_, mention)| mention)
            .filter(|mention| mention.range().contains(offset))
    }

    /// Insert a resolved mention. Fails when the range overlaps an existing
    /// entry; the caller resolves the conflict by removing the old entry
    /// first (this happens naturally when the user retypes over a mention).
    pub fn insert(&mut self, mention: ResolvedMention) -> Result<(), RegistryError> {
        let range = mention.range();
        let conflict = self
            .mentions
            .values()
            .map(ResolvedMention::range)
            .find(|existing| existing.overlaps(&range));
        if let Some(existing) = conflict {
            return Err(RegistryError::ConflictingRange {
                inserted: range,
                existing,
            });
        }
        self.mentions.insert(range.start(), mention);
        Ok(())
    }

    /// Remove the entry starting at `start`. Removing an absent entry is a
    /// no-op, so replaying the same invalidation twice is harmless.
    pub fn remove(&mut self, start: usize) -> Option<ResolvedMention> {
        self.mentions.remove(&start)
    }

    /// Remove and return every entry overlapping `range`.
    pub fn remove_overlapping(&mut self, range: MentionRange) -> Vec<ResolvedMention> {
        let starts: Vec<usize> = self
            .mentions
            .values()
            .filter(|mention| mention.range().overlaps(&range))
            .map(|mention| mention.range().start())
            .collect();
        starts
            .into_iter()
            .filter_map(|start| self.mentions.remove(&start))
            .collect()
    }

    /// Replay one buffer edit into the registry.
    ///
    /// Entries entirely before the edit are untouched, entries entirely
    /// after shift by the edit's length delta, and entries whose text was
    /// touched are invalidated. Exception: a pure deletion of the tail of a
    /// multi-word mention with the trim policy on reports a [`TrimRequest`]
    /// instead.
    pub fn edit_applied(&mut self, edit: &TextEdit) -> RegistryDelta {
        let mut delta = RegistryDelta::default();
        let old = std::mem::take(&mut self.mentions);

        for (_, mention) in old {
            let range = mention.range();
            if range.touched_by(edit) {
                match self.trim_request(&mention, edit) {
                    Some(request) => delta.trim = Some(request),
                    None => delta.invalidated.push(mention),
                }
            } else if range.start() >= edit.range_end() {
                let shifted = range.shifted_by(edit);
                self.mentions
                    .insert(shifted.start(), mention.with_range(shifted));
            } else {
                self.mentions.insert(range.start(), mention);
            }
        }

        delta
    }

    fn trim_request(&self, mention: &ResolvedMention, edit: &TextEdit) -> Option<TrimRequest> {
        if !self.trim_on_tail_deletion || !edit.is_pure_deletion() {
            return None;
        }
        let range = mention.range();
        let name = mention.display_name();
        let first_word = name.split_whitespace().next().unwrap_or(name);
        // The whole first word must survive the deletion, and there must be
        // something left to trim away.
        if first_word.len() == name.len() {
            return None;
        }
        if edit.range_start() < range.start() + first_word.len() {
            return None;
        }
        Some(TrimRequest {
            mention: mention.clone(),
            trimmed_name: SmolStr::new(first_word),
            residue_end: edit.range_start(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    ConflictingRange {
        inserted: MentionRange,
        existing: MentionRange,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConflictingRange { inserted, existing } => write!(
                f,
                "mention range [{}, {}) overlaps existing entry [{}, {})",
                inserted.start(),
                inserted.end(),
                existing.start(),
                existing.end()
            ),
        }
    }
}

impl std::error::Error for RegistryError {}
