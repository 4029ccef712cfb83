// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::edit::TextEdit;
use super::entity::EntityRecord;
use super::ids::EntityId;

/// Half-open byte range `[start, end)` into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MentionRange {
    start: usize,
    end: usize,
}

impl MentionRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn overlaps(&self, other: &MentionRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True when the edit touches at least one character inside the range.
    /// A pure insertion strictly between two characters of the range counts
    /// as touching; insertions at either boundary do not.
    pub fn touched_by(&self, edit: &TextEdit) -> bool {
        if edit.removed_len() == 0 {
            edit.range_start() > self.start && edit.range_start() < self.end
        } else {
            edit.range_start() < self.end && edit.range_end() > self.start
        }
    }

    pub fn shifted_by(&self, edit: &TextEdit) -> Self {
        Self {
            start: edit.shift_offset(self.start),
            end: edit.shift_offset(self.end),
        }
    }
}

/// A completed mention anchored in the buffer.
///
/// The buffer text covered by `range` always equals `display_name`; the
/// registry removes the mention as soon as an edit breaks that equality.
/// Serializable so hosts can persist a draft and rehydrate it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMention {
    range: MentionRange,
    entity_id: EntityId,
    display_name: SmolStr,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<SmolStr, SmolStr>,
}

impl ResolvedMention {
    pub fn new(range: MentionRange, entity_id: EntityId, display_name: impl Into<SmolStr>) -> Self {
        Self {
            range,
            entity_id,
            display_name: display_name.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Build a mention for `entity` whose display name starts at `start`.
    pub fn for_entity(entity: &EntityRecord, start: usize) -> Self {
        let display_name = SmolStr::new(entity.display_name());
        Self {
            range: MentionRange::new(start, start + display_name.len()),
            entity_id: entity.id().clone(),
            display_name,
            metadata: entity.metadata().clone(),
        }
    }

    pub fn range(&self) -> MentionRange {
        self.range
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn metadata(&self) -> &BTreeMap<SmolStr, SmolStr> {
        &self.metadata
    }

    pub(crate) fn with_range(mut self, range: MentionRange) -> Self {
        self.range = range;
        self
    }

    pub(crate) fn with_display_name(mut self, display_name: SmolStr) -> Self {
        self.display_name = display_name;
        self
    }
}
