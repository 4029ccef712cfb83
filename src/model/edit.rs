// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

/// A single buffer change: the text in `[range_start, range_end)` was
/// replaced by `inserted_text`. Pure insertions have an empty range, pure
/// deletions empty `inserted_text`. Offsets are byte offsets on UTF-8
/// boundaries of the text *before* the edit. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    range_start: usize,
    range_end: usize,
    inserted_text: String,
}

impl TextEdit {
    pub fn new(range_start: usize, range_end: usize, inserted_text: impl Into<String>) -> Self {
        debug_assert!(range_start <= range_end);
        Self {
            range_start,
            range_end,
            inserted_text: inserted_text.into(),
        }
    }

    pub fn insertion(offset: usize, inserted_text: impl Into<String>) -> Self {
        Self::new(offset, offset, inserted_text)
    }

    pub fn deletion(range_start: usize, range_end: usize) -> Self {
        Self::new(range_start, range_end, String::new())
    }

    pub fn range_start(&self) -> usize {
        self.range_start
    }

    pub fn range_end(&self) -> usize {
        self.range_end
    }

    pub fn inserted_text(&self) -> &str {
        &self.inserted_text
    }

    pub fn removed_len(&self) -> usize {
        self.range_end - self.range_start
    }

    pub fn is_pure_deletion(&self) -> bool {
        self.inserted_text.is_empty() && self.range_end > self.range_start
    }

    /// Net offset shift this edit causes for positions at or past `range_end`.
    pub fn shift(&self) -> i64 {
        self.inserted_text.len() as i64 - self.removed_len() as i64
    }

    /// Apply this edit's shift to an offset located entirely after the
    /// edited range. The caller guarantees `offset >= range_end`.
    pub fn shift_offset(&self, offset: usize) -> usize {
        debug_assert!(offset >= self.range_end);
        (offset as i64 + self.shift()) as usize
    }
}
