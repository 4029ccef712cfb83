// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::edit::TextEdit;

/// The engine's view of the host text widget: current text plus cursor.
///
/// The buffer is deliberately dumb: it validates offsets, applies edits,
/// and emits the [`TextEdit`] deltas the rest of the engine keys off. Undo,
/// attributed runs and rendering stay on the host side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Cursor position as a byte offset; always on a char boundary.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_cursor(&mut self, offset: usize) -> Result<(), BufferError> {
        self.check_boundary(offset)?;
        self.cursor = offset;
        Ok(())
    }

    /// Replace `[start, end)` with `inserted`, emitting the delta and moving
    /// the cursor to the end of the inserted text (how editor widgets place
    /// the caret after typing, pasting or deleting).
    pub fn replace_range(
        &mut self,
        start: usize,
        end: usize,
        inserted: &str,
    ) -> Result<TextEdit, BufferError> {
        if start > end {
            return Err(BufferError::OutOfBounds {
                offset: start,
                len: self.text.len(),
            });
        }
        self.check_boundary(start)?;
        self.check_boundary(end)?;

        let edit = TextEdit::new(start, end, inserted);
        self.text.replace_range(start..end, inserted);
        self.cursor = start + inserted.len();
        Ok(edit)
    }

    pub fn insert(&mut self, offset: usize, inserted: &str) -> Result<TextEdit, BufferError> {
        self.replace_range(offset, offset, inserted)
    }

    pub fn delete(&mut self, start: usize, end: usize) -> Result<TextEdit, BufferError> {
        self.replace_range(start, end, "")
    }

    /// Slice of the buffer text; caller offsets must be valid boundaries.
    pub fn slice(&self, start: usize, end: usize) -> Result<&str, BufferError> {
        if start > end {
            return Err(BufferError::OutOfBounds {
                offset: start,
                len: self.text.len(),
            });
        }
        self.check_boundary(start)?;
        self.check_boundary(end)?;
        Ok(&self.text[start..end])
    }

    /// The char immediately preceding `offset`, if any.
    pub fn char_before(&self, offset: usize) -> Result<Option<char>, BufferError> {
        self.check_boundary(offset)?;
        Ok(self.text[..offset].chars().next_back())
    }

    fn check_boundary(&self, offset: usize) -> Result<(), BufferError> {
        if offset > self.text.len() {
            return Err(BufferError::OutOfBounds {
                offset,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(BufferError::NotCharBoundary { offset });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    OutOfBounds { offset: usize, len: usize },
    NotCharBoundary { offset: usize },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { offset, len } => {
                write!(f, "offset {offset} is out of bounds (len={len})")
            }
            Self::NotCharBoundary { offset } => {
                write!(f, "offset {offset} is not on a char boundary")
            }
        }
    }
}

impl std::error::Error for BufferError {}
