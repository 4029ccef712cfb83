// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

use galatea::model::{EntityId, MentionRange, ResolvedMention, TextBuffer};
use galatea::registry::MentionRegistry;

/// Deterministic prose: `sentences` copies of a fixed sentence ending in an
/// explicit mention trigger, so a scan at the end always has work to do.
pub fn prose_with_trailing_trigger(sentences: usize) -> TextBuffer {
    let mut text = String::new();
    for idx in 0..sentences {
        text.push_str("the pod bay doors stay closed no matter who asks ");
        if idx % 7 == 0 {
            text.push_str("according to mission control ");
        }
    }
    text.push_str("@dav");
    TextBuffer::with_text(text)
}

/// A registry with `count` fixed-width mentions spaced evenly from
/// `first_start`, matching nothing in particular in the buffer text.
pub fn registry_with_mentions(count: usize, first_start: usize, stride: usize) -> MentionRegistry {
    let mut registry = MentionRegistry::new();
    for idx in 0..count {
        let start = first_start + idx * stride;
        let mention = ResolvedMention::new(
            MentionRange::new(start, start + 5),
            EntityId::new(format!("bench:entity:{idx:04}")).expect("entity id"),
            "bench",
        );
        registry.insert(mention).expect("non-overlapping fixture");
    }
    registry
}
