// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use regex::RegexBuilder;

use super::{EntityProvider, QueryRequest, ResultSink};
use crate::model::{EntityId, EntityRecord};

/// How the built-in provider matches query text against display names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Scored subsequence matching; best hits first.
    #[default]
    Fuzzy,
    /// Case-insensitive substring containment, in insertion order.
    Substring,
    /// The query text is a regular expression. An invalid pattern is
    /// reported as a provider failure.
    Regex,
}

/// In-memory entity source for demos and tests.
///
/// Answers synchronously through the sink. An empty query returns the full
/// list (capped at `limit`), which is what an initial fetch expects.
#[derive(Debug, Clone)]
pub struct FuzzyEntityProvider {
    entries: Vec<EntityRecord>,
    mode: MatchMode,
    limit: usize,
}

const DEFAULT_LIMIT: usize = 16;

impl FuzzyEntityProvider {
    pub fn new(entries: Vec<EntityRecord>) -> Self {
        Self {
            entries,
            mode: MatchMode::default(),
            limit: DEFAULT_LIMIT,
        }
    }

    /// Convenience for fixture data: `(id, display name)` pairs.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(id, name)| {
                EntityRecord::new(EntityId::new(id).expect("fixture entity id"), name)
            })
            .collect();
        Self::new(entries)
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn matches(&self, needle: &str) -> Result<Vec<EntityRecord>, ()> {
        if needle.is_empty() {
            return Ok(self.entries.iter().take(self.limit).cloned().collect());
        }
        match self.mode {
            MatchMode::Fuzzy => {
                let mut scored: Vec<(i64, &EntityRecord)> = self
                    .entries
                    .iter()
                    .filter_map(|entry| {
                        fuzzy_score(needle, entry.display_name()).map(|score| (score, entry))
                    })
                    .collect();
                scored.sort_by(|a, b| {
                    b.0.cmp(&a.0)
                        .then_with(|| a.1.display_name().cmp(b.1.display_name()))
                });
                Ok(scored
                    .into_iter()
                    .take(self.limit)
                    .map(|(_, entry)| entry.clone())
                    .collect())
            }
            MatchMode::Substring => {
                let needle_lower = needle.to_lowercase();
                Ok(self
                    .entries
                    .iter()
                    .filter(|entry| entry.display_name().to_lowercase().contains(&needle_lower))
                    .take(self.limit)
                    .cloned()
                    .collect())
            }
            MatchMode::Regex => {
                let regex = RegexBuilder::new(needle)
                    .case_insensitive(true)
                    .build()
                    .map_err(|_| ())?;
                Ok(self
                    .entries
                    .iter()
                    .filter(|entry| regex.is_match(entry.display_name()))
                    .take(self.limit)
                    .cloned()
                    .collect())
            }
        }
    }
}

impl EntityProvider for FuzzyEntityProvider {
    fn query(&self, request: &QueryRequest, sink: ResultSink) {
        match self.matches(request.text()) {
            Ok(entities) => sink.finish(entities),
            Err(()) => sink.fail(),
        }
    }
}

/// Score a case-insensitive subsequence match, higher is better. `None`
/// when `needle` is not a subsequence of `haystack` at all.
fn fuzzy_score(needle: &str, haystack: &str) -> Option<i64> {
    let needle = needle.trim();
    if needle.is_empty() {
        return None;
    }
    let needle_lower = needle.to_lowercase();
    let haystack_lower = haystack.to_lowercase();

    if !is_subsequence(&needle_lower, &haystack_lower) {
        return None;
    }

    let ratio = rapidfuzz::fuzz::ratio(needle_lower.chars(), haystack_lower.chars());
    let mut score = (ratio * 1000.0).round() as i64;
    if haystack_lower.contains(&needle_lower) {
        score += 2000;
    }
    if haystack_lower.starts_with(&needle_lower) {
        score += 1000;
    }
    // Word-boundary starts beat mid-word hits of equal ratio.
    if haystack_lower
        .split_whitespace()
        .any(|word| word.starts_with(&needle_lower))
    {
        score += 500;
    }
    Some(score)
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = needle.chars().peekable();
    for ch in haystack.chars() {
        match chars.peek() {
            Some(&want) if want == ch => {
                chars.next();
            }
            Some(_) => {}
            None => return true,
        }
    }
    chars.peek().is_none()
}
