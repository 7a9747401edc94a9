// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Query decomposition.
//!
//! [`KeywordDecomposer`] is the deterministic baseline: it splits a query on
//! clause punctuation and coordinating words, then tags every fragment with
//! the first specialty whose keywords it mentions.

use archive_core::domain::archive_config::SwarmConfig;

use crate::domain::task::SubtaskSpec;

/// Specialty given to fragments that mention none of the keyword tables.
pub const DEFAULT_SPECIALTY: &str = "synthesis";

/// Specialty keyword table, in matching priority order. A word matches a
/// keyword when it starts with it.
pub const SPECIALTIES: &[(&str, &[&str])] = &[
    (
        "character-development",
        &["character", "hero", "villain", "protagonist", "motivation", "personality"],
    ),
    (
        "world-building",
        &["world", "location", "place", "city", "map", "geography", "realm"],
    ),
    (
        "dialogue",
        &["dialogue", "conversation", "speech", "says", "voice", "talk"],
    ),
    (
        "plot-structure",
        &["plot", "story", "arc", "chapter", "scene", "twist", "pacing"],
    ),
    (
        "thematic-analysis",
        &["theme", "meaning", "symbol", "motif", "metaphor"],
    ),
    (
        "lore-keeping",
        &["lore", "history", "legend", "myth", "origin", "timeline"],
    ),
    (
        "emotional-resonance",
        &["emotion", "feel", "mood", "tone", "tension"],
    ),
    (
        "continuity",
        &["continuity", "consistent", "contradiction", "canon", "check"],
    ),
    (
        "research",
        &["research", "fact", "source", "reference", "compare", "find"],
    ),
    (
        DEFAULT_SPECIALTY,
        &["summarize", "summary", "combine", "overall", "synthesize"],
    ),
];

const SPLIT_PUNCTUATION: &[char] = &[';', ',', '?', '.'];
const SPLIT_WORDS: &[&str] = &["and", "then", "also", "but", "while", "plus"];

/// Turns a query into ordered subtasks.
pub trait QueryDecomposer: Send + Sync {
    /// `query` is already trimmed and non-empty.
    fn decompose(&self, query: &str) -> Vec<SubtaskSpec>;
}

#[derive(Debug, Clone)]
pub struct KeywordDecomposer {
    max_subtasks: usize,
}

impl KeywordDecomposer {
    pub fn new(max_subtasks: usize) -> Self {
        Self {
            max_subtasks: max_subtasks.max(1),
        }
    }

    pub fn from_config(config: &SwarmConfig) -> Self {
        Self::new(config.max_subtasks)
    }

    pub fn max_subtasks(&self) -> usize {
        self.max_subtasks
    }

    fn fragments(query: &str) -> Vec<String> {
        let mut fragments = Vec::new();

        for clause in query.split(SPLIT_PUNCTUATION) {
            let mut words: Vec<&str> = Vec::new();
            for word in clause.split_whitespace() {
                if SPLIT_WORDS.contains(&normalize(word).as_str()) {
                    push_fragment(&mut fragments, &mut words);
                } else {
                    words.push(word);
                }
            }
            push_fragment(&mut fragments, &mut words);
        }

        fragments
    }
}

impl Default for KeywordDecomposer {
    fn default() -> Self {
        Self::from_config(&SwarmConfig::default())
    }
}

impl QueryDecomposer for KeywordDecomposer {
    fn decompose(&self, query: &str) -> Vec<SubtaskSpec> {
        let query = query.trim();
        let mut fragments = Self::fragments(query);

        if fragments.len() <= 1 {
            return vec![SubtaskSpec::new(query, classify(query))];
        }

        if fragments.len() > self.max_subtasks {
            let overflow = fragments.split_off(self.max_subtasks - 1);
            fragments.push(overflow.join("; "));
        }

        fragments
            .into_iter()
            .map(|fragment| {
                let specialty = classify(&fragment);
                SubtaskSpec::new(fragment, specialty)
            })
            .collect()
    }
}

/// Specialty for a piece of text, falling back to [`DEFAULT_SPECIALTY`].
pub fn classify(text: &str) -> &'static str {
    let words: Vec<String> = text.split_whitespace().map(normalize).collect();

    SPECIALTIES
        .iter()
        .find(|(_, keywords)| {
            words
                .iter()
                .any(|word| keywords.iter().any(|keyword| word.starts_with(keyword)))
        })
        .map(|(specialty, _)| *specialty)
        .unwrap_or(DEFAULT_SPECIALTY)
}

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn push_fragment(fragments: &mut Vec<String>, words: &mut Vec<&str>) {
    if !words.is_empty() {
        fragments.push(words.join(" "));
        words.clear();
    }
}
