//! Deduplication and packing of scored fragments into a bounded text budget

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;

use crate::config::ExtractionConfig;
use crate::fragment::{Category, ScoredFragment};
use crate::normalize::{char_len, dedup_key, take_chars};

/// Returned when nothing survives selection
pub const NO_CONTENT: &str = "No relevant content found on this page.";

/// Joins category blocks in the packed output
pub const CATEGORY_SEPARATOR: &str = "\n\n---\n\n";

/// Joins sections inside one category block
const SECTION_JOIN: &str = "\n\n";

const ELLIPSIS: &str = "...";

/// Budget charged for the joiner in front of every section after the first.
/// Uses the widest joiner so the rendered output can never exceed the budget.
const JOIN_OVERHEAD: usize = CATEGORY_SEPARATOR.len();

/// Sections of a single category, in selection order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBlock {
    pub category: Category,
    pub sections: Vec<String>,
}

impl CategoryBlock {
    pub fn text(&self) -> String {
        self.sections.join(SECTION_JOIN)
    }
}

/// Packed page content, grouped by category in output order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackedContent {
    pub blocks: Vec<CategoryBlock>,
}

impl PackedContent {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render as a single string, or the no-content sentinel
    pub fn render(&self) -> String {
        if self.blocks.is_empty() {
            return NO_CONTENT.to_string();
        }
        self.blocks
            .iter()
            .map(CategoryBlock::text)
            .collect::<Vec<_>>()
            .join(CATEGORY_SEPARATOR)
    }
}

/// Sort descending by score. Tie order is unspecified.
pub fn sort_by_score(fragments: &mut [ScoredFragment]) {
    fragments.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// Keep the first fragment per near-duplicate key, walking in the given order
pub fn deduplicate(fragments: Vec<ScoredFragment>, key_length: usize) -> Vec<ScoredFragment> {
    let mut seen = HashSet::new();
    fragments
        .into_iter()
        .filter(|scored| seen.insert(dedup_key(&scored.fragment.text, key_length)))
        .collect()
}

/// Shorten text to at most `max_len` characters, preferring a sentence end,
/// then a word boundary, then a hard cut
pub fn truncate_section(text: &str, max_len: usize, config: &ExtractionConfig) -> String {
    if char_len(text) <= max_len {
        return text.to_string();
    }
    if max_len <= ELLIPSIS.len() {
        return take_chars(text, max_len).to_string();
    }

    let prefix = take_chars(text, max_len);
    if config.prefer_sentence_boundary {
        if let Some(idx) = prefix.rfind('.') {
            let position = char_len(&prefix[..idx]);
            if position as f64 > max_len as f64 * config.sentence_cut_ratio {
                return prefix[..=idx].to_string();
            }
        }
    }

    // Leave room for the ellipsis on word and hard cuts
    let room = take_chars(text, max_len - ELLIPSIS.len());
    if let Some(idx) = room.rfind(' ') {
        let position = char_len(&room[..idx]);
        if position as f64 > max_len as f64 * config.word_cut_ratio {
            return format!("{}{}", &room[..idx], ELLIPSIS);
        }
    }

    format!("{}{}", room, ELLIPSIS)
}

/// Cut to exactly `max_len` characters ending in an ellipsis
fn hard_truncate(text: &str, max_len: usize) -> String {
    if char_len(text) <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(ELLIPSIS.len());
    format!("{}{}", take_chars(text, keep), ELLIPSIS)
}

/// Sort, deduplicate and greedily pack fragments into the content budget
pub fn pack_fragments(fragments: Vec<ScoredFragment>, config: &ExtractionConfig) -> PackedContent {
    let mut sorted = fragments;
    sort_by_score(&mut sorted);
    let unique = deduplicate(sorted, config.dedup_key_length);

    let mut selected: Vec<(Category, String)> = Vec::new();
    let mut total = 0usize;

    for scored in unique {
        let section = truncate_section(&scored.fragment.text, config.max_section_length, config);
        if section.is_empty() {
            continue;
        }

        let joiner = if selected.is_empty() { 0 } else { JOIN_OVERHEAD };
        let cost = char_len(&section) + joiner;
        if total + cost <= config.max_content_length {
            selected.push((scored.fragment.category, section));
            total += cost;
            continue;
        }

        let remaining = config.max_content_length.saturating_sub(total);
        let room = remaining.saturating_sub(joiner);
        if remaining > config.min_tail_budget && room > ELLIPSIS.len() {
            let tail = hard_truncate(&section, room);
            selected.push((scored.fragment.category, tail));
        }
        break;
    }

    let blocks = Category::OUTPUT_ORDER
        .iter()
        .filter_map(|category| {
            let sections: Vec<String> = selected
                .iter()
                .filter(|(c, _)| c == category)
                .map(|(_, text)| text.clone())
                .collect();
            (!sections.is_empty()).then(|| CategoryBlock {
                category: *category,
                sections,
            })
        })
        .collect();

    PackedContent { blocks }
}

/// Pack fragments and render the bounded text
pub fn pack(fragments: Vec<ScoredFragment>, config: &ExtractionConfig) -> String {
    pack_fragments(fragments, config).render()
}
