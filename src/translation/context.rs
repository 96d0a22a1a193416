/*!
 * Ephemeral per-chapter state.
 *
 * Holds the rolling window of already-translated chunks used as
 * generation context, the glossary delta observed this chapter, and the
 * pending summary/character snapshots. Everything here is discarded at
 * the chapter boundary; only `ChapterDelta` survives into the commit.
 */

use std::collections::VecDeque;

use log::debug;

use crate::errors::ValidationError;
use crate::memory::models::{ChapterDelta, Character, GlossaryEntry, SummarySnapshot};

/// Prompt-template artifacts that must never leak into stored context.
/// A block carrying one of these would poison every later request that
/// includes it as rolling context.
const CONTAMINATION_MARKERS: [&str; 4] = ["ORIGINAL:", "DRAFT:", "<<<BLOCK:", "<<<END>>>"];

/// In-memory state for the chapter currently being translated
#[derive(Debug, Default)]
pub struct ChapterContext {
    /// Most recent translated chunks, oldest first
    translated_chunks: VecDeque<Vec<String>>,

    /// Maximum number of chunks retained
    max_chunks: usize,

    /// New glossary terms observed this chapter
    glossary_delta: Vec<GlossaryEntry>,

    /// Pending full summary snapshot
    summary_snapshot: Option<SummarySnapshot>,

    /// Pending full character roster snapshot
    character_snapshot: Option<Vec<Character>>,
}

impl ChapterContext {
    /// Create a context retaining up to `max_chunks` translated chunks
    pub fn new(max_chunks: usize) -> Self {
        Self {
            max_chunks,
            ..Default::default()
        }
    }

    /// Store one translated chunk for rolling context, evicting the
    /// oldest chunk past the window size. Rejects blocks that carry
    /// prompt labeling artifacts.
    pub fn push_chunk(&mut self, chunk: Vec<String>) -> Result<(), ValidationError> {
        if chunk.is_empty() {
            return Ok(());
        }
        for block in &chunk {
            for marker in CONTAMINATION_MARKERS {
                if block.contains(marker) {
                    return Err(ValidationError::Contamination(marker.to_string()));
                }
            }
        }
        self.translated_chunks.push_back(chunk);
        while self.translated_chunks.len() > self.max_chunks {
            self.translated_chunks.pop_front();
        }
        debug!(
            "Chapter context: stored chunk, window={}",
            self.translated_chunks.len()
        );
        Ok(())
    }

    /// Up to `max_blocks` most recent translated blocks, flattened, in
    /// original chronological order. Read-only context for the next
    /// request, never translation input.
    pub fn last_blocks(&self, max_blocks: usize) -> Vec<String> {
        if max_blocks == 0 || self.translated_chunks.is_empty() {
            return Vec::new();
        }
        let mut reversed: Vec<String> = Vec::new();
        for chunk in self.translated_chunks.iter().rev() {
            for block in chunk.iter().rev() {
                reversed.push(block.clone());
                if reversed.len() >= max_blocks {
                    reversed.reverse();
                    return reversed;
                }
            }
        }
        reversed.reverse();
        reversed
    }

    /// Record new glossary terms for this chapter
    pub fn add_glossary_terms(&mut self, terms: Vec<GlossaryEntry>) {
        if terms.is_empty() {
            return;
        }
        debug!("Chapter context: glossary +{}", terms.len());
        self.glossary_delta.extend(terms);
    }

    /// The glossary delta observed so far this chapter
    pub fn glossary_delta(&self) -> &[GlossaryEntry] {
        &self.glossary_delta
    }

    /// Set the pending summary snapshot
    pub fn set_summary(&mut self, snapshot: SummarySnapshot) {
        self.summary_snapshot = Some(snapshot);
    }

    /// Set the pending character roster snapshot
    pub fn set_characters(&mut self, roster: Vec<Character>) {
        self.character_snapshot = Some(roster);
    }

    /// Number of chunks currently in the window
    pub fn window_len(&self) -> usize {
        self.translated_chunks.len()
    }

    /// Consume the context into the chapter's commit payload
    pub fn into_delta(self, rendered_blocks: Vec<String>) -> ChapterDelta {
        ChapterDelta {
            rendered_blocks,
            glossary_delta: self.glossary_delta,
            summary_snapshot: self.summary_snapshot,
            character_snapshot: self.character_snapshot,
        }
    }
}
