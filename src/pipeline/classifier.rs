/*!
 * Chapter classification.
 *
 * Front matter (anything before the configured first-narrative index)
 * and empty chapters are NON_NARRATIVE. The first non-empty chapter at
 * or past that index is FIRST_NARRATIVE and seeds the summary/character
 * memory; every later non-empty chapter is NARRATIVE. Classification is
 * assigned once: on resume, a chapter that already seeded memory is
 * never reclassified.
 */

use serde::{Deserialize, Serialize};

/// Classification of one chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChapterKind {
    /// Front matter or empty chapter; translated literally, no memory
    NonNarrative,
    /// First narrative chapter; initializes summary and roster
    FirstNarrative,
    /// Subsequent narrative chapter; updates summary and roster
    Narrative,
}

impl ChapterKind {
    /// Whether this chapter participates in narrative memory
    pub fn is_narrative(&self) -> bool {
        !matches!(self, Self::NonNarrative)
    }
}

impl std::fmt::Display for ChapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NonNarrative => "NON_NARRATIVE",
            Self::FirstNarrative => "FIRST_NARRATIVE",
            Self::Narrative => "NARRATIVE",
        };
        write!(f, "{}", name)
    }
}

/// Classify one chapter
pub fn classify_chapter(
    chapter: usize,
    has_content: bool,
    first_narrative_index: usize,
    has_seen_narrative: bool,
) -> ChapterKind {
    if !has_content || chapter < first_narrative_index {
        return ChapterKind::NonNarrative;
    }
    if !has_seen_narrative {
        return ChapterKind::FirstNarrative;
    }
    ChapterKind::Narrative
}
