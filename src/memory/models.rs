/*!
 * Typed records for persistent narrative memory.
 *
 * Every entity the store persists has an explicit record type with its
 * required fields enforced at construction, so parsing code never needs
 * defensive field-presence checks.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One append-only glossary entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlossaryEntry {
    /// Source-language term
    pub source: String,

    /// Target-language rendering, the term only
    pub target: String,

    /// Entry kind (person, organization, concept, system)
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Optional clarification, kept outside the translation itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl GlossaryEntry {
    /// Create an entry; source and target are required
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: String::new(),
            note: None,
        }
    }

    /// Set the entry kind
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// The full glossary: an append-only list of entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Glossary {
    /// Entries in insertion order
    #[serde(default)]
    pub entries: Vec<GlossaryEntry>,
}

impl Glossary {
    /// Whether a source term is already present (case-insensitive)
    pub fn contains_source(&self, source: &str) -> bool {
        let lowered = source.to_lowercase();
        self.entries
            .iter()
            .any(|entry| entry.source.to_lowercase() == lowered)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the glossary has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A character's target-language pronoun record. Once locked, the value
/// is immutable for the rest of the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PronounLock {
    /// The pronoun used for every third-person reference
    pub default: String,

    /// Allowed variants (currently always the default alone)
    pub allowed: Vec<String>,

    /// Whether the pronoun is locked
    pub locked: bool,
}

impl PronounLock {
    /// Create an immediately locked pronoun record
    pub fn locked(pronoun: impl Into<String>) -> Self {
        let pronoun = pronoun.into();
        Self {
            allowed: vec![pronoun.clone()],
            default: pronoun,
            locked: true,
        }
    }
}

/// A tracked character with a locked pronoun
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Character {
    /// Character name, unique key within the roster
    pub name: String,

    /// Narrative role
    pub role: String,

    /// Short factual description
    pub description: String,

    /// Locked target-language pronoun
    pub pronoun: PronounLock,
}

impl Character {
    /// Create a character with an immediately locked pronoun
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        description: impl Into<String>,
        pronoun: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            description: description.into(),
            pronoun: PronounLock::locked(pronoun),
        }
    }
}

/// Structured full-document summary, overwritten wholesale each
/// narrative chapter
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummarySnapshot {
    /// Where and when the story takes place
    pub setting: String,

    /// One-line character descriptions
    #[serde(default)]
    pub characters: Vec<String>,

    /// Rules, places, systems of the world
    #[serde(default)]
    pub world_state: String,

    /// The story's initial premise
    pub initial_premise: String,

    /// Unresolved questions
    #[serde(default)]
    pub open_questions: Vec<String>,
}

impl SummarySnapshot {
    /// A snapshot with no content signals "nothing to update"
    pub fn is_empty(&self) -> bool {
        self.setting.trim().is_empty() && self.initial_premise.trim().is_empty()
    }
}

/// Monotonic record of fully committed chapter indices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Completed chapter indices, sorted
    #[serde(default)]
    pub done_chapters: BTreeSet<usize>,
}

impl Checkpoint {
    /// Whether the chapter is already committed
    pub fn contains(&self, chapter: usize) -> bool {
        self.done_chapters.contains(&chapter)
    }

    /// Record a chapter as committed
    pub fn mark_done(&mut self, chapter: usize) {
        self.done_chapters.insert(chapter);
    }

    /// Number of committed chapters
    pub fn len(&self) -> usize {
        self.done_chapters.len()
    }

    /// Whether no chapter has committed yet
    pub fn is_empty(&self) -> bool {
        self.done_chapters.is_empty()
    }
}

/// Everything one chapter commits in a single store transaction
#[derive(Debug, Clone, Default)]
pub struct ChapterDelta {
    /// Final rendered target-language blocks, cached for replay
    pub rendered_blocks: Vec<String>,

    /// New glossary terms observed this chapter, already deduplicated
    /// against the persistent glossary
    pub glossary_delta: Vec<GlossaryEntry>,

    /// Full summary snapshot; `None` means no update was produced
    pub summary_snapshot: Option<SummarySnapshot>,

    /// Full character roster snapshot; `None` means no update
    pub character_snapshot: Option<Vec<Character>>,
}
