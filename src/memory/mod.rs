/*!
 * Persistent narrative memory.
 *
 * This module owns all durable cross-chapter state: the append-only
 * terminology glossary, the overwritable story summary and character
 * roster, the chapter-completion checkpoint, and the per-chapter
 * rendered-output cache used for checkpoint replay.
 */

pub mod models;
pub mod store;

pub use models::{
    ChapterDelta, Character, Checkpoint, Glossary, GlossaryEntry, PronounLock, SummarySnapshot,
};
pub use store::MemoryStore;
