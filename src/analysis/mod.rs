/*!
 * Narrative analysis parsers.
 *
 * These modules impose structure on the free-text/JSON payloads the
 * provider returns for the memory-building stages:
 * - `glossary`: terminology delta extraction
 * - `characters`: roster parsing and the pronoun-lock merge
 * - `summary`: sectioned story-summary parsing
 */

pub mod characters;
pub mod glossary;
pub mod summary;
