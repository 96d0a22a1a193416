/*!
 * JSON-file backed persistent memory store.
 *
 * One store directory holds glossary.json, summary.json, characters.json,
 * checkpoint.json and a cache/ subdirectory with the rendered output of
 * each committed chapter. Writes go through a temp file and an atomic
 * rename; a failed write aborts the chapter before the checkpoint moves.
 *
 * Single-writer discipline is assumed: one pipeline instance per store.
 */

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::StoreError;
use crate::memory::models::{ChapterDelta, Character, Checkpoint, Glossary, SummarySnapshot};

const GLOSSARY_FILE: &str = "glossary.json";
const SUMMARY_FILE: &str = "summary.json";
const CHARACTERS_FILE: &str = "characters.json";
const CHECKPOINT_FILE: &str = "checkpoint.json";
const CACHE_DIR: &str = "cache";

/// Durable store for cross-chapter narrative memory
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Root directory of the store
    root: PathBuf,
}

impl MemoryStore {
    /// Open (and create if needed) a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join(CACHE_DIR)).map_err(|source| StoreError::Io {
            path: root.join(CACHE_DIR).display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    /// The store's root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_path(&self, chapter: usize) -> PathBuf {
        self.root
            .join(CACHE_DIR)
            .join(format!("chapter_{:04}.json", chapter))
    }

    fn load_json<T: DeserializeOwned>(&self, file: &str, default: T) -> Result<T, StoreError> {
        let path = self.root.join(file);
        if !path.exists() {
            debug!("State init: {}", file);
            return Ok(default);
        }
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    fn save_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let path = self.root.join(file);
        Self::write_atomic(&path, value)
    }

    fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|source| StoreError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!("State saved: {}", path.display());
        Ok(())
    }

    /// Load the glossary, empty when none exists yet
    pub fn load_glossary(&self) -> Result<Glossary, StoreError> {
        self.load_json(GLOSSARY_FILE, Glossary::default())
    }

    /// Load the summary; `None` before the first narrative chapter commits
    pub fn load_summary(&self) -> Result<Option<SummarySnapshot>, StoreError> {
        self.load_json(SUMMARY_FILE, None)
    }

    /// Load the character roster, empty when none exists yet
    pub fn load_characters(&self) -> Result<Vec<Character>, StoreError> {
        self.load_json(CHARACTERS_FILE, Vec::new())
    }

    /// Load the checkpoint, empty on a fresh run
    pub fn load_checkpoint(&self) -> Result<Checkpoint, StoreError> {
        let checkpoint: Checkpoint = self.load_json(CHECKPOINT_FILE, Checkpoint::default())?;
        if checkpoint.is_empty() {
            debug!("Checkpoint: none found (fresh run)");
        } else {
            info!("Checkpoint: {} chapters already committed", checkpoint.len());
        }
        Ok(checkpoint)
    }

    /// Load the cached rendered output of a committed chapter
    pub fn load_cached_chapter(&self, chapter: usize) -> Result<Vec<String>, StoreError> {
        let path = self.cache_path(chapter);
        if !path.exists() {
            return Err(StoreError::MissingCache(chapter));
        }
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Commit one chapter's durable state.
    ///
    /// Order matters: the rendered cache and memory files are written
    /// before the checkpoint advances, so an interrupted commit is
    /// re-run in full on the next pass. The glossary delta is appended
    /// as-is; deduplication against existing source terms is the
    /// caller's responsibility.
    pub fn commit(&self, chapter: usize, delta: &ChapterDelta) -> Result<(), StoreError> {
        info!("State commit: chapter {}", chapter);

        Self::write_atomic(&self.cache_path(chapter), &delta.rendered_blocks)?;

        if delta.glossary_delta.is_empty() {
            debug!("State commit: no glossary delta");
        } else {
            let mut glossary = self.load_glossary()?;
            glossary.entries.extend(delta.glossary_delta.iter().cloned());
            self.save_json(GLOSSARY_FILE, &glossary)?;
        }

        match &delta.summary_snapshot {
            Some(snapshot) if !snapshot.is_empty() => {
                self.save_json(SUMMARY_FILE, &Some(snapshot.clone()))?;
            }
            Some(_) => debug!("State commit: summary snapshot empty, previous value retained"),
            None => debug!("State commit: no summary snapshot"),
        }

        match &delta.character_snapshot {
            Some(roster) if !roster.is_empty() => {
                self.save_json(CHARACTERS_FILE, roster)?;
            }
            Some(_) => debug!("State commit: character snapshot empty, previous value retained"),
            None => debug!("State commit: no character snapshot"),
        }

        let mut checkpoint = self.load_checkpoint()?;
        checkpoint.mark_done(chapter);
        self.save_json(CHECKPOINT_FILE, &checkpoint)?;
        info!("Checkpoint: marked chapter {} done", chapter);
        Ok(())
    }
}
