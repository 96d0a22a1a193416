/*!
 * Glossary delta parsing.
 *
 * The provider returns a JSON array of term records, usually wrapped in
 * a fenced code block. Individual records missing required fields are
 * dropped, not fatal; only a payload with no parseable array at all
 * fails the attempt. Duplicates are collapsed case-insensitively, both
 * within one response and against the persistent glossary, which keeps
 * re-processing a chapter idempotent.
 */

use log::{debug, warn};
use serde::Deserialize;

use crate::errors::ValidationError;
use crate::memory::models::{Glossary, GlossaryEntry};

/// Raw term record as the provider emits it; fields are validated
/// before promotion to a `GlossaryEntry`
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

/// Strip a fenced code block (``` or ```json) from around a payload
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse a glossary delta response into validated entries.
///
/// `existing` is the persistent glossary; terms already present there
/// (case-insensitive on source) are dropped so a re-run commits nothing
/// new. Within the response, the first occurrence of a source term wins.
pub fn parse_delta(raw: &str, existing: &Glossary) -> Result<Vec<GlossaryEntry>, ValidationError> {
    let payload = strip_code_fence(raw);
    let records: Vec<RawEntry> = serde_json::from_str(payload)
        .map_err(|e| ValidationError::MalformedGlossary(e.to_string()))?;

    let mut seen: Vec<String> = Vec::new();
    let mut entries = Vec::new();

    for record in records {
        let (Some(source), Some(target)) = (record.source, record.target) else {
            warn!("Glossary delta: dropping entry missing source/target");
            continue;
        };
        let source = source.trim().to_string();
        let target = target.trim().to_string();
        if source.is_empty() || target.is_empty() {
            warn!("Glossary delta: dropping entry with blank source/target");
            continue;
        }

        let key = source.to_lowercase();
        if seen.contains(&key) {
            debug!("Glossary delta: duplicate in response collapsed: {}", source);
            continue;
        }
        if existing.contains_source(&source) {
            debug!("Glossary delta: term already in glossary: {}", source);
            continue;
        }
        seen.push(key);

        let mut entry = GlossaryEntry::new(source, target);
        if let Some(kind) = record.kind {
            entry = entry.kind(kind);
        }
        if let Some(note) = record.note {
            if !note.trim().is_empty() {
                entry = entry.note(note);
            }
        }
        entries.push(entry);
    }

    debug!("Glossary delta: {} new terms", entries.len());
    Ok(entries)
}
