/*!
 * Structural validation of provider responses.
 *
 * The provider returns free text; all structure is imposed here. A
 * translation response must contain exactly one `[i]`-marked segment per
 * input block, in order, with no empty segments. Violations fail the
 * attempt and propagate into the call layer's retry/fallback chain.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ValidationError;

/// Matches one `[i]` marker; the segment text runs from the end of the
/// marker to the start of the next marker or the end of the response
static BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d+)\]").unwrap_or_else(|e| panic!("{}", e))
});

/// Parse an indexed response into ordered target blocks.
///
/// Enforces, in this order:
/// 1. at least one recognizable marker (else the response is garbage),
/// 2. parsed count equals `expected`,
/// 3. marker `i` sits at position `i` (1-based),
/// 4. no block is empty after trimming.
pub fn parse_indexed_blocks(raw: &str, expected: usize) -> Result<Vec<String>, ValidationError> {
    let mut blocks = Vec::with_capacity(expected);
    let mut markers = Vec::with_capacity(expected);

    let mut segment_spans = Vec::with_capacity(expected);
    for captures in BLOCK_PATTERN.captures_iter(raw) {
        let marker: usize = captures[1]
            .parse()
            .map_err(|_| ValidationError::MissingMarkers)?;
        markers.push(marker);
        let whole = captures.get(0).expect("match always has group 0");
        if let Some((_, prev_end)) = segment_spans.last_mut() {
            *prev_end = whole.start();
        }
        segment_spans.push((whole.end(), raw.len()));
    }
    for (start, end) in segment_spans {
        blocks.push(raw[start..end].trim().to_string());
    }

    if blocks.is_empty() {
        return Err(ValidationError::MissingMarkers);
    }

    if blocks.len() != expected {
        return Err(ValidationError::BlockCountMismatch {
            expected,
            actual: blocks.len(),
        });
    }

    for (position, marker) in markers.iter().enumerate() {
        if *marker != position + 1 {
            return Err(ValidationError::BlockOrderViolation {
                position: position + 1,
                marker: *marker,
            });
        }
    }

    for (index, block) in blocks.iter().enumerate() {
        if block.is_empty() {
            return Err(ValidationError::EmptyBlock(index + 1));
        }
    }

    Ok(blocks)
}

/// Number the source blocks for a translation request, 1-based
pub fn number_blocks(blocks: &[String]) -> String {
    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| format!("[{}] {}", i + 1, block))
        .collect::<Vec<_>>()
        .join("\n")
}
