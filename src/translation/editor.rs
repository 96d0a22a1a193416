/*!
 * Editor continuation protocol.
 *
 * A second pass over a fully translated chapter, polishing style under
 * the same block-count/order contract as translation. Long chapters make
 * truncated responses routine here, so the protocol is resumable: it
 * keeps the well-formed blocks a truncated response did deliver,
 * advances past them, and requests only the remaining suffix. Editing is
 * best-effort - when the retry budget runs out, the missing suffix keeps
 * the pre-edit draft verbatim instead of failing the chapter.
 */

use std::sync::Arc;

use log::{info, warn};

use crate::app_config::EditorConfig;
use crate::providers::GenerationRequest;
use crate::translation::call_layer::ResilientCaller;
use crate::translation::prompts;

/// Recover well-formed `<<<BLOCK:N>>> ... <<<END>>>` segments from a
/// response, starting at `start_block`, stopping at the first missing,
/// truncated, or empty block. Returns the recovered texts in order.
pub fn recover_edited_blocks(response: &str, start_block: usize, batch_len: usize) -> Vec<String> {
    let mut recovered = Vec::new();
    let mut position = 0usize;

    for offset in 0..batch_len {
        let block_number = start_block + offset;
        let start_marker = format!("<<<BLOCK:{}>>>", block_number);
        let end_marker = "<<<END>>>";

        let Some(found) = response[position..].find(&start_marker) else {
            break;
        };
        let content_start = position + found + start_marker.len();

        let Some(end_found) = response[content_start..].find(end_marker) else {
            // Truncated mid-block; everything before this point is kept.
            warn!("Editor: block {} truncated, stopping batch here", block_number);
            break;
        };
        let content_end = content_start + end_found;

        let content = response[content_start..content_end].trim();
        if content.is_empty() {
            // An empty edit must never replace a non-empty draft; stop
            // here so the draft fills this block.
            warn!("Editor: block {} came back empty, stopping batch here", block_number);
            break;
        }

        recovered.push(content.to_string());
        position = content_end + end_marker.len();
    }

    recovered
}

/// Best-effort stylistic refinement pass
pub struct Editor {
    /// Provider chain shared with the rest of the pipeline
    caller: Arc<ResilientCaller>,
    /// Editor tuning
    config: EditorConfig,
    /// Target language name for prompts
    target_language: String,
}

impl Editor {
    /// Create an editor over the given provider chain
    pub fn new(caller: Arc<ResilientCaller>, config: EditorConfig, target_language: impl Into<String>) -> Self {
        Self {
            caller,
            config,
            target_language: target_language.into(),
        }
    }

    /// Edit a chapter's draft blocks against their originals.
    ///
    /// Always returns exactly `originals.len()` blocks: edited where the
    /// provider delivered well-formed output, the pre-edit draft for any
    /// suffix left after the continuation budget is spent.
    pub async fn edit_chapter(
        &self,
        originals: &[String],
        drafts: &[String],
        glossary_text: &str,
    ) -> Vec<String> {
        debug_assert_eq!(originals.len(), drafts.len());
        let total = originals.len();
        info!("Editor: start chapter edit, blocks={}", total);

        let mut collected: Vec<String> = Vec::with_capacity(total);
        let mut outer_attempts: u32 = 0;

        while collected.len() < total && outer_attempts < self.config.max_outer_retries {
            outer_attempts += 1;
            let start_block = collected.len() + 1;
            let batch_originals = &originals[collected.len()..];
            let batch_drafts = &drafts[collected.len()..];

            let request = GenerationRequest::new(prompts::editor_batch_prompt(
                glossary_text,
                start_block,
                batch_originals,
                batch_drafts,
                &self.target_language,
            ))
            .system(prompts::editor_system_prompt(&self.target_language))
            .temperature(self.config.temperature);

            let response = match self.caller.execute(&request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Editor: provider chain exhausted ({}), falling back to draft", e);
                    break;
                }
            };

            let recovered = recover_edited_blocks(&response.text, start_block, batch_originals.len());
            if recovered.is_empty() {
                warn!(
                    "Editor: batch returned no well-formed blocks (attempt {}/{})",
                    outer_attempts, self.config.max_outer_retries
                );
                continue;
            }

            info!(
                "Editor: batch done, got {} blocks, progress {}/{}",
                recovered.len(),
                collected.len() + recovered.len(),
                total
            );
            collected.extend(recovered);
            // A batch that made progress resets the continuation budget.
            outer_attempts = 0;
        }

        if collected.len() < total {
            warn!(
                "Editor: filling {} missing blocks with draft text",
                total - collected.len()
            );
            collected.extend(drafts[collected.len()..].iter().cloned());
        }

        info!("Editor: done, blocks={}", collected.len());
        collected
    }
}
