/*!
 * Token-budgeted batch sizing.
 *
 * A naive fixed-size chunker either wastes requests on tiny batches or
 * overruns the provider's output ceiling, which silently truncates the
 * response mid-block. This chunker projects the output size of each
 * candidate batch with a cheap local estimate and only pays for an
 * exact provider-side token count once the projection nears the ceiling.
 */

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::app_config::ChunkingConfig;
use crate::providers::GenerationProvider;

/// Sizes translation batches under the provider's output-token ceiling
pub struct TokenBudgetChunker {
    /// Provider used for exact token counts and limit lookups
    provider: Arc<dyn GenerationProvider>,

    /// Tuning parameters
    config: ChunkingConfig,

    /// Output-token limits cached per model after first lookup
    limit_cache: Mutex<HashMap<String, u32>>,
}

impl TokenBudgetChunker {
    /// Create a chunker backed by the given provider
    pub fn new(provider: Arc<dyn GenerationProvider>, config: ChunkingConfig) -> Self {
        Self {
            provider,
            config,
            limit_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Output-token limit for a model, cached after the first lookup.
    /// Lookup failure falls back to the configured default ceiling.
    async fn model_limit(&self, model: &str) -> u32 {
        if let Some(limit) = self.limit_cache.lock().get(model) {
            return *limit;
        }
        let limit = match self.provider.output_token_limit(model).await {
            Ok(limit) => {
                debug!("Model {} output token limit: {}", model, limit);
                limit
            }
            Err(e) => {
                warn!(
                    "Could not fetch output token limit for {}: {}. Using default {}",
                    model, e, self.config.fallback_output_token_limit
                );
                self.config.fallback_output_token_limit
            }
        };
        self.limit_cache.lock().insert(model.to_string(), limit);
        limit
    }

    /// Number of leading blocks from `remaining` that fit in one request.
    ///
    /// `static_context_len` is the character length of the fixed prompt
    /// scaffolding (rules, summary, rolling context) sent alongside the
    /// blocks. Always returns at least 1 when blocks remain, so the
    /// pipeline makes forward progress even on an oversized block.
    pub async fn next_batch_size(
        &self,
        remaining: &[String],
        static_context_len: usize,
        model: &str,
    ) -> usize {
        if remaining.is_empty() {
            return 0;
        }

        let raw_limit = self.model_limit(model).await;
        let safe_limit = (raw_limit as f64 * self.config.safety_factor).floor();
        let exact_check_threshold = safe_limit * self.config.exact_count_threshold;
        let base_input_est = static_context_len as f64 / self.config.chars_per_token;

        let mut est_tokens = 0.0;
        let mut taken = 0usize;
        let mut accumulated = String::new();

        for block in remaining {
            if taken >= self.config.max_blocks_per_request {
                break;
            }

            let block_est = block.chars().count() as f64 / self.config.chars_per_token;
            let projected_output = (est_tokens + block_est) * self.config.expansion_ratio;

            if projected_output > exact_check_threshold {
                // Near the ceiling: trust only an exact count.
                let candidate = if accumulated.is_empty() {
                    block.clone()
                } else {
                    format!("{}\n{}", accumulated, block)
                };
                match self.provider.count_tokens(model, &candidate).await {
                    Ok(real_input) => {
                        let real_projected =
                            (real_input as f64 + base_input_est) * self.config.expansion_ratio;
                        if real_projected > safe_limit {
                            debug!(
                                "Chunk cut (exact count): projected output {:.0} > {:.0}",
                                real_projected, safe_limit
                            );
                            break;
                        }
                    }
                    Err(e) => {
                        // Counting failed; trust the estimate and stop
                        // on the safe side.
                        warn!("Token count call failed: {}", e);
                        if projected_output > safe_limit {
                            break;
                        }
                    }
                }
            }

            est_tokens += block_est;
            if !accumulated.is_empty() {
                accumulated.push('\n');
            }
            accumulated.push_str(block);
            taken += 1;
        }

        taken.max(1)
    }
}
