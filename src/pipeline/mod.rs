/*!
 * Chapter-atomic pipeline.
 *
 * The orchestrator drives each chapter through a fixed stage sequence
 * (classify, extract terms, translate, update memory, edit, rebuild,
 * commit) and never advances the checkpoint past a chapter that failed
 * any stage. Chapters run strictly in document order because narrative
 * memory has a sequential dependency.
 */

pub mod classifier;
pub mod orchestrator;

use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::app_config::{Config, TranslationProvider};
use crate::providers::gemini::Gemini;
use crate::providers::openai::OpenAI;
use crate::translation::call_layer::CallCandidate;

pub use classifier::{classify_chapter, ChapterKind};
pub use orchestrator::{ChapterOrchestrator, RunReport};

/// Build the ordered fallback chain from configuration:
/// primary model, then its fallback model, then the alternate provider,
/// then the alternate provider in safe mode.
pub fn provider_chain(config: &Config) -> Result<Vec<CallCandidate>> {
    let gemini_config = config
        .get_provider_config(&TranslationProvider::Gemini)
        .ok_or_else(|| anyhow!("No Gemini provider configured"))?;

    let gemini = Arc::new(Gemini::new(
        Config::resolve_api_key(&gemini_config.api_key),
        gemini_config.endpoint.clone(),
        gemini_config.timeout_secs,
    ));

    let mut candidates = vec![CallCandidate::new(
        gemini.clone(),
        gemini_config.model.clone(),
    )];
    if !gemini_config.fallback_model.is_empty() {
        candidates.push(CallCandidate::new(
            gemini,
            gemini_config.fallback_model.clone(),
        ));
    }

    if let Some(openai_config) = config.get_provider_config(&TranslationProvider::OpenAI) {
        let openai = Arc::new(OpenAI::new(
            Config::resolve_api_key(&openai_config.api_key),
            openai_config.endpoint.clone(),
            openai_config.timeout_secs,
            config.chunking.fallback_output_token_limit,
        ));
        candidates.push(CallCandidate::new(openai.clone(), openai_config.model.clone()));
        candidates.push(CallCandidate::sanitized(openai, openai_config.model.clone()));
    }

    Ok(candidates)
}
