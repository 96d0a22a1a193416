/*!
 * Chapter orchestrator.
 *
 * Owns the per-chapter loop: checkpoint skip with cached replay,
 * classification, glossary extraction, chunked translation, narrative
 * memory update, editing, document rebuild and the atomic commit.
 * A chapter either commits in full or the run stops with the failing
 * chapter and stage named; the checkpoint never moves past a failure.
 */

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::analysis::{characters, glossary, summary};
use crate::app_config::Config;
use crate::document::DocumentSource;
use crate::errors::{ChapterFailure, ChapterStage, PipelineError, RunError};
use crate::memory::models::{Character, Glossary, GlossaryEntry, SummarySnapshot};
use crate::memory::store::MemoryStore;
use crate::pipeline::classifier::{classify_chapter, ChapterKind};
use crate::providers::GenerationRequest;
use crate::translation::call_layer::ResilientCaller;
use crate::translation::chunker::TokenBudgetChunker;
use crate::translation::context::ChapterContext;
use crate::translation::editor::Editor;
use crate::translation::prompts::{self, TranslationPromptInput};
use crate::translation::validator;

/// Outcome summary of one pipeline run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Chapters translated and committed during this run
    pub processed: Vec<usize>,

    /// Chapters already committed, replayed from cache
    pub skipped: Vec<usize>,

    /// Chapters with no translatable content
    pub empty: Vec<usize>,
}

impl RunReport {
    /// Total chapters visited
    pub fn total(&self) -> usize {
        self.processed.len() + self.skipped.len() + self.empty.len()
    }
}

/// Drives a document through the chapter-atomic pipeline
pub struct ChapterOrchestrator {
    /// Durable cross-chapter memory
    store: MemoryStore,

    /// Shared provider fallback chain
    caller: Arc<ResilientCaller>,

    /// Batch sizing against the primary model's output ceiling
    chunker: TokenBudgetChunker,

    /// Best-effort stylistic refinement pass
    editor: Editor,

    /// Application configuration
    config: Config,

    /// Primary model, used for token budgeting
    model: String,
}

impl ChapterOrchestrator {
    /// Create an orchestrator over pre-wired collaborators
    pub fn new(
        config: Config,
        store: MemoryStore,
        caller: Arc<ResilientCaller>,
        chunker: TokenBudgetChunker,
        editor: Editor,
    ) -> Self {
        let model = config
            .get_active_provider_config()
            .map(|p| p.model.clone())
            .unwrap_or_default();
        Self {
            store,
            caller,
            chunker,
            editor,
            config,
            model,
        }
    }

    /// Process the document from the first chapter through
    /// `last_chapter_index` (inclusive, 0-based). Chapters before
    /// `first_narrative_index` are treated as front matter.
    pub async fn run(
        &self,
        doc: &mut dyn DocumentSource,
        first_narrative_index: usize,
        last_chapter_index: usize,
    ) -> Result<RunReport, RunError> {
        let total = doc.chapter_count().min(last_chapter_index + 1);
        info!(
            "Pipeline start: {} chapters (narrative from {})",
            total, first_narrative_index
        );

        // On resume, a persisted summary means some earlier chapter
        // already seeded narrative memory. This read happens before any
        // chapter work, so its failure is not chapter-tagged.
        let mut has_seen_narrative = self
            .store
            .load_summary()
            .map_err(RunError::State)?
            .is_some();

        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut report = RunReport::default();

        for chapter in 0..total {
            progress.set_message(format!("chapter {}", chapter));
            let blocks = doc.chapter_blocks(chapter);

            let checkpoint = self
                .store
                .load_checkpoint()
                .map_err(|e| fail(chapter, ChapterStage::Classify, e))?;

            if checkpoint.contains(chapter) {
                let cached = self
                    .store
                    .load_cached_chapter(chapter)
                    .map_err(|e| fail(chapter, ChapterStage::Rebuild, e))?;
                doc.apply_chapter(chapter, &cached)
                    .map_err(|e| fail(chapter, ChapterStage::Rebuild, e))?;
                let kind = classify_chapter(
                    chapter,
                    !blocks.is_empty(),
                    first_narrative_index,
                    has_seen_narrative,
                );
                if kind.is_narrative() {
                    has_seen_narrative = true;
                }
                debug!("Chapter {}: already committed, replayed from cache", chapter);
                report.skipped.push(chapter);
                progress.inc(1);
                continue;
            }

            if blocks.is_empty() {
                doc.apply_chapter(chapter, &[])
                    .map_err(|e| fail(chapter, ChapterStage::Rebuild, e))?;
                self.store
                    .commit(chapter, &Default::default())
                    .map_err(|e| fail(chapter, ChapterStage::Commit, e))?;
                info!("Chapter {}: empty, committed as-is", chapter);
                report.empty.push(chapter);
                progress.inc(1);
                continue;
            }

            let kind = classify_chapter(chapter, true, first_narrative_index, has_seen_narrative);
            info!("Chapter {}: {} ({} blocks)", chapter, kind, blocks.len());

            self.process_chapter(doc, chapter, kind, &blocks).await?;

            if kind.is_narrative() {
                has_seen_narrative = true;
            }
            report.processed.push(chapter);
            progress.inc(1);
        }

        progress.finish_with_message("done");
        info!(
            "Pipeline done: {} processed, {} replayed, {} empty",
            report.processed.len(),
            report.skipped.len(),
            report.empty.len()
        );
        Ok(report)
    }

    /// Run one uncommitted, non-empty chapter through every stage
    async fn process_chapter(
        &self,
        doc: &mut dyn DocumentSource,
        chapter: usize,
        kind: ChapterKind,
        blocks: &[String],
    ) -> Result<(), ChapterFailure> {
        let persistent_glossary = self
            .store
            .load_glossary()
            .map_err(|e| fail(chapter, ChapterStage::Classify, e))?;
        let roster = self
            .store
            .load_characters()
            .map_err(|e| fail(chapter, ChapterStage::Classify, e))?;
        let stored_summary = self
            .store
            .load_summary()
            .map_err(|e| fail(chapter, ChapterStage::Classify, e))?;

        let mut ctx = ChapterContext::new(self.config.context.max_context_chunks);
        let chapter_text = blocks.join("\n");

        if kind.is_narrative() {
            let terms = self
                .extract_glossary_delta(&persistent_glossary, &chapter_text)
                .await
                .map_err(|e| fail(chapter, ChapterStage::ExtractTerms, e))?;
            info!("Chapter {}: {} new glossary terms", chapter, terms.len());
            ctx.add_glossary_terms(terms);
        }

        let translated = self
            .translate_blocks(chapter, kind, blocks, &persistent_glossary, &roster, &stored_summary, &mut ctx)
            .await?;

        if kind.is_narrative() {
            self.update_memory(kind, &chapter_text, &roster, &stored_summary, &mut ctx)
                .await
                .map_err(|e| fail(chapter, ChapterStage::UpdateMemory, e))?;
        }

        let rendered = if kind.is_narrative() && self.config.editor.enabled {
            let glossary_text = prompts::glossary_rules(&persistent_glossary, ctx.glossary_delta());
            self.editor
                .edit_chapter(blocks, &translated, &glossary_text)
                .await
        } else {
            translated
        };

        doc.apply_chapter(chapter, &rendered)
            .map_err(|e| fail(chapter, ChapterStage::Rebuild, e))?;

        self.store
            .commit(chapter, &ctx.into_delta(rendered))
            .map_err(|e| fail(chapter, ChapterStage::Commit, e))?;

        Ok(())
    }

    /// Ask the provider chain for new glossary terms in this chapter
    async fn extract_glossary_delta(
        &self,
        existing: &Glossary,
        chapter_text: &str,
    ) -> Result<Vec<GlossaryEntry>, PipelineError> {
        let sources: Vec<String> = existing.entries.iter().map(|e| e.source.clone()).collect();
        let request = GenerationRequest::new(prompts::glossary_delta_prompt(
            &sources,
            chapter_text,
            &self.config.source_language,
            &self.config.target_language,
        ))
        .temperature(self.config.translation.temperature);

        let terms = self
            .caller
            .execute_parsed(&request, |response| {
                glossary::parse_delta(&response.text, existing)
            })
            .await?;
        Ok(terms)
    }

    /// Translate the chapter's blocks chunk by chunk
    #[allow(clippy::too_many_arguments)]
    async fn translate_blocks(
        &self,
        chapter: usize,
        kind: ChapterKind,
        blocks: &[String],
        persistent_glossary: &Glossary,
        roster: &[Character],
        stored_summary: &Option<SummarySnapshot>,
        ctx: &mut ChapterContext,
    ) -> Result<Vec<String>, ChapterFailure> {
        let narrative = kind.is_narrative();
        let (glossary_rules, pronoun_rules, summary_header) = if narrative {
            (
                prompts::glossary_rules(persistent_glossary, ctx.glossary_delta()),
                prompts::pronoun_rules(roster),
                prompts::summary_header(roster, stored_summary.as_ref()),
            )
        } else {
            (String::new(), String::new(), String::new())
        };

        let mut translated: Vec<String> = Vec::with_capacity(blocks.len());

        while translated.len() < blocks.len() {
            let remaining = &blocks[translated.len()..];
            let rolling = ctx.last_blocks(self.config.context.max_context_blocks);
            let static_len = glossary_rules.len()
                + pronoun_rules.len()
                + summary_header.len()
                + rolling.iter().map(String::len).sum::<usize>();

            let take = self
                .chunker
                .next_batch_size(remaining, static_len, &self.model)
                .await;
            let chunk = &remaining[..take];
            debug!(
                "Chapter {}: translating blocks {}..{} of {}",
                chapter,
                translated.len() + 1,
                translated.len() + take,
                blocks.len()
            );

            let numbered = validator::number_blocks(chunk);
            let prompt = prompts::translation_prompt(&TranslationPromptInput {
                source_language: &self.config.source_language,
                target_language: &self.config.target_language,
                numbered_blocks: &numbered,
                block_count: take,
                glossary_rules: &glossary_rules,
                pronoun_rules: &pronoun_rules,
                summary: &summary_header,
                rolling_context: &rolling,
                narrative,
            });
            let request =
                GenerationRequest::new(prompt).temperature(self.config.translation.temperature);

            let rendered = self
                .caller
                .execute_parsed(&request, |response| {
                    validator::parse_indexed_blocks(&response.text, take)
                })
                .await
                .map_err(|e| fail(chapter, ChapterStage::Translate, e))?;

            ctx.push_chunk(rendered.clone())
                .map_err(|e| fail(chapter, ChapterStage::Translate, e))?;
            translated.extend(rendered);
        }

        Ok(translated)
    }

    /// Refresh the summary and character roster from this chapter's text
    async fn update_memory(
        &self,
        kind: ChapterKind,
        chapter_text: &str,
        roster: &[Character],
        stored_summary: &Option<SummarySnapshot>,
        ctx: &mut ChapterContext,
    ) -> Result<(), PipelineError> {
        let summary_prompt = match kind {
            ChapterKind::FirstNarrative => prompts::summary_init_prompt(chapter_text),
            _ => {
                let current = stored_summary
                    .as_ref()
                    .map(summary::summary_to_text)
                    .unwrap_or_default();
                prompts::summary_update_prompt(&current, chapter_text)
            }
        };
        let request = GenerationRequest::new(summary_prompt)
            .temperature(self.config.translation.temperature);
        let snapshot = self
            .caller
            .execute_parsed(&request, |response| summary::parse_summary(&response.text))
            .await?;
        ctx.set_summary(snapshot);

        let roster_prompt = match kind {
            ChapterKind::FirstNarrative => {
                prompts::character_init_prompt(&self.config.target_language, chapter_text)
            }
            _ => prompts::character_update_prompt(
                &self.config.target_language,
                &characters::roster_to_text(roster),
                chapter_text,
            ),
        };
        let request =
            GenerationRequest::new(roster_prompt).temperature(self.config.translation.temperature);
        let proposed = self
            .caller
            .execute_parsed(&request, |response| characters::parse_roster(&response.text))
            .await?;
        ctx.set_characters(characters::merge_with_locks(proposed, roster));

        Ok(())
    }
}

/// Tag an error with the chapter and stage it occurred in
fn fail(chapter: usize, stage: ChapterStage, source: impl Into<PipelineError>) -> ChapterFailure {
    ChapterFailure {
        chapter,
        stage,
        source: source.into(),
    }
}
