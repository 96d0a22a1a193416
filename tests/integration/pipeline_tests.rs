/*!
 * End-to-end pipeline tests over the mock provider
 */

use std::sync::Arc;

use chapterwise::app_config::Config;
use chapterwise::document::InMemoryDocument;
use chapterwise::errors::{ChapterStage, RunError};
use chapterwise::memory::models::ChapterDelta;
use chapterwise::memory::store::MemoryStore;
use chapterwise::pipeline::ChapterOrchestrator;
use chapterwise::providers::mock::{MockOutcome, MockProvider};
use chapterwise::providers::GenerationResponse;
use chapterwise::translation::call_layer::{CallCandidate, ResilientCaller};
use chapterwise::translation::chunker::TokenBudgetChunker;
use chapterwise::translation::editor::Editor;

use crate::common;

fn build_orchestrator(mock: Arc<MockProvider>, config: Config) -> ChapterOrchestrator {
    let store = MemoryStore::new(config.resolve_state_dir()).unwrap();
    let caller = Arc::new(ResilientCaller::new(
        vec![CallCandidate::new(mock.clone(), "mock-model")],
        config.retry.clone(),
    ));
    let chunker = TokenBudgetChunker::new(mock, config.chunking.clone());
    let editor = Editor::new(
        caller.clone(),
        config.editor.clone(),
        config.target_language.clone(),
    );
    ChapterOrchestrator::new(config, store, caller, chunker, editor)
}

fn pipeline_mock() -> Arc<MockProvider> {
    Arc::new(MockProvider::with_responder(common::pipeline_responder))
}

fn chapter(blocks: &[&str]) -> Vec<String> {
    blocks.iter().map(|b| b.to_string()).collect()
}

fn sample_document() -> InMemoryDocument {
    InMemoryDocument::new(vec![
        chapter(&["Title Page"]),
        chapter(&["one", "two", "three", "four", "five"]),
        chapter(&["six", "seven"]),
    ])
}

#[tokio::test]
async fn test_run_withFreshDocument_shouldCommitEveryChapter() {
    let dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(dir.path());
    // Force the narrative chapter to translate in more than one chunk
    config.chunking.max_blocks_per_request = 3;

    let mock = pipeline_mock();
    let orchestrator = build_orchestrator(mock, config);
    let mut doc = sample_document();

    let report = orchestrator.run(&mut doc, 1, 2).await.unwrap();
    assert_eq!(report.processed, vec![0, 1, 2]);
    assert!(report.skipped.is_empty());

    // Every chapter rebuilt with one rendered block per source block
    assert_eq!(doc.rendered_chapter(0).unwrap().len(), 1);
    assert_eq!(doc.rendered_chapter(1).unwrap().len(), 5);
    assert_eq!(doc.rendered_chapter(2).unwrap().len(), 2);

    let store = MemoryStore::new(dir.path()).unwrap();
    assert_eq!(store.load_checkpoint().unwrap().len(), 3);
    assert!(store.load_glossary().unwrap().contains_source("Mai"));
    assert!(store.load_summary().unwrap().is_some());
    let roster = store.load_characters().unwrap();
    assert_eq!(roster[0].name, "Mai");
    assert_eq!(roster[0].pronoun.default, "cô");
    assert!(roster[0].pronoun.locked);
}

#[tokio::test]
async fn test_run_withChunkedChapter_shouldPreserveBlockCountAndOrder() {
    let dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(dir.path());
    config.chunking.max_blocks_per_request = 2;

    let orchestrator = build_orchestrator(pipeline_mock(), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["a", "b", "c", "d", "e"])]);

    orchestrator.run(&mut doc, 0, 0).await.unwrap();
    let rendered = doc.rendered_chapter(0).unwrap();
    assert_eq!(rendered.len(), 5);
    // Each chunk is numbered from 1, so the last chunk of 1 ends in "1"
    assert_eq!(rendered[0], "ban dich 1");
    assert_eq!(rendered[1], "ban dich 2");
    assert_eq!(rendered[2], "ban dich 1");
}

#[tokio::test]
async fn test_run_withCompletedState_shouldReplayWithoutProviderCalls() {
    let dir = common::create_temp_dir().unwrap();

    let first_run_config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(pipeline_mock(), first_run_config);
    let mut doc = sample_document();
    orchestrator.run(&mut doc, 1, 2).await.unwrap();

    // Second run over the same state with a fresh provider
    let second_mock = pipeline_mock();
    let resume_config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(second_mock.clone(), resume_config);
    let mut doc = sample_document();

    let report = orchestrator.run(&mut doc, 1, 2).await.unwrap();
    assert!(report.processed.is_empty());
    assert_eq!(report.skipped, vec![0, 1, 2]);
    assert_eq!(second_mock.request_count(), 0);

    // Replay still rebuilds the document from the cache
    assert_eq!(doc.rendered_chapter(1).unwrap().len(), 5);
}

#[tokio::test]
async fn test_run_withPartialCheckpoint_shouldResumeAtFirstUncommitted() {
    let dir = common::create_temp_dir().unwrap();
    let store = MemoryStore::new(dir.path()).unwrap();
    store
        .commit(
            0,
            &ChapterDelta {
                rendered_blocks: vec!["cached title".to_string()],
                ..ChapterDelta::default()
            },
        )
        .unwrap();

    let config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(pipeline_mock(), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["Title Page"]), chapter(&["one", "two"])]);

    let report = orchestrator.run(&mut doc, 1, 1).await.unwrap();
    assert_eq!(report.skipped, vec![0]);
    assert_eq!(report.processed, vec![1]);
    assert_eq!(doc.rendered_chapter(0).unwrap()[0], "cached title");
}

#[tokio::test]
async fn test_run_withEmptyChapter_shouldCommitItWithoutTranslation() {
    let dir = common::create_temp_dir().unwrap();
    let config = common::test_config(dir.path());
    let mock = pipeline_mock();
    let orchestrator = build_orchestrator(mock.clone(), config);
    let mut doc = InMemoryDocument::new(vec![Vec::new()]);

    let report = orchestrator.run(&mut doc, 0, 0).await.unwrap();
    assert_eq!(report.empty, vec![0]);
    assert_eq!(mock.request_count(), 0);

    let store = MemoryStore::new(dir.path()).unwrap();
    assert!(store.load_checkpoint().unwrap().contains(0));
}

#[tokio::test]
async fn test_run_withFrontMatterOnly_shouldSkipMemoryStages() {
    let dir = common::create_temp_dir().unwrap();
    let config = common::test_config(dir.path());
    let mock = pipeline_mock();
    let orchestrator = build_orchestrator(mock.clone(), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["Copyright", "Dedication"])]);

    // Narrative content starts far past this document
    orchestrator.run(&mut doc, 10, 0).await.unwrap();

    // Only translation requests, no glossary/summary/roster traffic
    for request in mock.requests() {
        assert!(request.prompt.contains("FORMAT RULES:"));
    }
    let store = MemoryStore::new(dir.path()).unwrap();
    assert!(store.load_glossary().unwrap().is_empty());
    assert!(store.load_summary().unwrap().is_none());
}

#[tokio::test]
async fn test_run_withRefusingProvider_shouldStopWithStageTaggedFailure() {
    let dir = common::create_temp_dir().unwrap();
    let config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(Arc::new(MockProvider::refusing()), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["one", "two"])]);

    let error = orchestrator.run(&mut doc, 0, 0).await.unwrap_err();
    let RunError::Chapter(failure) = error else {
        panic!("expected a chapter-tagged failure");
    };
    assert_eq!(failure.chapter, 0);
    assert_eq!(failure.stage, ChapterStage::ExtractTerms);

    // The checkpoint never moves past a failed chapter
    let store = MemoryStore::new(dir.path()).unwrap();
    assert!(store.load_checkpoint().unwrap().is_empty());
}

#[tokio::test]
async fn test_run_withCorruptSummaryFile_shouldFailWithoutBlamingAChapter() {
    let dir = common::create_temp_dir().unwrap();
    std::fs::write(dir.path().join("summary.json"), "not json").unwrap();

    let config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(pipeline_mock(), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["one"])]);

    // The pre-loop state read fails; no chapter was at fault
    let error = orchestrator.run(&mut doc, 0, 0).await.unwrap_err();
    assert!(matches!(error, RunError::State(_)));
}

#[tokio::test]
async fn test_run_withEditorEnabled_shouldCommitEditedBlocks() {
    let dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(dir.path());
    config.editor.enabled = true;

    let orchestrator = build_orchestrator(pipeline_mock(), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["one", "two"])]);

    orchestrator.run(&mut doc, 0, 0).await.unwrap();
    let rendered = doc.rendered_chapter(0).unwrap();
    assert_eq!(rendered, &vec!["da bien tap 1".to_string(), "da bien tap 2".to_string()]);

    // The cache holds the edited text, so replay reproduces it
    let store = MemoryStore::new(dir.path()).unwrap();
    assert_eq!(store.load_cached_chapter(0).unwrap(), *rendered);
}

#[tokio::test]
async fn test_run_withPrimaryFailingMidChapter_shouldFinishOnFallbackCandidate() {
    let dir = common::create_temp_dir().unwrap();
    let mut config = common::test_config(dir.path());
    config.chunking.max_blocks_per_request = 3;

    // Primary answers the first batch, then fails its whole retry budget
    let primary = Arc::new(MockProvider::scripted(vec![
        MockOutcome::Text(common::indexed_response(3)),
        MockOutcome::Transient("down".to_string()),
        MockOutcome::Transient("down".to_string()),
        MockOutcome::Transient("down".to_string()),
    ]));
    let fallback = pipeline_mock();

    let store = MemoryStore::new(config.resolve_state_dir()).unwrap();
    let caller = Arc::new(ResilientCaller::new(
        vec![
            CallCandidate::new(primary.clone(), "primary-model"),
            CallCandidate::new(fallback.clone(), "fallback-model"),
        ],
        config.retry.clone(),
    ));
    let chunker = TokenBudgetChunker::new(primary.clone(), config.chunking.clone());
    let editor = Editor::new(
        caller.clone(),
        config.editor.clone(),
        config.target_language.clone(),
    );
    let orchestrator = ChapterOrchestrator::new(config, store, caller, chunker, editor);

    // Front matter only, so the chapter is pure translation traffic
    let mut doc = InMemoryDocument::new(vec![chapter(&["a", "b", "c", "d", "e"])]);
    let report = orchestrator.run(&mut doc, 10, 0).await.unwrap();
    assert_eq!(report.processed, vec![0]);

    let rendered = doc.rendered_chapter(0).unwrap();
    assert_eq!(rendered.len(), 5);
    // Batch two (2 blocks) came from the fallback candidate
    assert_eq!(rendered[3], "ban dich 1");
    assert_eq!(primary.request_count(), 4);
    assert_eq!(fallback.request_count(), 1);

    let store = MemoryStore::new(dir.path()).unwrap();
    assert!(store.load_checkpoint().unwrap().contains(0));
}

#[tokio::test]
async fn test_run_withProviderFlippingPronoun_shouldKeepLockedValue() {
    let dir = common::create_temp_dir().unwrap();

    let config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(pipeline_mock(), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["one"])]);
    orchestrator.run(&mut doc, 0, 0).await.unwrap();

    // Next chapter, the provider proposes a different pronoun for Mai
    let flipping = Arc::new(MockProvider::with_responder(|request| {
        if request.prompt.contains("CHARACTER CONTEXT") {
            return Ok(GenerationResponse::from_text(
                "CHARACTERS:\n- Mai | protagonist | older now | chị",
            ));
        }
        common::pipeline_responder(request)
    }));
    let config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(flipping, config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["one"]), chapter(&["two"])]);
    orchestrator.run(&mut doc, 0, 1).await.unwrap();

    let store = MemoryStore::new(dir.path()).unwrap();
    let roster = store.load_characters().unwrap();
    let mai = roster.iter().find(|c| c.name == "Mai").unwrap();
    assert_eq!(mai.pronoun.default, "cô");
    assert_eq!(mai.description, "older now");
}

#[tokio::test]
async fn test_run_withSecondNarrativeChapter_shouldNotDuplicateGlossaryTerms() {
    let dir = common::create_temp_dir().unwrap();
    let config = common::test_config(dir.path());
    let orchestrator = build_orchestrator(pipeline_mock(), config);
    let mut doc = InMemoryDocument::new(vec![chapter(&["one"]), chapter(&["two"])]);

    orchestrator.run(&mut doc, 0, 1).await.unwrap();

    // Both chapters report the same term; only the first commit keeps it
    let store = MemoryStore::new(dir.path()).unwrap();
    assert_eq!(store.load_glossary().unwrap().len(), 1);
}
