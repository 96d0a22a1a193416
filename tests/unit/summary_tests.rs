/*!
 * Tests for sectioned summary parsing
 */

use chapterwise::analysis::summary::{parse_summary, summary_to_text};
use chapterwise::errors::ValidationError;

use crate::common;

#[test]
fn test_parseSummary_withAllSections_shouldFillSnapshot() {
    let snapshot = parse_summary(&common::summary_response()).unwrap();
    assert_eq!(snapshot.setting, "A small coastal town in the north.");
    assert_eq!(snapshot.characters, vec!["Mai: a fisherman's daughter"]);
    assert_eq!(snapshot.world_state, "Quiet season before the storms.");
    assert_eq!(
        snapshot.initial_premise,
        "Mai finds a sealed letter in a stranded boat."
    );
    assert_eq!(snapshot.open_questions, vec!["Who wrote the letter?"]);
}

#[test]
fn test_parseSummary_withMultilineSection_shouldJoinLines() {
    let raw = "SETTING:\nLine one.\nLine two.\n\nINITIAL_PREMISE:\nSomething happens.";
    let snapshot = parse_summary(raw).unwrap();
    assert_eq!(snapshot.setting, "Line one. Line two.");
}

#[test]
fn test_parseSummary_withUnknownSection_shouldIgnoreIt() {
    let raw = "SETTING:\nA town.\n\nMOOD:\nominous\n\nINITIAL_PREMISE:\nA letter arrives.";
    let snapshot = parse_summary(raw).unwrap();
    assert_eq!(snapshot.setting, "A town.");
    // MOOD content attaches to no known section and is dropped
    assert!(!snapshot.world_state.contains("ominous"));
}

#[test]
fn test_parseSummary_withoutSetting_shouldFail() {
    let raw = "INITIAL_PREMISE:\nA letter arrives.";
    let result = parse_summary(raw);
    assert!(matches!(
        result,
        Err(ValidationError::MissingSummarySection("SETTING"))
    ));
}

#[test]
fn test_parseSummary_withoutInitialPremise_shouldFail() {
    let raw = "SETTING:\nA town.";
    let result = parse_summary(raw);
    assert!(matches!(
        result,
        Err(ValidationError::MissingSummarySection("INITIAL_PREMISE"))
    ));
}

#[test]
fn test_summaryToText_shouldRoundTripThroughParse() {
    let snapshot = parse_summary(&common::summary_response()).unwrap();
    let text = summary_to_text(&snapshot);
    let reparsed = parse_summary(&text).unwrap();
    assert_eq!(reparsed, snapshot);
}
