/*!
 * Tests for chapter classification
 */

use chapterwise::pipeline::{classify_chapter, ChapterKind};

#[test]
fn test_classifyChapter_beforeFirstNarrativeIndex_shouldBeNonNarrative() {
    assert_eq!(
        classify_chapter(0, true, 3, false),
        ChapterKind::NonNarrative
    );
    assert_eq!(
        classify_chapter(2, true, 3, false),
        ChapterKind::NonNarrative
    );
}

#[test]
fn test_classifyChapter_withoutContent_shouldBeNonNarrative() {
    // Even past the narrative threshold, an empty chapter stays out of memory
    assert_eq!(
        classify_chapter(5, false, 3, true),
        ChapterKind::NonNarrative
    );
}

#[test]
fn test_classifyChapter_atThresholdFirstTime_shouldBeFirstNarrative() {
    assert_eq!(
        classify_chapter(3, true, 3, false),
        ChapterKind::FirstNarrative
    );
}

#[test]
fn test_classifyChapter_afterNarrativeSeen_shouldBeNarrative() {
    assert_eq!(classify_chapter(4, true, 3, true), ChapterKind::Narrative);
}

#[test]
fn test_classifyChapter_pastThresholdAfterEmptyChapter_shouldStillSeedFirst() {
    // Chapter 3 was empty, so chapter 4 becomes the seeding chapter
    assert_eq!(
        classify_chapter(4, true, 3, false),
        ChapterKind::FirstNarrative
    );
}

#[test]
fn test_chapterKind_isNarrative_shouldExcludeOnlyNonNarrative() {
    assert!(!ChapterKind::NonNarrative.is_narrative());
    assert!(ChapterKind::FirstNarrative.is_narrative());
    assert!(ChapterKind::Narrative.is_narrative());
}

#[test]
fn test_chapterKind_display_shouldUseUpperSnakeNames() {
    assert_eq!(ChapterKind::NonNarrative.to_string(), "NON_NARRATIVE");
    assert_eq!(ChapterKind::FirstNarrative.to_string(), "FIRST_NARRATIVE");
    assert_eq!(ChapterKind::Narrative.to_string(), "NARRATIVE");
}
