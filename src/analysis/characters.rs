/*!
 * Character roster parsing and the pronoun-lock merge.
 *
 * The roster travels as line-oriented text (`- Name | role | description
 * | pronoun`) under a `CHARACTERS:` header. The merge is where the
 * pronoun invariant is enforced: a character already in the roster keeps
 * its stored pronoun no matter what the provider proposed this chapter;
 * only genuinely new characters get a freshly inferred pronoun, locked
 * on the spot.
 */

use log::{debug, info};

use crate::errors::ValidationError;
use crate::memory::models::Character;

/// Pronoun used when the provider omits the fourth column
const DEFAULT_PRONOUN: &str = "anh";

/// Parse a roster response into characters.
///
/// Leading chatter before the `CHARACTERS:` header is tolerated; a
/// response without the header at all fails the attempt.
pub fn parse_roster(raw: &str) -> Result<Vec<Character>, ValidationError> {
    let lines: Vec<&str> = raw.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let Some(header_idx) = lines.iter().position(|line| line.contains("CHARACTERS")) else {
        return Err(ValidationError::MalformedRoster(
            "missing CHARACTERS: header".to_string(),
        ));
    };

    let mut characters = Vec::new();
    for line in &lines[header_idx..] {
        let Some(body) = line.strip_prefix('-') else {
            continue;
        };
        // splitn(4) folds any extra separators into the last column
        let parts: Vec<&str> = body.trim().splitn(4, '|').map(str::trim).collect();
        if parts.len() < 3 {
            continue;
        }

        let pronoun = parts
            .get(3)
            .map(|p| p.to_lowercase())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PRONOUN.to_string());

        characters.push(Character::new(parts[0], parts[1], parts[2], pronoun));
    }

    if characters.is_empty() {
        return Err(ValidationError::MalformedRoster(
            "no character lines parsed".to_string(),
        ));
    }

    debug!("Character roster: parsed {} characters", characters.len());
    Ok(characters)
}

/// Merge a provider-proposed roster against the existing one, keeping
/// every previously locked pronoun unchanged. New characters keep their
/// inferred pronoun, which `Character::new` already locked.
pub fn merge_with_locks(proposed: Vec<Character>, existing: &[Character]) -> Vec<Character> {
    let mut merged = Vec::with_capacity(proposed.len());
    for mut character in proposed {
        if let Some(known) = existing.iter().find(|c| c.name == character.name) {
            character.pronoun = known.pronoun.clone();
        } else {
            info!(
                "Character roster: new character [{}] locked as [{}]",
                character.name, character.pronoun.default
            );
        }
        merged.push(character);
    }
    merged
}

/// Serialize a roster back into the line format used in update prompts
pub fn roster_to_text(characters: &[Character]) -> String {
    let mut lines = vec!["CHARACTERS:".to_string()];
    for c in characters {
        lines.push(format!(
            "- {} | {} | {} | {}",
            c.name, c.role, c.description, c.pronoun.default
        ));
    }
    lines.join("\n")
}
