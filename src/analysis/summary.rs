/*!
 * Story summary parsing.
 *
 * The summary travels as sectioned plain text (SETTING / CHARACTERS /
 * WORLD_STATE / INITIAL_PREMISE / OPEN_QUESTIONS). SETTING and
 * INITIAL_PREMISE are required; a response missing either fails the
 * attempt rather than committing a hollow snapshot.
 */

use crate::errors::ValidationError;
use crate::memory::models::SummarySnapshot;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Setting,
    Characters,
    WorldState,
    InitialPremise,
    OpenQuestions,
}

fn section_for(header: &str) -> Option<Section> {
    match header {
        "SETTING" => Some(Section::Setting),
        "CHARACTERS" => Some(Section::Characters),
        "WORLD_STATE" => Some(Section::WorldState),
        "INITIAL_PREMISE" => Some(Section::InitialPremise),
        "OPEN_QUESTIONS" => Some(Section::OpenQuestions),
        _ => None,
    }
}

/// Parse a sectioned summary response into a snapshot
pub fn parse_summary(raw: &str) -> Result<SummarySnapshot, ValidationError> {
    let mut snapshot = SummarySnapshot::default();
    let mut current: Option<Section> = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_suffix(':') {
            let looks_like_header = !header.is_empty()
                && header
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c == '_');
            if looks_like_header {
                // Unknown headers end the current section instead of
                // bleeding their content into it.
                current = section_for(header);
                continue;
            }
        }

        let Some(section) = current else {
            continue;
        };

        match section {
            Section::Characters => {
                if let Some(item) = line.strip_prefix('-') {
                    snapshot.characters.push(item.trim().to_string());
                }
            }
            Section::OpenQuestions => {
                if let Some(item) = line.strip_prefix('-') {
                    snapshot.open_questions.push(item.trim().to_string());
                }
            }
            Section::Setting => append_text(&mut snapshot.setting, line),
            Section::WorldState => append_text(&mut snapshot.world_state, line),
            Section::InitialPremise => append_text(&mut snapshot.initial_premise, line),
        }
    }

    if snapshot.setting.is_empty() {
        return Err(ValidationError::MissingSummarySection("SETTING"));
    }
    if snapshot.initial_premise.is_empty() {
        return Err(ValidationError::MissingSummarySection("INITIAL_PREMISE"));
    }

    Ok(snapshot)
}

fn append_text(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(line);
}

/// Serialize a snapshot back into the sectioned text format used in
/// update prompts
pub fn summary_to_text(summary: &SummarySnapshot) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("SETTING:".to_string());
    lines.push(summary.setting.clone());
    lines.push(String::new());

    lines.push("CHARACTERS:".to_string());
    for c in &summary.characters {
        lines.push(format!("- {}", c));
    }
    lines.push(String::new());

    lines.push("WORLD_STATE:".to_string());
    lines.push(summary.world_state.clone());
    lines.push(String::new());

    lines.push("INITIAL_PREMISE:".to_string());
    lines.push(summary.initial_premise.clone());
    lines.push(String::new());

    lines.push("OPEN_QUESTIONS:".to_string());
    for q in &summary.open_questions {
        lines.push(format!("- {}", q));
    }

    lines.join("\n")
}
