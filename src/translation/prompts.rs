/*!
 * Prompt builders for every generation stage.
 *
 * The structural contracts baked into these prompts (one output line per
 * numbered block, skeleton markers, append-only glossary, locked
 * pronouns) are what the validator and editor parsers rely on; the two
 * sides must be changed together.
 */

use crate::memory::models::{Character, Glossary, GlossaryEntry, SummarySnapshot};

/// Inputs for one translation request
pub struct TranslationPromptInput<'a> {
    /// Source language name
    pub source_language: &'a str,
    /// Target language name
    pub target_language: &'a str,
    /// Numbered source blocks (`[1] ...` per line)
    pub numbered_blocks: &'a str,
    /// Number of blocks in this request
    pub block_count: usize,
    /// Glossary hard-constraint section, may be empty
    pub glossary_rules: &'a str,
    /// Pronoun hard-constraint section, may be empty
    pub pronoun_rules: &'a str,
    /// Story summary header, may be empty
    pub summary: &'a str,
    /// Rolling context blocks from earlier in the chapter
    pub rolling_context: &'a [String],
    /// Whether this is narrative content
    pub narrative: bool,
}

/// Build the prompt for one translation batch
pub fn translation_prompt(input: &TranslationPromptInput<'_>) -> String {
    let role = if input.narrative {
        "You are a professional literary translator."
    } else {
        "You are a translation engine."
    };

    let extra_rules = if input.narrative {
        String::new()
    } else {
        "This is NON-NARRATIVE content.\n\
         Translate literally.\n\
         Do NOT embellish or interpret.\n"
            .to_string()
    };

    let context_section = if input.rolling_context.is_empty() {
        String::new()
    } else {
        format!(
            "INTRA-CHAPTER CONTEXT (REFERENCE ONLY):\n\
             The following text is from PREVIOUS translated blocks.\n\
             Use ONLY for tone, terminology, pronouns, and flow.\n\
             DO NOT translate, repeat, or continue it.\n\n{}\n\n",
            input.rolling_context.join("\n")
        )
    };

    format!(
        "{role}\n\n\
         TARGET LANGUAGE:\n{target}.\n\n\
         You MUST translate ALL content from {source} into {target}.\n\n\
         {extra_rules}\n\
         {glossary}\n\n\
         {pronouns}\n\n\
         GLOBAL CONTEXT (if provided):\n{summary}\n\n\
         {context}\
         STRICT RULES (MANDATORY - VIOLATION = INVALID OUTPUT):\n\n\
         FORMAT RULES:\n\
         - Input text contains NUMBERED blocks.\n\
         - EACH numbered block MUST produce EXACTLY ONE output line.\n\
         - EVEN IF a block is very short, it MUST still have its own output line.\n\
         - DO NOT merge, combine, summarize, or infer across blocks.\n\
         - DO NOT split blocks.\n\
         - DO NOT add or remove lines.\n\
         - Output MUST contain EXACTLY {count} lines.\n\
         - Each output line MUST start with the SAME block number as input.\n\n\
         NO META OUTPUT (ABSOLUTE):\n\
         - You MUST output ONLY translation lines.\n\
         - You MUST NOT add notes, explanations, confirmations, or commentary.\n\
         - ANY line that does NOT start with a block number [i] is INVALID.\n\n\
         INPUT:\n{blocks}\n\n\
         OUTPUT FORMAT (EXACT):\n\
         [1] <{target} translation>\n\
         [2] <{target} translation>\n\
         ...",
        role = role,
        source = input.source_language,
        target = input.target_language,
        extra_rules = extra_rules,
        glossary = input.glossary_rules,
        pronouns = input.pronoun_rules,
        summary = input.summary,
        context = context_section,
        count = input.block_count,
        blocks = input.numbered_blocks,
    )
    .trim()
    .to_string()
}

/// Build the glossary hard-constraint section from the persistent
/// glossary plus this chapter's delta. Empty when there are no terms.
pub fn glossary_rules(glossary: &Glossary, delta: &[GlossaryEntry]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for entry in glossary.entries.iter().chain(delta.iter()) {
        lines.push(format!("- \"{}\" -> \"{}\"", entry.source, entry.target));
    }
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "GLOSSARY RULES (HARD CONSTRAINT):\n\
         - Every source term MUST be translated EXACTLY as specified.\n\
         - Do NOT paraphrase or localize glossary terms.\n\n\
         Glossary:\n{}",
        lines.join("\n")
    )
}

/// Build the pronoun hard-constraint section from the locked roster.
/// Empty when no characters are known yet.
pub fn pronoun_rules(characters: &[Character]) -> String {
    let lines: Vec<String> = characters
        .iter()
        .map(|c| format!("- \"{}\" MUST be referred to as \"{}\"", c.name, c.pronoun.default))
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!(
        "CHARACTER PRONOUN RULES (ABSOLUTE):\n\
         - When translating third-person references, you MUST use the pronoun specified below.\n\
         - You MUST NOT vary pronouns for style.\n\
         - You MUST NOT replace pronouns with character names or descriptions.\n\
         - Any pronoun violation INVALIDATES the output.\n\n\
         Pronoun mapping:\n{}\n",
        lines.join("\n")
    )
}

/// Build the summary header carried in every narrative request. The
/// pronoun mapping rides in front so the model reads it first.
pub fn summary_header(characters: &[Character], summary: Option<&SummarySnapshot>) -> String {
    let char_rules: Vec<String> = characters
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.pronoun.default))
        .collect();
    let summary_json = summary
        .map(|s| serde_json::to_string(s).unwrap_or_default())
        .unwrap_or_default();
    format!(
        "CHARACTER PRONOUNS:\n{}\n\nSTORY SUMMARY:\n{}",
        char_rules.join("\n"),
        summary_json
    )
}

/// Build the glossary delta extraction prompt
pub fn glossary_delta_prompt(
    existing_sources: &[String],
    chapter_text: &str,
    source_language: &str,
    target_language: &str,
) -> String {
    let payload = serde_json::json!({
        "existing_terms": existing_sources,
        "chapter_text": chapter_text,
    });
    format!(
        "ROLE: Narrative Glossary Analyst (Translation Consistency)\n\n\
         MISSION:\n\
         - Analyze a NARRATIVE CHAPTER ({source} -> {target}) to identify NEW glossary terms\n\
         - Append NEW entries only to an existing glossary\n\
         - Avoid polluting the glossary with noise\n\n\
         EXTRACTION RULES:\n\
         1. Include ONLY:\n\
         - Proper nouns: character names, specific locations, organizations.\n\
         - Fictional technology and world-specific concepts.\n\
         - Symbolic objects unique to this book's setting.\n\
         2. Strictly EXCLUDE:\n\
         - Common nouns and basic vocabulary.\n\
         - Descriptive phrases or common actions.\n\
         - Generic titles unless they function as a specific character name.\n\n\
         BOUNDARIES (ABSOLUTE):\n\
         - DO NOT repeat existing glossary entries.\n\
         - DO NOT modify, correct, or reinterpret existing entries.\n\
         - DO NOT return the full glossary.\n\n\
         TRANSLATION RULE (CRITICAL):\n\
         - The \"target\" field MUST contain ONLY the {target} term.\n\
         - NO explanations, parentheses, or descriptive phrases inside \"target\".\n\n\
         OUTPUT FORMAT (STRICT JSON ARRAY ONLY):\n\
         [\n  {{\n    \"source\": \"{source} term\",\n    \"target\": \"{target} translation ONLY\",\n    \"type\": \"person | organization | concept | system\",\n    \"note\": \"optional clarification\"\n  }}\n]\n\n\
         INPUT:\n{payload}",
        source = source_language,
        target = target_language,
        payload = payload,
    )
}

/// Common rules shared by the character prompts
fn character_common_rules(target_language: &str) -> String {
    format!(
        "RULES:\n\
         - ONLY characters present in the text.\n\
         - NO speculation.\n\
         - Infer 'pronoun' (the {target} third-person pronoun) from gender, age, and status.\n",
        target = target_language
    )
}

/// Build the character roster initialization prompt (first narrative chapter)
pub fn character_init_prompt(target_language: &str, chapter_text: &str) -> String {
    format!(
        "You are initializing the CHARACTER CONTEXT for a novel.\n\
         This is the FIRST narrative chapter.\n\n\
         {rules}\n\
         OUTPUT FORMAT (STRICT, TEXT ONLY):\n\
         CHARACTERS:\n\
         - Name | role | description | pronoun\n\n\
         DATA:\n{text}",
        rules = character_common_rules(target_language),
        text = chapter_text,
    )
}

/// Build the character roster update prompt (later narrative chapters)
pub fn character_update_prompt(
    target_language: &str,
    current_roster: &str,
    chapter_text: &str,
) -> String {
    format!(
        "You are updating an EXISTING CHARACTER CONTEXT.\n\
         {rules}\
         - DO NOT remove existing characters.\n\
         - For NEW characters, infer 'pronoun'.\n\n\
         OUTPUT FORMAT (STRICT, TEXT ONLY):\n\
         CHARACTERS:\n\
         - Name | role | description | pronoun\n\n\
         DATA:\n\
         CURRENT CHARACTERS:\n{roster}\n\n\
         NEW CHAPTER:\n{text}",
        rules = character_common_rules(target_language),
        roster = current_roster,
        text = chapter_text,
    )
}

/// Build the summary initialization prompt (first narrative chapter)
pub fn summary_init_prompt(chapter_text: &str) -> String {
    format!(
        "You are initializing the STORY SUMMARY for a novel.\n\
         This is the FIRST narrative chapter of the book. There is NO existing summary.\n\n\
         GOAL\n\
         - Extract ONLY factual information explicitly stated in the chapter.\n\n\
         RULES (ABSOLUTE)\n\
         - NO speculation, interpretation, or analysis.\n\
         - Neutral, encyclopedic tone.\n\n\
         OUTPUT FORMAT (STRICT, TEXT ONLY):\n\n\
         SETTING:\n<text>\n\n\
         CHARACTERS:\n- Name: description\n\n\
         WORLD_STATE:\n<text>\n\n\
         INITIAL_PREMISE:\n<text>\n\n\
         OPEN_QUESTIONS:\n- question\n\n\
         DATA:\n{}",
        chapter_text
    )
}

/// Build the summary update prompt (later narrative chapters)
pub fn summary_update_prompt(current_summary: &str, chapter_text: &str) -> String {
    format!(
        "You are updating an EXISTING STORY SUMMARY.\n\n\
         GOAL\n\
         - Update the summary using ONLY new factual information.\n\
         - Preserve all existing correct information.\n\n\
         RULES (ABSOLUTE)\n\
         - NO speculation or interpretation.\n\
         - Only update if NEW FACTS appear.\n\
         - Remove open questions clearly answered; add new unresolved ones.\n\n\
         CRITICAL FORMAT RULE (ABSOLUTE):\n\
         - You MUST output ALL sections below, even if there are NO changes.\n\
         - If a section has no updates, REPEAT the content from CURRENT SUMMARY verbatim.\n\
         - NEVER omit any section header.\n\n\
         OUTPUT FORMAT (STRICT, TEXT ONLY, SAME STRUCTURE):\n\n\
         SETTING:\n...\n\n\
         CHARACTERS:\n...\n\n\
         WORLD_STATE:\n...\n\n\
         INITIAL_PREMISE:\n...\n\n\
         OPEN_QUESTIONS:\n...\n\n\
         DATA:\n\
         CURRENT SUMMARY:\n{current}\n\n\
         NEW CHAPTER:\n{text}",
        current = current_summary,
        text = chapter_text,
    )
}

/// System instructions for the editor pass
pub fn editor_system_prompt(target_language: &str) -> String {
    format!(
        "You are a professional book editor. Your goal is to polish the {target} \
         translation (DRAFT) to make it sound natural, literary, and fluent, while \
         ensuring it matches the ORIGINAL meaning.\n\n\
         IMPORTANT RULES:\n\
         1. Content inside each block MUST ONLY be the refined {target} text.\n\
         2. DO NOT include 'ORIGINAL:', 'DRAFT:', or any other labels inside the blocks.\n\
         3. DO NOT output explanations or notes.\n\
         4. Output format MUST strictly follow:\n\
         <<<BLOCK:N>>>\n\
         [Your refined {target} text here]\n\
         <<<END>>>\n\
         5. Keep the exact block numbers provided.",
        target = target_language
    )
}

/// User prompt for one editor continuation batch, starting at the given
/// 1-based block number
pub fn editor_batch_prompt(
    glossary_text: &str,
    start_block: usize,
    originals: &[String],
    drafts: &[String],
    target_language: &str,
) -> String {
    let mut pairs = String::new();
    for (offset, (original, draft)) in originals.iter().zip(drafts.iter()).enumerate() {
        pairs.push_str(&format!(
            "--- BLOCK {} ---\nORIGINAL: {}\nDRAFT: {}\n\n",
            start_block + offset,
            original,
            draft
        ));
    }
    format!(
        "GLOSSARY:\n{glossary}\n\n\
         INPUT DATA (Starting from Block {start}):\n\
         You are given pairs of ORIGINAL source text and DRAFT {target}.\n\
         CRITICAL GUIDELINE:\n\
         - Use the ORIGINAL ONLY AS A REFERENCE to ensure the DRAFT hasn't missed or \
         misinterpreted any meaning.\n\
         - Your primary task is to POLISH and REWRITE the DRAFT into professional, \
         literary prose.\n\
         - DO NOT translate directly from the ORIGINAL if the DRAFT is already accurate.\n\n\
         {pairs}\n\
         Output ONLY the refined {target} blocks now:",
        glossary = glossary_text,
        start = start_block,
        target = target_language,
        pairs = pairs,
    )
}
