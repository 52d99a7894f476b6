//! User-input gate — C11 (spec §4.9). Pure detection logic: after an agent
//! node finishes, its `result` is checked against a fixed phrase list; a
//! match extracts a question sentence the driver suspends on. Parking and
//! resuming the execution itself lives in `driver.rs`, which is the only
//! caller with access to the running execution's state.

/// Phrases that mark an agent's `result` as a question needing user input,
/// exactly as spec §4.9 enumerates them.
const QUESTION_INDICATORS: &[&str] = &[
    "what would you like",
    "please provide",
    "tell me about",
    "what are your preferences",
    "what do you think",
    "how would you like",
    "what should",
    "what kind of",
    "which option",
    "please choose",
    "please select",
    "can you tell me",
    "what's your",
];

/// Looks for a question needing user input in an agent's output: the text
/// must contain `?` and at least one of the fixed indicator phrases
/// (case-insensitive). Returns the first sentence ending in `?`, or `None`
/// if the text doesn't qualify.
#[must_use]
pub fn detect_question(text: &str) -> Option<String> {
    if !text.contains('?') {
        return None;
    }
    let lower = text.to_lowercase();
    let has_indicator = QUESTION_INDICATORS.iter().any(|phrase| lower.contains(phrase));
    if !has_indicator {
        return None;
    }
    first_question_sentence(text)
}

/// Extracts the first `?`-terminated sentence: from the character after the
/// nearest preceding `.`/`!`/`?` (or the start of the string) through the
/// first `?`, trimmed.
fn first_question_sentence(text: &str) -> Option<String> {
    let q_pos = text.find('?')?;
    let start = text[..q_pos]
        .rfind(['.', '!', '?'])
        .map_or(0, |boundary| boundary + 1);
    let sentence = text[start..=q_pos].trim();
    if sentence.is_empty() {
        None
    } else {
        Some(sentence.to_string())
    }
}
