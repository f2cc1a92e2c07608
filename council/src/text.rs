//! Text policies applied between generation and speech.

use once_cell::sync::Lazy;
use regex::Regex;

/// Replies whose speakable text is shorter than this are not voiced.
pub const MIN_SPOKEN_CHARS: usize = 5;

const EMPHASIS: char = '*';

static REASONING: Lazy<Regex> = Lazy::new(|| {
    // (?s) lets a block span lines; the lazy quantifier closes at the first end tag
    Regex::new(r"(?s)<think>.*?</think>").expect("valid reasoning pattern")
});

/// Remove `<think>…</think>` blocks and surrounding whitespace from a reply.
///
/// ```
/// use council::strip_reasoning;
/// assert_eq!(strip_reasoning("<think>\nhmm\n</think>\nHello"), "Hello");
/// ```
pub fn strip_reasoning(response: &str) -> String {
    REASONING.replace_all(response, "").trim().to_string()
}

/// Keep only plain ASCII and drop emphasis markers so the synthesizer reads
/// clean text.
pub fn sanitize_for_speech(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii() && *c != EMPHASIS)
        .collect()
}

/// Whether `speech` is long enough to be worth synthesizing.
pub(crate) fn worth_speaking(speech: &str) -> bool {
    speech.trim().chars().count() >= MIN_SPOKEN_CHARS
}
