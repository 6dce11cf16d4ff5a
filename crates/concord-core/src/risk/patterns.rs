//! Keyword and phrase tables for the heuristic risk detectors.
//!
//! Keywords are compiled into case-insensitive, word-bounded patterns so
//! that "bill" does not fire on "billion".

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // SENSITIVITY KEYWORDS
    // =========================================================================

    /// Political-context vocabulary
    pub static ref POLITICAL_KEYWORDS: Vec<(&'static str, Regex)> = keyword_patterns(&[
        "congress", "senate", "senator", "representative", "legislation",
        "bill", "election", "vote", "democrat", "republican",
        "policy", "government", "campaign", "partisan",
    ]);

    /// Controversial-topic vocabulary
    pub static ref CONTROVERSIAL_KEYWORDS: Vec<(&'static str, Regex)> = keyword_patterns(&[
        "abortion", "gun control", "immigration", "climate change",
        "healthcare", "taxes", "police", "border", "vaccine",
    ]);

    /// Emotionally-charged vocabulary
    pub static ref EMOTIONAL_KEYWORDS: Vec<(&'static str, Regex)> = keyword_patterns(&[
        "outrageous", "disgusting", "furious", "betrayal", "disaster",
        "shameful", "crisis", "corrupt", "evil", "destroy",
    ]);

    // =========================================================================
    // ADVERSARIAL PATTERNS
    // =========================================================================

    /// Prompt-injection phrases aimed at the screening agents
    pub static ref PROMPT_INJECTION_PATTERNS: Vec<(&'static str, Regex)> = vec![
        ("ignore instructions", Regex::new(
            r"(?i)\b(ignore|disregard|forget)\s+(all\s+)?(the\s+)?(previous|prior|above|earlier)\s+(instructions|prompts|rules)"
        ).unwrap()),
        ("role override", Regex::new(r"(?i)\bact\s+as\s+(a|an|if|my|the)\b").unwrap()),
        ("identity override", Regex::new(r"(?i)\byou\s+are\s+now\b").unwrap()),
        ("pretend", Regex::new(r"(?i)\bpretend\s+(to\s+be|you\s+are)\b").unwrap()),
        ("system prompt", Regex::new(r"(?i)\b(system\s+prompt|developer\s+mode|jailbreak)\b").unwrap()),
    ];

    // =========================================================================
    // NOVELTY PATTERNS
    // =========================================================================

    /// Three or more consecutive whitespace characters
    pub static ref IRREGULAR_WHITESPACE: Regex = Regex::new(r"\s{3,}").unwrap();
}

fn keyword_patterns(keywords: &[&'static str]) -> Vec<(&'static str, Regex)> {
    keywords
        .iter()
        .map(|kw| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(kw).replace(' ', r"\s+"));
            (*kw, Regex::new(&pattern).unwrap())
        })
        .collect()
}

/// Distinct keywords from `table` that occur in `content`.
pub fn matched_keywords(content: &str, table: &[(&'static str, Regex)]) -> Vec<&'static str> {
    table
        .iter()
        .filter(|(_, re)| re.is_match(content))
        .map(|(kw, _)| *kw)
        .collect()
}

/// Name of the first prompt-injection pattern found, if any.
pub fn find_prompt_injection(content: &str) -> Option<&'static str> {
    PROMPT_INJECTION_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(content))
        .map(|(name, _)| *name)
}

/// Check if content contains irregular whitespace runs.
pub fn has_irregular_whitespace(content: &str) -> bool {
    IRREGULAR_WHITESPACE.is_match(content)
}
