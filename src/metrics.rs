//! Text metrics: tokenization, counts, and readability.
//!
//! Everything here is a pure function of the input text. Word counts use
//! a cleaned tokenization (tags stripped, non-sentence punctuation
//! removed, whitespace collapsed) so the same tokenizer backs both the
//! per-section counts and the title totals. Readability is Flesch reading
//! ease; inputs below a minimum length short-circuit to 0.0 rather than
//! producing an unreliable score on a tiny sample.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ParsedTitle, TitleMetrics};

/// Texts shorter than this are not scored (see [`readability_score`]).
pub const MIN_READABILITY_LEN: usize = 100;

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn nonsentence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s.,;:!?]").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w+\b").unwrap())
}

/// Clean text for analysis: strip markup tags, drop punctuation that does
/// not delimit sentences, and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = tag_re().replace_all(text, " ");
    let text = nonsentence_re().replace_all(&text, " ");
    let text = whitespace_re().replace_all(&text, " ");
    text.trim().to_string()
}

/// Count words in text after cleaning.
pub fn count_words(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let clean = clean_text(text);
    word_re().find_iter(&clean).count() as u64
}

/// Count sentences by terminator characters, not via the scorer.
pub fn count_sentences(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    let clean = clean_text(text);
    clean
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count() as u64
}

/// Count paragraphs by blank-line delimiters in the raw text.
pub fn count_paragraphs(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    text.split("\n\n").filter(|p| !p.trim().is_empty()).count() as u64
}

/// Flesch reading ease of `text`, or 0.0 when the input is shorter than
/// `min_len` characters. The scorer itself is total: any scorable input
/// yields a finite number.
pub fn readability_score(text: &str, min_len: usize) -> f64 {
    if text.len() < min_len {
        return 0.0;
    }

    let clean = clean_text(text);
    let words: Vec<&str> = word_re().find_iter(&clean).map(|m| m.as_str()).collect();
    let word_count = words.len();
    let sentence_count = count_sentences(&clean).max(1) as f64;

    if word_count == 0 {
        return 0.0;
    }

    let syllables: u64 = words.iter().map(|w| estimate_syllables(w)).sum();

    206.835 - 1.015 * (word_count as f64 / sentence_count)
        - 84.6 * (syllables as f64 / word_count as f64)
}

/// Heuristic syllable count: vowel groups, minus a trailing silent 'e',
/// floor of one.
fn estimate_syllables(word: &str) -> u64 {
    let lower = word.to_lowercase();
    let mut count = 0u64;
    let mut prev_vowel = false;
    for c in lower.chars() {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = is_vowel;
    }
    if lower.ends_with('e') && !lower.ends_with("le") && count > 1 {
        count -= 1;
    }
    count.max(1)
}

/// Derive title-level metrics from a parsed title. Pure: reads only the
/// section and chapter lists. The word total is the sum of the per-section
/// counts, so the two can never drift apart.
pub fn compute(title: &ParsedTitle) -> TitleMetrics {
    let word_count: u64 = title.sections.iter().map(|s| s.word_count).sum();
    let paragraph_count: u64 = title.sections.iter().map(|s| s.paragraphs.len() as u64).sum();

    let readability_score = if title.sections.is_empty() {
        0.0
    } else {
        title
            .sections
            .iter()
            .map(|s| s.readability_score)
            .sum::<f64>()
            / title.sections.len() as f64
    };

    TitleMetrics {
        word_count,
        section_count: title.sections.len() as u64,
        paragraph_count,
        chapter_count: title.chapters.len() as u64,
        readability_score,
    }
}
