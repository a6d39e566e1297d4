//! Extractive summary and key-term extraction for report text.

use std::collections::BTreeSet;

use serde::Serialize;

const SUMMARY_SENTENCES: usize = 3;
const SUMMARY_FALLBACK_CHARS: usize = 250;
const MAX_KEY_TERMS: usize = 10;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "either", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself",
    "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "per", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "upon", "very", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "within", "without",
    "would", "you", "your", "yours", "yourself", "yourselves",
];

/// Summary and key terms of one report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    pub summary: String,
    pub key_terms: Vec<String>,
}

/// Interprets report text.
///
/// ```
/// use medscan::interpret;
///
/// let result = interpret("Hemoglobin is low. Ferritin is low. Follow up in 3 months. Repeat CBC.");
/// assert_eq!(result.summary, "Hemoglobin is low. Ferritin is low. Follow up in 3 months.");
/// assert_eq!(result.key_terms[0], "cbc");
/// ```
pub fn interpret(text: &str) -> Interpretation {
    Interpretation {
        summary: summarize(text),
        key_terms: key_terms(text),
    }
}

/// The first three sentences, or the leading characters when there are none.
pub fn summarize(text: &str) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return text.chars().take(SUMMARY_FALLBACK_CHARS).collect();
    }
    sentences
        .into_iter()
        .take(SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unique lowercase alphabetic words that are not stop words, sorted, at most ten.
pub fn key_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|word| word.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_KEY_TERMS)
        .collect()
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let boundary = match c {
            '\n' => Some(i),
            // A dot inside a number such as "6.9" does not end a sentence.
            '.' | '!' | '?' => match chars.peek() {
                None => Some(i + c.len_utf8()),
                Some(&(_, next)) if next.is_whitespace() => Some(i + c.len_utf8()),
                _ => None,
            },
            _ => None,
        };
        if let Some(end) = boundary {
            push_trimmed(&mut sentences, &text[start..end]);
            start = i + c.len_utf8();
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    // Punctuation-only fragments such as "..." are not sentences.
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed);
    }
}
