//! Rule-based sentence segmentation.
//!
//! Splits on `.`, `?` and `!` (including runs like `?!` or `...` and trailing
//! closing quotes/brackets) when followed by whitespace or end of text, and on
//! blank lines. A period after a known abbreviation ("Dr.", "e.g.") or a single
//! letter initial (other than the pronoun "I") does not end a sentence.

use std::collections::HashSet;

use crate::pipeline::diagnosis_time::SentenceSegmenter;

/// Common abbreviations that should NOT be treated as sentence boundaries.
const COMMON_ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "sr", "jr",
    "inc", "ltd", "corp", "co", "llc",
    "e.g", "i.e", "vs", "etc", "approx",
    "u.s", "u.k", "p.m", "a.m",
    "st", "ave", "blvd", "dept", "fig",
    "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec",
];

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '?' | '!')
}

fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

/// Punctuation-driven sentence splitter.
pub struct RuleSentenceSegmenter {
    abbreviations: HashSet<String>,
}

impl RuleSentenceSegmenter {
    pub fn new() -> Self {
        Self {
            abbreviations: COMMON_ABBREVIATIONS.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Whether the word ending right before the period at `dot` is an
    /// abbreviation or initial.
    fn is_abbreviation_before(&self, text: &str, dot: usize) -> bool {
        let before = &text[..dot];
        let word = before
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or_default()
            .trim_start_matches(|c: char| !c.is_alphanumeric());

        if word.is_empty() {
            return false;
        }

        // Single-letter initial; the pronoun "I" can still end a sentence
        let mut chars = word.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return c.is_alphabetic() && c != 'I';
        }

        self.abbreviations.contains(&word.to_lowercase())
    }
}

impl Default for RuleSentenceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSegmenter for RuleSentenceSegmenter {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut i = 0;

        let mut push = |from: usize, to: usize| {
            let sentence = text[from..to].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
        };

        while i < chars.len() {
            let (pos, ch) = chars[i];

            // Blank line: paragraph break
            if ch == '\n' {
                let mut j = i + 1;
                while j < chars.len() && chars[j].1 != '\n' && chars[j].1.is_whitespace() {
                    j += 1;
                }
                if j < chars.len() && chars[j].1 == '\n' {
                    push(start, pos);
                    start = chars[j].0 + 1;
                    i = j + 1;
                    continue;
                }
            }

            if is_terminator(ch) {
                let mut j = i + 1;
                while j < chars.len() && (is_terminator(chars[j].1) || is_closer(chars[j].1)) {
                    j += 1;
                }
                let end = chars.get(j).map_or(text.len(), |(p, _)| *p);
                let boundary = chars.get(j).map_or(true, |(_, c)| c.is_whitespace());
                let single_period = ch == '.' && j == i + 1;

                if boundary && !(single_period && self.is_abbreviation_before(text, pos)) {
                    push(start, end);
                    start = end;
                }
                i = j;
                continue;
            }

            i += 1;
        }

        push(start, text.len());
        sentences
    }
}
