//! Diagnosis Mention Locator: pattern hit confirmed by nearby context vocabulary.
//!
//! Sentences are scanned in order; inside a sentence the patterns are tried
//! in priority order and only the first occurrence of each is considered.
//! The first hit whose surrounding window contains a context word wins.

use regex::Regex;

use super::error::DiagnosisTimeError;
use super::traits::SentenceSegmenter;
use super::types::{SentenceMatch, Span};

/// Prioritized diagnosis patterns plus the vocabulary that confirms them.
/// Entries are stored trimmed and lowercased; blank entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexicon {
    patterns: Vec<String>,
    context_words: Vec<String>,
}

impl Lexicon {
    pub fn new<P, C>(patterns: P, context_words: C) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Self {
            patterns: normalize_entries(patterns),
            context_words: normalize_entries(context_words),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn context_words(&self) -> &[String] {
        &self.context_words
    }
}

fn normalize_entries<I>(entries: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Finds the sentence and span of a diagnosis self-report.
#[derive(Debug, Clone)]
pub struct MentionLocator {
    patterns: Vec<Regex>,
    context_words: Vec<String>,
    context_before: usize,
    context_after: usize,
}

impl MentionLocator {
    /// Compile the lexicon's patterns as case-insensitive literals.
    /// `context_before` / `context_after` are window sizes in characters.
    pub fn new(
        lexicon: &Lexicon,
        context_before: usize,
        context_after: usize,
    ) -> Result<Self, DiagnosisTimeError> {
        let patterns = lexicon
            .patterns()
            .iter()
            .map(|p| {
                Regex::new(&format!("(?i){}", regex::escape(p))).map_err(|e| {
                    DiagnosisTimeError::Config(format!("invalid diagnosis pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            patterns,
            context_words: lexicon.context_words().to_vec(),
            context_before,
            context_after,
        })
    }

    /// First qualifying sentence of `text`, or `None`.
    pub fn locate(&self, segmenter: &dyn SentenceSegmenter, text: &str) -> Option<SentenceMatch> {
        segmenter.split(text).into_iter().find_map(|sentence| {
            self.match_sentence(sentence).map(|span| SentenceMatch {
                sentence: sentence.to_string(),
                pattern_start: span.start,
                pattern_length: span.len(),
            })
        })
    }

    /// Span of the first confirmed pattern occurrence within one sentence.
    pub fn match_sentence(&self, sentence: &str) -> Option<Span> {
        for pattern in &self.patterns {
            let Some(hit) = pattern.find(sentence) else {
                continue;
            };
            let span = Span::new(hit.start(), hit.end());
            let window = self.context_window(sentence, span).to_lowercase();
            if self.context_words.iter().any(|w| window.contains(w.as_str())) {
                tracing::debug!(
                    pattern = pattern.as_str(),
                    start = span.start,
                    end = span.end,
                    "Diagnosis mention confirmed"
                );
                return Some(span);
            }
        }
        None
    }

    /// The sentence slice from `context_before` chars before the span to
    /// `context_after` chars after it, clamped to the sentence.
    fn context_window<'a>(&self, sentence: &'a str, span: Span) -> &'a str {
        let from = match self.context_before {
            0 => span.start,
            n => sentence[..span.start]
                .char_indices()
                .rev()
                .nth(n - 1)
                .map_or(0, |(i, _)| i),
        };
        let to = sentence[span.end..]
            .char_indices()
            .nth(self.context_after)
            .map_or(sentence.len(), |(i, _)| span.end + i);
        &sentence[from..to]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::sentence::RuleSentenceSegmenter;

    fn make_locator(patterns: &[&str], words: &[&str]) -> MentionLocator {
        MentionLocator::new(&Lexicon::new(patterns, words), 50, 100).unwrap()
    }

    fn locate(locator: &MentionLocator, text: &str) -> Option<SentenceMatch> {
        locator.locate(&RuleSentenceSegmenter::new(), text)
    }

    #[test]
    fn finds_pattern_with_context() {
        let locator = make_locator(&["diagnosed with depression"], &["depression"]);
        let text = "Hi all. I was diagnosed with depression in March 2019 after years of struggling.";
        let found = locate(&locator, text).unwrap();
        assert_eq!(
            found.sentence,
            "I was diagnosed with depression in March 2019 after years of struggling."
        );
        assert_eq!(found.pattern_start, 6);
        assert_eq!(found.mention_text(), "diagnosed with depression");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let locator = make_locator(&["Diagnosed With"], &["DEPRESSION"]);
        let found = locate(&locator, "I was DIAGNOSED WITH Depression last year.").unwrap();
        assert_eq!(found.mention_text(), "DIAGNOSED WITH");
    }

    #[test]
    fn missing_context_word_rejects_sentence() {
        let locator = make_locator(&["diagnosed with"], &["depression", "depressed"]);
        assert!(locate(&locator, "I was diagnosed with diabetes in 2010.").is_none());
    }

    #[test]
    fn context_word_outside_window_is_ignored() {
        let locator = MentionLocator::new(&Lexicon::new(["diagnosed"], ["depression"]), 5, 5).unwrap();
        assert!(locator
            .match_sentence("I was diagnosed last spring with severe depression.")
            .is_none());
        assert!(locator.match_sentence("diagnosed: depression").is_none());
        assert!(locator.match_sentence("diagnosed, depr").is_none());
        assert!(locator.match_sentence("ok diagnosed depression").is_none());
        // exactly five characters after the pattern
        let narrow = MentionLocator::new(&Lexicon::new(["diagnosed"], ["sad"]), 5, 5).unwrap();
        assert!(narrow.match_sentence("diagnosed, sad!").is_some());
        assert!(narrow.match_sentence("diagnosed, so sad").is_none());
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        let locator = MentionLocator::new(&Lexicon::new(["diagnosed"], ["éé"]), 3, 3).unwrap();
        // three characters before the pattern are "éé " (five bytes)
        assert!(locator.match_sentence("xéé diagnosed").is_some());
        assert!(locator.match_sentence("ééx diagnosed").is_none());
    }

    #[test]
    fn first_sentence_wins() {
        let locator = make_locator(&["diagnosed with"], &["depression"]);
        let text = "I was diagnosed with depression in 2015. Then diagnosed with depression again.";
        let found = locate(&locator, text).unwrap();
        assert_eq!(found.sentence, "I was diagnosed with depression in 2015.");
    }

    #[test]
    fn pattern_priority_beats_position() {
        let locator = make_locator(&["diagnosed with depression", "diagnosed"], &["depression"]);
        let found = locate(&locator, "They diagnosed me, well I was diagnosed with depression.").unwrap();
        assert_eq!(found.mention_text(), "diagnosed with depression");
    }

    #[test]
    fn falls_through_to_lower_priority_pattern() {
        let locator = make_locator(&["diagnosed with depression", "diagnosed"], &["depressed"]);
        let found = locate(&locator, "I was diagnosed because I was depressed.").unwrap();
        assert_eq!(found.mention_text(), "diagnosed");
    }

    #[test]
    fn only_first_occurrence_is_checked() {
        // The first "diagnosed" has no context nearby; the second would, but is never tried.
        let locator = MentionLocator::new(&Lexicon::new(["diagnosed"], ["depression"]), 5, 5).unwrap();
        assert!(locator
            .match_sentence("diagnosed early, and later was diagnosed: depression")
            .is_none());
    }

    #[test]
    fn lexicon_drops_blank_entries() {
        let lexicon = Lexicon::new(["  Diagnosed With ", "", "   "], ["Depression", ""]);
        assert_eq!(lexicon.patterns(), &["diagnosed with".to_string()]);
        assert_eq!(lexicon.context_words(), &["depression".to_string()]);
    }

    #[test]
    fn pattern_metacharacters_are_literal() {
        let locator = make_locator(&["dx (depression)"], &["depression"]);
        assert!(locator.match_sentence("got my dx (depression) today").is_some());
        assert!(locator.match_sentence("got my dx depression today").is_none());
    }
}
