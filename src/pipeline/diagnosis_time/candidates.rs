//! Temporal Candidate Extractor and char-distance scoring.

use std::sync::Arc;

use chrono::NaiveDate;

use super::error::DiagnosisTimeError;
use super::traits::TemporalTagger;
use super::types::{Span, TemporalCandidate};
use crate::models::TemporalType;

/// Wraps a tagger and keeps only expressions that can denote a single instant.
#[derive(Clone)]
pub struct CandidateExtractor {
    tagger: Arc<dyn TemporalTagger>,
}

impl CandidateExtractor {
    pub fn new(tagger: Arc<dyn TemporalTagger>) -> Self {
        Self { tagger }
    }

    /// Tag `sentence` relative to `reference` and drop `SET` expressions.
    /// `char_distance` is left at 0 until [`score_candidates`] runs.
    pub fn extract(
        &self,
        sentence: &str,
        reference: Option<NaiveDate>,
    ) -> Result<Vec<TemporalCandidate>, DiagnosisTimeError> {
        let expressions = self.tagger.tag(sentence, reference)?;
        let total = expressions.len();

        let candidates: Vec<TemporalCandidate> = expressions
            .into_iter()
            .filter(|e| e.temporal_type != TemporalType::Set)
            .map(TemporalCandidate::from)
            .collect();

        tracing::debug!(
            tagged = total,
            candidates = candidates.len(),
            reference = ?reference,
            "Temporal candidates extracted"
        );

        Ok(candidates)
    }
}

/// Character index of a byte offset.
fn char_index(sentence: &str, byte_offset: usize) -> i64 {
    sentence
        .get(..byte_offset)
        .map_or(byte_offset, |prefix| prefix.chars().count()) as i64
}

/// Signed gap in characters between two spans: `max(a.start - b.end, b.start - a.end)`.
/// Non-negative when the spans are disjoint, negative when they overlap.
pub fn char_distance(sentence: &str, a: Span, b: Span) -> i64 {
    let (a_start, a_end) = (char_index(sentence, a.start), char_index(sentence, a.end));
    let (b_start, b_end) = (char_index(sentence, b.start), char_index(sentence, b.end));
    (a_start - b_end).max(b_start - a_end)
}

/// Set every candidate's `char_distance` relative to the mention.
pub fn score_candidates(sentence: &str, mention: Span, candidates: &mut [TemporalCandidate]) {
    for candidate in candidates.iter_mut() {
        candidate.char_distance = char_distance(sentence, mention, candidate.span());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::temporal::RuleTemporalTagger;
    use crate::pipeline::diagnosis_time::TemporalExpression;
    use proptest::prelude::*;

    struct FixedTagger(Vec<TemporalExpression>);

    impl TemporalTagger for FixedTagger {
        fn tag(
            &self,
            _text: &str,
            _reference: Option<NaiveDate>,
        ) -> Result<Vec<TemporalExpression>, DiagnosisTimeError> {
            Ok(self.0.clone())
        }
    }

    struct FailingTagger;

    impl TemporalTagger for FailingTagger {
        fn tag(
            &self,
            _text: &str,
            _reference: Option<NaiveDate>,
        ) -> Result<Vec<TemporalExpression>, DiagnosisTimeError> {
            Err(DiagnosisTimeError::Tagger("backend down".into()))
        }
    }

    fn make_expr(text: &str, start: usize, temporal_type: TemporalType) -> TemporalExpression {
        TemporalExpression {
            text: text.to_string(),
            value: "X".to_string(),
            start,
            end: start + text.len(),
            temporal_type,
        }
    }

    #[test]
    fn set_expressions_are_dropped() {
        let extractor = CandidateExtractor::new(Arc::new(FixedTagger(vec![
            make_expr("every day", 0, TemporalType::Set),
            make_expr("2019", 20, TemporalType::Date),
            make_expr("two years", 30, TemporalType::Duration),
        ])));
        let candidates = extractor.extract("ignored", None).unwrap();
        let texts: Vec<&str> = candidates.iter().map(|c| c.surface_text.as_str()).collect();
        assert_eq!(texts, vec!["2019", "two years"]);
        assert!(candidates.iter().all(|c| c.char_distance == 0));
    }

    #[test]
    fn real_tagger_set_never_a_candidate() {
        let extractor = CandidateExtractor::new(Arc::new(RuleTemporalTagger::new()));
        let candidates = extractor
            .extract("I take meds every day since my diagnosis in 2015.", None)
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].surface_text, "2015");
    }

    #[test]
    fn tagger_error_propagates() {
        let extractor = CandidateExtractor::new(Arc::new(FailingTagger));
        assert!(matches!(
            extractor.extract("x", None),
            Err(DiagnosisTimeError::Tagger(_))
        ));
    }

    #[test]
    fn distance_after_and_before_mention() {
        let sentence = "I was diagnosed with depression in March 2019.";
        let mention = Span::new(6, 31);
        // "March 2019" starts 4 chars after the mention ends
        assert_eq!(char_distance(sentence, mention, Span::new(35, 45)), 4);
        // "I" ends 5 chars before the mention starts
        assert_eq!(char_distance(sentence, mention, Span::new(0, 1)), 5);
        // overlapping spans are negative
        assert!(char_distance(sentence, mention, Span::new(20, 40)) < 0);
    }

    #[test]
    fn distance_counts_characters() {
        let sentence = "diagnosed — ééé 2019";
        let mention = Span::new(0, 9);
        let start = sentence.find("2019").unwrap();
        // bytes differ from chars: the em dash is 3 bytes, each é is 2
        assert_eq!(char_distance(sentence, mention, Span::new(start, start + 4)), 7);
    }

    #[test]
    fn score_sets_every_candidate() {
        let sentence = "In 2016 I was diagnosed with depression in March 2019.";
        let mut candidates: Vec<TemporalCandidate> = vec![
            make_expr("2016", 3, TemporalType::Date).into(),
            make_expr("March 2019", 43, TemporalType::Date).into(),
        ];
        score_candidates(sentence, Span::new(14, 39), &mut candidates);
        assert_eq!(candidates[0].char_distance, 7);
        assert_eq!(candidates[1].char_distance, 4);
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(a in 0usize..60, a_len in 0usize..20, b in 0usize..60, b_len in 0usize..20) {
            let sentence = "x".repeat(100);
            let first = Span::new(a, a + a_len);
            let second = Span::new(b, b + b_len);
            prop_assert_eq!(
                char_distance(&sentence, first, second),
                char_distance(&sentence, second, first)
            );
        }

        #[test]
        fn disjoint_spans_are_non_negative(a in 0usize..40, a_len in 1usize..10, gap in 0usize..30, b_len in 1usize..10) {
            let sentence = "y".repeat(100);
            let first = Span::new(a, a + a_len);
            let second = Span::new(first.end + gap, first.end + gap + b_len);
            let d = char_distance(&sentence, first, second);
            prop_assert_eq!(d, gap as i64);
            prop_assert!(char_distance(&sentence, second, first) >= 0);
        }
    }
}
