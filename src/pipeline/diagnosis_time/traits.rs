//! Trait definitions for the diagnosis time pipeline.
//!
//! Three traits are the collaborator seams (swap in any NLP backend):
//! - SentenceSegmenter: text → sentences
//! - DependencyParser: sentence → dependency tree
//! - TemporalTagger: sentence + reference date → temporal expressions
//!
//! One trait is the method seam:
//! - TimeSelector: candidates around a mention → the diagnosis time

use chrono::NaiveDate;

use super::error::DiagnosisTimeError;
use super::types::{Selection, Span, TemporalCandidate, TemporalExpression};
use crate::models::ExtractionMethod;
use crate::nlp::dependency::DependencyTree;

/// Splits free text into sentences, in order.
pub trait SentenceSegmenter: Send + Sync {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str>;
}

/// Produces a dependency tree whose token offsets index into `sentence`.
pub trait DependencyParser: Send + Sync {
    fn parse(&self, sentence: &str) -> Result<DependencyTree, DiagnosisTimeError>;
}

/// Finds temporal expressions in a sentence. Spans are byte offsets into `text`.
pub trait TemporalTagger: Send + Sync {
    fn tag(
        &self,
        text: &str,
        reference: Option<NaiveDate>,
    ) -> Result<Vec<TemporalExpression>, DiagnosisTimeError>;
}

/// Everything a selector needs about one mention.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub sentence: &'a str,
    pub mention: Span,
    /// Scored candidates (char_distance set), in tagger order.
    pub candidates: &'a [TemporalCandidate],
}

/// Picks the diagnosis time among scored candidates.
pub trait TimeSelector: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    fn select(&self, context: &SelectionContext<'_>) -> Result<Selection, DiagnosisTimeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify traits are object-safe (can be used as `dyn Trait`)
    #[test]
    fn traits_are_object_safe() {
        fn _assert_segmenter(_: &dyn SentenceSegmenter) {}
        fn _assert_parser(_: &dyn DependencyParser) {}
        fn _assert_tagger(_: &dyn TemporalTagger) {}
        fn _assert_selector(_: &dyn TimeSelector) {}
    }
}
