//! Core types for the diagnosis time pipeline.
//!
//! These types model the per-record lifecycle:
//! Record → SentenceMatch → TemporalCandidate → TimePhrase → ExtractionResult.

use serde::{Deserialize, Serialize};

use crate::models::{ExtractionMethod, TemporalType};

// ═══════════════════════════════════════════
// Spans
// ═══════════════════════════════════════════

/// Half-open byte range `[start, end)` into a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

// ═══════════════════════════════════════════
// Locator output
// ═══════════════════════════════════════════

/// The sentence holding a diagnosis self-report and where the pattern sits in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceMatch {
    pub sentence: String,
    pub pattern_start: usize,
    pub pattern_length: usize,
}

impl SentenceMatch {
    pub fn mention_span(&self) -> Span {
        Span::new(self.pattern_start, self.pattern_start + self.pattern_length)
    }

    pub fn mention_text(&self) -> &str {
        &self.sentence[self.pattern_start..self.pattern_start + self.pattern_length]
    }
}

// ═══════════════════════════════════════════
// Temporal expressions
// ═══════════════════════════════════════════

/// A temporal expression as reported by a tagger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalExpression {
    pub text: String,
    /// Normalized value (TIMEX3 style, e.g. "2019-03", "P2Y").
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub temporal_type: TemporalType,
}

/// A non-SET temporal expression competing to be the diagnosis time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalCandidate {
    pub surface_text: String,
    pub normalized_value: String,
    pub start: usize,
    pub end: usize,
    pub temporal_type: TemporalType,
    /// Signed character gap to the mention span; set by `score_candidates`.
    pub char_distance: i64,
}

impl TemporalCandidate {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

impl From<TemporalExpression> for TemporalCandidate {
    fn from(expr: TemporalExpression) -> Self {
        Self {
            surface_text: expr.text,
            normalized_value: expr.value,
            start: expr.start,
            end: expr.end,
            temporal_type: expr.temporal_type,
            char_distance: 0,
        }
    }
}

/// The chosen time expression for a mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePhrase {
    pub value: String,
    pub text: String,
}

impl From<TemporalCandidate> for TimePhrase {
    fn from(candidate: TemporalCandidate) -> Self {
        Self {
            value: candidate.normalized_value,
            text: candidate.surface_text,
        }
    }
}

/// A selector's pick for one mention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub chosen: Option<TemporalCandidate>,
    /// No dependency parse existed, so proximity decided.
    pub unparsed: bool,
}

impl Selection {
    pub fn new(chosen: Option<TemporalCandidate>) -> Self {
        Self {
            chosen,
            unparsed: false,
        }
    }
}

// ═══════════════════════════════════════════
// Attachment outcome
// ═══════════════════════════════════════════

/// Result of dependency attachment for one mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentOutcome {
    /// Candidates in the subtree governed by the mention head (may be empty).
    Attached(Vec<TemporalCandidate>),
    /// The mention tokens do not form a single-headed constituent.
    NoConstituent { span: Span },
    /// No parse could be produced for the sentence.
    Unavailable(String),
}

// ═══════════════════════════════════════════
// Record outcome + batch summary
// ═══════════════════════════════════════════

/// How a single record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    Extracted,
    NoMention,
    NoCandidates,
    Skipped,
}

/// Counts per outcome for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: u32,
    pub extracted: u32,
    pub no_mention: u32,
    pub no_candidates: u32,
    pub skipped: u32,
    /// Records where `parsing` found no dependency parse and fell back to proximity.
    pub unparsed: u32,
    pub duration_ms: u64,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: RecordOutcome) {
        self.total += 1;
        match outcome {
            RecordOutcome::Extracted => self.extracted += 1,
            RecordOutcome::NoMention => self.no_mention += 1,
            RecordOutcome::NoCandidates => self.no_candidates += 1,
            RecordOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Results of a batch, aligned with the input records.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub results: Vec<Option<crate::models::ExtractionResult>>,
    pub summary: BatchSummary,
}

// ═══════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════

/// Tunables for one extraction run (`[extraction]` in the config file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub method: ExtractionMethod,
    /// Characters of context kept before the pattern when confirming a mention.
    pub context_before: usize,
    /// Characters of context kept after the pattern.
    pub context_after: usize,
    /// Parallel workers for batch runs (1 = sequential).
    pub workers: usize,
    /// Per-record time limit for concurrent runs.
    pub record_timeout_secs: Option<u64>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            method: ExtractionMethod::Parsing,
            context_before: 50,
            context_after: 100,
            workers: 1,
            record_timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_contains_is_half_open() {
        let span = Span::new(3, 7);
        assert!(span.contains(3));
        assert!(span.contains(6));
        assert!(!span.contains(7));
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn sentence_match_exposes_mention() {
        let m = SentenceMatch {
            sentence: "I was diagnosed with depression.".into(),
            pattern_start: 6,
            pattern_length: 25,
        };
        assert_eq!(m.mention_text(), "diagnosed with depression");
        assert_eq!(m.mention_span(), Span::new(6, 31));
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = BatchSummary::default();
        summary.record(RecordOutcome::Extracted);
        summary.record(RecordOutcome::NoMention);
        summary.record(RecordOutcome::NoMention);
        summary.record(RecordOutcome::Skipped);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.extracted, 1);
        assert_eq!(summary.no_mention, 2);
        assert_eq!(summary.no_candidates, 0);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn default_settings_match_window() {
        let settings = ExtractionSettings::default();
        assert_eq!(settings.context_before, 50);
        assert_eq!(settings.context_after, 100);
        assert_eq!(settings.method, ExtractionMethod::Parsing);
        assert_eq!(settings.workers, 1);
    }

    #[test]
    fn time_phrase_from_candidate() {
        let candidate = TemporalCandidate {
            surface_text: "March 2019".into(),
            normalized_value: "2019-03".into(),
            start: 0,
            end: 10,
            temporal_type: TemporalType::Date,
            char_distance: 4,
        };
        let phrase = TimePhrase::from(candidate);
        assert_eq!(phrase.value, "2019-03");
        assert_eq!(phrase.text, "March 2019");
    }
}
