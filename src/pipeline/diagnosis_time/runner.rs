//! DiagnosisTimeRunner: Locator → Extractor → Selector per record.
//!
//! Records are independent. A record that cannot be processed (tagger failure,
//! mention span that is not a constituent) is logged and yields `None`; the
//! batch always continues.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;

use super::candidates::{score_candidates, CandidateExtractor};
use super::error::DiagnosisTimeError;
use super::locator::{Lexicon, MentionLocator};
use super::selector::selector_for;
use super::traits::*;
use super::types::*;
use crate::models::{DiagnosisRecord, ExtractionMethod, ExtractionResult};
use crate::nlp::sentence::RuleSentenceSegmenter;
use crate::nlp::temporal::RuleTemporalTagger;

/// The NLP collaborators, built once and shared read-only by every record.
#[derive(Clone)]
pub struct NlpContext {
    pub segmenter: Arc<dyn SentenceSegmenter>,
    pub parser: Arc<dyn DependencyParser>,
    pub tagger: Arc<dyn TemporalTagger>,
}

impl NlpContext {
    pub fn new(
        segmenter: Arc<dyn SentenceSegmenter>,
        parser: Arc<dyn DependencyParser>,
        tagger: Arc<dyn TemporalTagger>,
    ) -> Self {
        Self {
            segmenter,
            parser,
            tagger,
        }
    }

    /// Rule-based segmenter and tagger around the given parser.
    pub fn rule_based(parser: Arc<dyn DependencyParser>) -> Self {
        Self::new(
            Arc::new(RuleSentenceSegmenter::new()),
            parser,
            Arc::new(RuleTemporalTagger::new()),
        )
    }
}

/// Result of one record, with how it ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordExtraction {
    pub result: Option<ExtractionResult>,
    pub outcome: RecordOutcome,
    /// `parsing` had no dependency parse for the sentence.
    pub unparsed: bool,
}

impl RecordExtraction {
    pub(crate) fn empty(outcome: RecordOutcome) -> Self {
        Self {
            result: None,
            outcome,
            unparsed: false,
        }
    }
}

impl BatchOutput {
    /// Append one record's extraction, keeping input order.
    pub(crate) fn push(&mut self, extraction: RecordExtraction) {
        self.summary.record(extraction.outcome);
        if extraction.unparsed {
            self.summary.unparsed += 1;
        }
        self.results.push(extraction.result);
    }
}

/// Orchestrates diagnosis time extraction.
pub struct DiagnosisTimeRunner {
    segmenter: Arc<dyn SentenceSegmenter>,
    locator: MentionLocator,
    extractor: CandidateExtractor,
    selector: Box<dyn TimeSelector>,
}

impl DiagnosisTimeRunner {
    pub fn new(
        context: &NlpContext,
        lexicon: &Lexicon,
        settings: &ExtractionSettings,
    ) -> Result<Self, DiagnosisTimeError> {
        let locator = MentionLocator::new(lexicon, settings.context_before, settings.context_after)?;
        Ok(Self {
            segmenter: context.segmenter.clone(),
            locator,
            extractor: CandidateExtractor::new(context.tagger.clone()),
            selector: selector_for(settings.method, context.parser.clone()),
        })
    }

    pub fn method(&self) -> ExtractionMethod {
        self.selector.method()
    }

    /// Locate the diagnosis mention in `text`.
    pub fn locate(&self, text: &str) -> Option<SentenceMatch> {
        self.locator.locate(self.segmenter.as_ref(), text)
    }

    /// Pick the time expression for a mention in `sentence`.
    /// `Ok(None)` when the sentence holds no usable temporal expression.
    pub fn get_time_phrase(
        &self,
        sentence: &str,
        mention: Span,
        reference: Option<NaiveDate>,
    ) -> Result<Option<TimePhrase>, DiagnosisTimeError> {
        let selection = self.select_time(sentence, mention, reference)?;
        Ok(selection.chosen.map(TimePhrase::from))
    }

    fn select_time(
        &self,
        sentence: &str,
        mention: Span,
        reference: Option<NaiveDate>,
    ) -> Result<Selection, DiagnosisTimeError> {
        let mut candidates = self.extractor.extract(sentence, reference)?;
        if candidates.is_empty() {
            return Ok(Selection::default());
        }
        score_candidates(sentence, mention, &mut candidates);

        let context = SelectionContext {
            sentence,
            mention,
            candidates: &candidates,
        };
        self.selector.select(&context)
    }

    /// Process one record. `index` is only used for log context.
    pub fn extract_record(&self, index: usize, record: &DiagnosisRecord) -> RecordExtraction {
        let Some(found) = self.locate(&record.text) else {
            tracing::debug!(record = index, "No diagnosis mention");
            return RecordExtraction::empty(RecordOutcome::NoMention);
        };

        let selection =
            match self.select_time(&found.sentence, found.mention_span(), record.reference_date()) {
                Ok(selection) => selection,
                Err(e) => {
                    tracing::warn!(
                        record = index,
                        sentence = %found.sentence,
                        error = %e,
                        "Skipping record"
                    );
                    return RecordExtraction::empty(RecordOutcome::Skipped);
                }
            };
        let unparsed = selection.unparsed;
        let phrase = match selection.chosen {
            Some(chosen) => TimePhrase::from(chosen),
            None => {
                tracing::debug!(record = index, "No temporal candidate for mention");
                return RecordExtraction {
                    unparsed,
                    ..RecordExtraction::empty(RecordOutcome::NoCandidates)
                };
            }
        };

        tracing::debug!(
            record = index,
            value = %phrase.value,
            text = %phrase.text,
            method = self.method().as_str(),
            "Diagnosis time extracted"
        );

        RecordExtraction {
            result: Some(ExtractionResult {
                sentence: found.sentence,
                reference_time: record.reference_time,
                diagnosis_time_value: phrase.value,
                diagnosis_time_text: phrase.text,
            }),
            outcome: RecordOutcome::Extracted,
            unparsed,
        }
    }

    /// Sequential batch: one result per record, in input order.
    pub fn get_diagnosis_time(&self, records: &[DiagnosisRecord]) -> BatchOutput {
        let start = Instant::now();
        tracing::info!(
            records = records.len(),
            method = self.method().as_str(),
            "Starting diagnosis time extraction"
        );

        let mut output = BatchOutput::default();
        for (index, record) in records.iter().enumerate() {
            output.push(self.extract_record(index, record));
        }
        output.summary.duration_ms = start.elapsed().as_millis() as u64;

        log_summary(&output.summary);
        output
    }
}

pub(crate) fn log_summary(summary: &BatchSummary) {
    tracing::info!(
        total = summary.total,
        extracted = summary.extracted,
        no_mention = summary.no_mention,
        no_candidates = summary.no_candidates,
        skipped = summary.skipped,
        unparsed = summary.unparsed,
        duration_ms = summary.duration_ms,
        "Diagnosis time extraction complete"
    );
    if summary.unparsed > 0 {
        tracing::warn!(
            unparsed = summary.unparsed,
            "Sentences without a dependency parse were ranked by proximity only"
        );
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
