//! Extraction methods as `TimeSelector` strategies.
//!
//! - `AttachmentSelector` (`parsing`): dependency attachment first, proximity
//!   over the full candidate set when nothing attaches or no parse exists.
//! - `ProximitySelector` (`char_dist`): proximity only.

use std::sync::Arc;

use super::attachment::AttachmentResolver;
use super::error::DiagnosisTimeError;
use super::ranker::rank;
use super::traits::{DependencyParser, SelectionContext, TimeSelector};
use super::types::{AttachmentOutcome, Selection};
use crate::models::ExtractionMethod;

/// Nearest candidate by character distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximitySelector;

impl TimeSelector for ProximitySelector {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::CharDist
    }

    fn select(&self, context: &SelectionContext<'_>) -> Result<Selection, DiagnosisTimeError> {
        Ok(Selection::new(rank(context.candidates)))
    }
}

/// Nearest candidate among those syntactically attached to the mention.
pub struct AttachmentSelector {
    resolver: AttachmentResolver,
}

impl AttachmentSelector {
    pub fn new(parser: Arc<dyn DependencyParser>) -> Self {
        Self {
            resolver: AttachmentResolver::new(parser),
        }
    }
}

impl TimeSelector for AttachmentSelector {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Parsing
    }

    fn select(&self, context: &SelectionContext<'_>) -> Result<Selection, DiagnosisTimeError> {
        match self
            .resolver
            .resolve(context.sentence, context.mention, context.candidates)
        {
            AttachmentOutcome::Attached(found) if !found.is_empty() => {
                Ok(Selection::new(rank(&found)))
            }
            AttachmentOutcome::Attached(_) => {
                tracing::debug!("No attached candidate, falling back to proximity");
                Ok(Selection::new(rank(context.candidates)))
            }
            AttachmentOutcome::Unavailable(reason) => {
                tracing::debug!(%reason, "Parse unavailable, falling back to proximity");
                Ok(Selection {
                    chosen: rank(context.candidates),
                    unparsed: true,
                })
            }
            AttachmentOutcome::NoConstituent { span } => Err(DiagnosisTimeError::NoConstituent {
                start: span.start,
                end: span.end,
            }),
        }
    }
}

/// Strategy for an extraction method.
pub fn selector_for(
    method: ExtractionMethod,
    parser: Arc<dyn DependencyParser>,
) -> Box<dyn TimeSelector> {
    match method {
        ExtractionMethod::Parsing => Box::new(AttachmentSelector::new(parser)),
        ExtractionMethod::CharDist => Box::new(ProximitySelector),
    }
}
