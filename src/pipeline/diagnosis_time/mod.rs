//! Diagnosis Time Extraction Pipeline
//!
//! Finds, in a free-text self-report, the temporal expression that says *when*
//! a diagnosis happened, anchored to the report's creation time.
//!
//! ## Architecture
//!
//! Five stages connected by traits:
//! ```text
//! Locator → Candidate Extractor → Attachment Resolver → Ranker → Runner
//!   │              │                     │
//!   │        TemporalTagger        DependencyParser
//! SentenceSegmenter
//! ```
//!
//! ## Methods
//! - `parsing` (default): candidates syntactically attached to the mention
//!   head win; proximity over all candidates when nothing attaches.
//! - `char_dist`: proximity only.
//!
//! ## Outcomes per record
//! - no qualifying mention → `None`
//! - no non-SET temporal expression → `None`
//! - mention span is not a constituent, tagger failure, timeout → logged skip, `None`

pub mod error;
pub mod types;
pub mod traits;
pub mod locator;
pub mod candidates;
pub mod attachment;
pub mod ranker;
pub mod selector;
pub mod runner;
pub mod concurrent;

pub use error::{DiagnosisTimeError, DiagnosisTimeResult};
pub use types::*;
pub use traits::*;
pub use locator::{Lexicon, MentionLocator};
pub use candidates::{char_distance, score_candidates, CandidateExtractor};
pub use attachment::AttachmentResolver;
pub use ranker::rank;
pub use selector::{selector_for, AttachmentSelector, ProximitySelector};
pub use runner::{DiagnosisTimeRunner, NlpContext, RecordExtraction};
pub use concurrent::run_concurrent;
