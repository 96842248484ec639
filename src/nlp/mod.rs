//! Built-in NLP collaborators: sentence splitting, temporal tagging, and
//! dependency trees loaded from CoNLL-U.

pub mod conllu;
pub mod dependency;
pub mod sentence;
pub mod temporal;

pub use conllu::ConlluParser;
pub use dependency::{DependencyToken, DependencyTree};
pub use sentence::RuleSentenceSegmenter;
pub use temporal::RuleTemporalTagger;
