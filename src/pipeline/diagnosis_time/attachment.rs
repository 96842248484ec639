//! Dependency Attachment Resolver.
//!
//! Finds the syntactic head of the mention span and keeps the candidates whose
//! first token lies in a subtree governed by that head. Coordination and
//! independent clauses below the head are not followed. When nothing attaches
//! and the head is not itself a clause boundary, the head's parent is tried once.

use std::collections::HashSet;
use std::sync::Arc;

use super::traits::DependencyParser;
use super::types::{AttachmentOutcome, Span, TemporalCandidate};
use crate::nlp::dependency::DependencyTree;

/// Child relations whose subtrees are never searched for attached candidates.
pub const EXCLUDED_RELATIONS: &[&str] = &["conj", "parataxis", "advcl"];

/// Head relations that stop the retry with the head's parent.
pub const CLAUSE_BOUNDARY_RELATIONS: &[&str] = &["ccomp", "parataxis", "conj", "advcl"];

#[derive(Clone)]
pub struct AttachmentResolver {
    parser: Arc<dyn DependencyParser>,
}

impl AttachmentResolver {
    pub fn new(parser: Arc<dyn DependencyParser>) -> Self {
        Self { parser }
    }

    /// Parse `sentence` and return the candidates attached to the mention.
    pub fn resolve(
        &self,
        sentence: &str,
        mention: Span,
        candidates: &[TemporalCandidate],
    ) -> AttachmentOutcome {
        match self.parser.parse(sentence) {
            Ok(tree) => resolve_in_tree(&tree, mention, candidates),
            Err(e) => AttachmentOutcome::Unavailable(e.to_string()),
        }
    }
}

/// Attachment over an already parsed sentence.
pub fn resolve_in_tree(
    tree: &DependencyTree,
    mention: Span,
    candidates: &[TemporalCandidate],
) -> AttachmentOutcome {
    let Some(head) = find_head(tree, mention) else {
        return AttachmentOutcome::NoConstituent { span: mention };
    };

    let mut found = attached(tree, head, candidates);

    let head_token = tree.token(head);
    if found.is_empty() && !head_token.has_relation(CLAUSE_BOUNDARY_RELATIONS) {
        let parent = tree.parent_or_self(head);
        tracing::debug!(
            head = %head_token.text,
            relation = %head_token.label,
            parent = %tree.token(parent).text,
            "Nothing attached to mention head, retrying with its parent"
        );
        found = attached(tree, parent, candidates);
    }

    AttachmentOutcome::Attached(found)
}

/// The token of `mention` that dominates the most other mention tokens.
///
/// Ties go to the earlier token. Returns `None` when no token starts inside
/// the span, or when the chosen token has an ancestor inside the span.
pub fn find_head(tree: &DependencyTree, mention: Span) -> Option<usize> {
    let members = tree.tokens_in(mention);
    if members.is_empty() {
        return None;
    }

    let dominated = |idx: usize| {
        members
            .iter()
            .filter(|&&other| other != idx && tree.is_ancestor(idx, other))
            .count()
    };

    let mut head = members[0];
    let mut best = dominated(head);
    for &idx in &members[1..] {
        let count = dominated(idx);
        if count > best {
            head = idx;
            best = count;
        }
    }

    if tree.ancestors(head).any(|a| members.contains(&a)) {
        return None;
    }
    Some(head)
}

/// Candidates whose start offset belongs to the subtree of a non-excluded child of `head`.
pub fn attached(
    tree: &DependencyTree,
    head: usize,
    candidates: &[TemporalCandidate],
) -> Vec<TemporalCandidate> {
    let offsets: HashSet<usize> = tree
        .children(head)
        .iter()
        .filter(|&&child| !tree.token(child).has_relation(EXCLUDED_RELATIONS))
        .flat_map(|&child| tree.subtree(child))
        .map(|idx| tree.token(idx).offset)
        .collect();

    candidates
        .iter()
        .filter(|c| offsets.contains(&c.start))
        .cloned()
        .collect()
}
