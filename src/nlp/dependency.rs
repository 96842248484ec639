//! Arena dependency tree.
//!
//! Tokens live in a `Vec` in sentence order; heads are indices into it and the
//! children adjacency is built once. Ancestor walks and subtree collection are
//! index chasing, so the tree can be shared freely between threads.

use serde::{Deserialize, Serialize};

use crate::pipeline::diagnosis_time::{DiagnosisTimeError, Span};

/// One token of a parsed sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyToken {
    /// Byte offset of the token's first character in the sentence.
    pub offset: usize,
    pub text: String,
    /// Dependency relation to the head (e.g. "nsubj", "obl:tmod", "ROOT").
    pub label: String,
    /// Index of the head token; `None` for the root.
    pub head: Option<usize>,
}

impl DependencyToken {
    /// Relation without its subtype, lowercased ("obl:tmod" → "obl").
    pub fn relation(&self) -> String {
        self.label
            .split(':')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    pub fn has_relation(&self, relations: &[&str]) -> bool {
        let relation = self.relation();
        relations.iter().any(|r| *r == relation)
    }
}

/// A single-rooted dependency tree over one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyTree {
    tokens: Vec<DependencyToken>,
    children: Vec<Vec<usize>>,
}

impl DependencyTree {
    /// Build a tree, checking that heads are in range, there is exactly one
    /// root and no cycles.
    pub fn new(tokens: Vec<DependencyToken>) -> Result<Self, DiagnosisTimeError> {
        let n = tokens.len();
        let mut children = vec![Vec::new(); n];
        let mut roots = 0;

        for (idx, token) in tokens.iter().enumerate() {
            match token.head {
                None => roots += 1,
                Some(head) if head >= n => {
                    return Err(DiagnosisTimeError::MalformedTree(format!(
                        "token {idx} ('{}') has head {head} outside 0..{n}",
                        token.text
                    )));
                }
                Some(head) if head == idx => {
                    return Err(DiagnosisTimeError::MalformedTree(format!(
                        "token {idx} ('{}') is its own head",
                        token.text
                    )));
                }
                Some(head) => children[head].push(idx),
            }
        }

        if n > 0 && roots != 1 {
            return Err(DiagnosisTimeError::MalformedTree(format!(
                "expected exactly one root, found {roots}"
            )));
        }

        let tree = Self { tokens, children };

        // Every ancestor chain must reach the root within n steps.
        for idx in 0..n {
            if tree.ancestors(idx).take(n + 1).count() > n {
                return Err(DiagnosisTimeError::MalformedTree(format!(
                    "cycle through token {idx}"
                )));
            }
        }

        Ok(tree)
    }

    /// Build a tree from `(form, head, label)` triples where `head` is
    /// 1-based and 0 marks the root (CoNLL-U convention). Offsets are found
    /// by aligning each form left to right against `sentence`.
    pub fn from_words(
        sentence: &str,
        words: &[(&str, usize, &str)],
    ) -> Result<Self, DiagnosisTimeError> {
        let forms: Vec<&str> = words.iter().map(|(form, _, _)| *form).collect();
        let offsets = align_offsets(sentence, &forms)?;

        let tokens = words
            .iter()
            .zip(offsets)
            .map(|((form, head, label), offset)| DependencyToken {
                offset,
                text: (*form).to_string(),
                label: (*label).to_string(),
                head: head.checked_sub(1),
            })
            .collect();

        Self::new(tokens)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[DependencyToken] {
        &self.tokens
    }

    pub fn token(&self, idx: usize) -> &DependencyToken {
        &self.tokens[idx]
    }

    /// Direct dependents in sentence order.
    pub fn children(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }

    pub fn parent(&self, idx: usize) -> Option<usize> {
        self.tokens[idx].head
    }

    /// The head token, or the token itself for the root.
    pub fn parent_or_self(&self, idx: usize) -> usize {
        self.parent(idx).unwrap_or(idx)
    }

    /// Path from the token's head up to the root (token itself excluded).
    pub fn ancestors(&self, idx: usize) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            current: self.parent(idx),
        }
    }

    pub fn is_ancestor(&self, ancestor: usize, of: usize) -> bool {
        self.ancestors(of).any(|a| a == ancestor)
    }

    /// The token and all its descendants, in sentence order.
    pub fn subtree(&self, idx: usize) -> Vec<usize> {
        let mut stack = vec![idx];
        let mut out = Vec::new();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children[current].iter().rev());
        }
        out.sort_unstable();
        out
    }

    /// Tokens whose offset falls inside `span`, in sentence order.
    pub fn tokens_in(&self, span: Span) -> Vec<usize> {
        self.tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| span.contains(t.offset))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// Iterator over a token's ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a DependencyTree,
    current: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.current?;
        self.current = self.tree.parent(current);
        Some(current)
    }
}

/// Locate each form in `sentence`, scanning left to right.
pub fn align_offsets(sentence: &str, forms: &[&str]) -> Result<Vec<usize>, DiagnosisTimeError> {
    let mut cursor = 0;
    let mut offsets = Vec::with_capacity(forms.len());

    for form in forms {
        let found = sentence[cursor..].find(form).ok_or_else(|| {
            DiagnosisTimeError::MalformedTree(format!(
                "token '{form}' not found in sentence after byte {cursor}"
            ))
        })?;
        let offset = cursor + found;
        offsets.push(offset);
        cursor = offset + form.len();
    }

    Ok(offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// "She was diagnosed with anxiety ."
    fn make_tree() -> DependencyTree {
        DependencyTree::from_words(
            "She was diagnosed with anxiety.",
            &[
                ("She", 3, "nsubjpass"),
                ("was", 3, "auxpass"),
                ("diagnosed", 0, "ROOT"),
                ("with", 3, "prep"),
                ("anxiety", 4, "pobj"),
                (".", 3, "punct"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn offsets_aligned_to_sentence() {
        let tree = make_tree();
        let offsets: Vec<usize> = tree.tokens().iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8, 18, 23, 30]);
    }

    #[test]
    fn children_and_parents() {
        let tree = make_tree();
        assert_eq!(tree.children(2), &[0, 1, 3, 5]);
        assert_eq!(tree.parent(4), Some(3));
        assert_eq!(tree.parent(2), None);
        assert_eq!(tree.parent_or_self(2), 2);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = make_tree();
        let ancestors: Vec<usize> = tree.ancestors(4).collect();
        assert_eq!(ancestors, vec![3, 2]);
        assert!(tree.is_ancestor(2, 4));
        assert!(!tree.is_ancestor(4, 2));
        assert_eq!(tree.ancestors(2).count(), 0);
    }

    #[test]
    fn subtree_includes_self_in_order() {
        let tree = make_tree();
        assert_eq!(tree.subtree(3), vec![3, 4]);
        assert_eq!(tree.subtree(2), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn tokens_in_span() {
        let tree = make_tree();
        // "diagnosed with anxiety"
        assert_eq!(tree.tokens_in(Span::new(8, 30)), vec![2, 3, 4]);
        assert!(tree.tokens_in(Span::new(1, 3)).is_empty());
    }

    #[test]
    fn relation_strips_subtype() {
        let token = DependencyToken {
            offset: 0,
            text: "Monday".into(),
            label: "obl:TMOD".into(),
            head: Some(1),
        };
        assert_eq!(token.relation(), "obl");
        assert!(token.has_relation(&["obl", "advcl"]));
        assert!(!token.has_relation(&["conj"]));
    }

    #[test]
    fn rejects_two_roots() {
        let err = DependencyTree::from_words("a b", &[("a", 0, "root"), ("b", 0, "root")]);
        assert!(matches!(err, Err(DiagnosisTimeError::MalformedTree(_))));
    }

    #[test]
    fn rejects_cycle() {
        let tokens = vec![
            DependencyToken { offset: 0, text: "a".into(), label: "dep".into(), head: Some(1) },
            DependencyToken { offset: 2, text: "b".into(), label: "dep".into(), head: Some(0) },
            DependencyToken { offset: 4, text: "c".into(), label: "root".into(), head: None },
        ];
        assert!(matches!(
            DependencyTree::new(tokens),
            Err(DiagnosisTimeError::MalformedTree(_))
        ));
    }

    #[test]
    fn rejects_head_out_of_range() {
        let err = DependencyTree::from_words("a b", &[("a", 0, "root"), ("b", 7, "dep")]);
        assert!(matches!(err, Err(DiagnosisTimeError::MalformedTree(_))));
    }

    #[test]
    fn missing_form_is_an_error() {
        let err = align_offsets("I was told", &["I", "was", "diagnosed"]);
        assert!(matches!(err, Err(DiagnosisTimeError::MalformedTree(_))));
    }

    #[test]
    fn repeated_forms_align_in_order() {
        let offsets = align_offsets("I think I know", &["I", "think", "I", "know"]).unwrap();
        assert_eq!(offsets, vec![0, 2, 8, 10]);
    }
}
