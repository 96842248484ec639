//! Dependency parser backed by pre-computed CoNLL-U parses.
//!
//! Sentences are parsed offline by any Universal Dependencies parser and
//! stored as CoNLL-U. At run time a sentence is looked up by its text
//! (`# text = ...` comment, or the forms joined with `SpaceAfter` honoured)
//! and token offsets are aligned against the exact sentence string.

use std::collections::HashMap;
use std::path::Path;

use super::dependency::{align_offsets, DependencyToken, DependencyTree};
use crate::pipeline::diagnosis_time::{DependencyParser, DiagnosisTimeError};

/// A token row before offsets are known.
struct RawToken {
    form: String,
    head: usize,
    label: String,
    space_after: bool,
}

/// One `# text` block plus its token rows.
#[derive(Default)]
struct RawSentence {
    text: Option<String>,
    tokens: Vec<RawToken>,
    first_line: usize,
}

/// In-memory store of parsed sentences keyed by their text.
#[derive(Debug, Clone, Default)]
pub struct ConlluParser {
    trees: HashMap<String, DependencyTree>,
}

impl ConlluParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every sentence of a CoNLL-U file.
    pub fn from_path(path: &Path) -> Result<Self, DiagnosisTimeError> {
        let content = std::fs::read_to_string(path)?;
        let parser = Self::parse_str(&content)?;
        tracing::info!(
            path = %path.display(),
            sentences = parser.len(),
            "Loaded CoNLL-U parses"
        );
        Ok(parser)
    }

    /// Parse CoNLL-U content.
    pub fn parse_str(content: &str) -> Result<Self, DiagnosisTimeError> {
        let mut parser = Self::new();
        for raw in split_sentences(content)? {
            let (text, tree) = build_tree(raw)?;
            parser.trees.insert(text, tree);
        }
        Ok(parser)
    }

    /// Register a tree for a sentence (offsets must index into `sentence`).
    pub fn insert(&mut self, sentence: &str, tree: DependencyTree) {
        self.trees.insert(sentence.trim().to_string(), tree);
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl DependencyParser for ConlluParser {
    fn parse(&self, sentence: &str) -> Result<DependencyTree, DiagnosisTimeError> {
        let trimmed = sentence.trim_start();
        let shift = sentence.len() - trimmed.len();
        let key = trimmed.trim_end();

        let tree = self.trees.get(key).ok_or_else(|| {
            DiagnosisTimeError::ParseUnavailable(format!("no stored parse for sentence '{key}'"))
        })?;

        if shift == 0 {
            return Ok(tree.clone());
        }

        let tokens = tree
            .tokens()
            .iter()
            .cloned()
            .map(|mut t| {
                t.offset += shift;
                t
            })
            .collect();
        DependencyTree::new(tokens)
    }
}

fn split_sentences(content: &str) -> Result<Vec<RawSentence>, DiagnosisTimeError> {
    let mut sentences = Vec::new();
    let mut current = RawSentence::default();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.tokens.is_empty() {
                sentences.push(std::mem::take(&mut current));
            }
            current.text = None;
            continue;
        }

        if current.tokens.is_empty() && current.text.is_none() {
            current.first_line = line_no;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if let Some(text) = comment.trim_start().strip_prefix("text =") {
                current.text = Some(text.trim().to_string());
            }
            continue;
        }

        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() != 10 {
            return Err(DiagnosisTimeError::Conllu {
                line: line_no,
                message: format!("expected 10 tab-separated columns, found {}", cols.len()),
            });
        }

        // Multiword ranges ("3-4") and empty nodes ("5.1") carry no tree edge.
        if cols[0].contains('-') || cols[0].contains('.') {
            continue;
        }

        let head: usize = cols[6].parse().map_err(|_| DiagnosisTimeError::Conllu {
            line: line_no,
            message: format!("invalid HEAD '{}'", cols[6]),
        })?;

        current.tokens.push(RawToken {
            form: cols[1].to_string(),
            head,
            label: cols[7].to_string(),
            space_after: !cols[9].split('|').any(|m| m == "SpaceAfter=No"),
        });
    }

    if !current.tokens.is_empty() {
        sentences.push(current);
    }

    Ok(sentences)
}

fn build_tree(raw: RawSentence) -> Result<(String, DependencyTree), DiagnosisTimeError> {
    let text = match raw.text {
        Some(text) => text,
        None => rebuild_text(&raw.tokens),
    };

    let forms: Vec<&str> = raw.tokens.iter().map(|t| t.form.as_str()).collect();
    let offsets = align_offsets(&text, &forms).map_err(|e| DiagnosisTimeError::Conllu {
        line: raw.first_line,
        message: e.to_string(),
    })?;

    let tokens = raw
        .tokens
        .into_iter()
        .zip(offsets)
        .map(|(t, offset)| DependencyToken {
            offset,
            text: t.form,
            label: t.label,
            head: t.head.checked_sub(1),
        })
        .collect();

    let tree = DependencyTree::new(tokens).map_err(|e| DiagnosisTimeError::Conllu {
        line: raw.first_line,
        message: e.to_string(),
    })?;

    Ok((text, tree))
}

fn rebuild_text(tokens: &[RawToken]) -> String {
    let mut text = String::new();
    for (i, token) in tokens.iter().enumerate() {
        text.push_str(&token.form);
        if token.space_after && i + 1 < tokens.len() {
            text.push(' ');
        }
    }
    text
}
