//! Mentions: immutable text spans that may corefer.
//!
//! # Terminology
//!
//! - **Mention**: a bounded span identified as a candidate entity/event
//!   occurrence ("the tumor", "it", "the mass")
//! - **Head word**: the syntactic head of the mention ("tumor" in
//!   "the large tumor")
//! - **Discovery order**: the order in which mentions are encountered across a
//!   patient timeline, `(document, index)`
//!
//! # Example
//!
//! ```rust
//! use corefchain_core::{Mention, MentionId};
//!
//! let tumor = Mention::new("the tumor", 0, 9).with_head("tumor", 4, 9);
//! let it = Mention::new("it", 30, 32).in_sentence(2);
//!
//! assert_eq!(tumor.head_text(), Some("tumor"));
//! assert!(!tumor.overlaps(&it));
//! assert!(MentionId::new(0, 0) < MentionId::new(0, 1));
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// MentionId
// =============================================================================

/// Identity of a mention inside a patient timeline.
///
/// Ordering is discovery order: all mentions of document `k` sort before
/// those of document `k + 1`, and within a document by `index`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct MentionId {
    /// Position of the owning document in the patient timeline
    pub doc: usize,
    /// Discovery index within the document
    pub index: usize,
}

impl MentionId {
    /// Create a mention id.
    #[must_use]
    pub const fn new(doc: usize, index: usize) -> Self {
        Self { doc, index }
    }
}

impl std::fmt::Display for MentionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}:m{}", self.doc, self.index)
    }
}

// =============================================================================
// HeadWord
// =============================================================================

/// Syntactic head of a mention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeadWord {
    /// Head word surface form
    pub text: String,
    /// Start byte offset (inclusive)
    pub begin: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

// =============================================================================
// Mention
// =============================================================================

/// A single mention discovered in a document.
///
/// Identity (`id`) is assigned by [`crate::Document::with_mentions`]; two
/// mentions are the same mention iff their ids are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    /// Identity within the patient timeline
    pub id: MentionId,
    /// Start byte offset (inclusive)
    pub begin: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Covered text
    pub text: String,
    /// Sentence index within the document
    pub sentence: usize,
    /// Index of the covering section, if any
    pub section: Option<usize>,
    /// Syntactic head, if the parser found one
    pub head: Option<HeadWord>,
}

impl Mention {
    /// Create a mention with text and span.
    #[must_use]
    pub fn new(text: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            id: MentionId::default(),
            begin,
            end,
            text: text.into(),
            sentence: 0,
            section: None,
            head: None,
        }
    }

    /// Set the head word.
    #[must_use]
    pub fn with_head(mut self, text: impl Into<String>, begin: usize, end: usize) -> Self {
        self.head = Some(HeadWord {
            text: text.into(),
            begin,
            end,
        });
        self
    }

    /// Set the sentence index.
    #[must_use]
    pub fn in_sentence(mut self, sentence: usize) -> Self {
        self.sentence = sentence;
        self
    }

    /// Set the covering section.
    #[must_use]
    pub fn in_section(mut self, section: usize) -> Self {
        self.section = Some(section);
        self
    }

    /// Head word text, if known.
    #[must_use]
    pub fn head_text(&self) -> Option<&str> {
        self.head.as_ref().map(|h| h.text.as_str())
    }

    /// Span used to find covering annotations: the head if known, else the
    /// whole mention.
    #[must_use]
    pub fn head_span(&self) -> (usize, usize) {
        match &self.head {
            Some(h) => (h.begin, h.end),
            None => (self.begin, self.end),
        }
    }

    /// Check if this mention overlaps with another.
    #[must_use]
    pub fn overlaps(&self, other: &Mention) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Span length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// Check if the span is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Mention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" [{}-{}) {}", self.text, self.begin, self.end, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_span_falls_back_to_mention() {
        let m = Mention::new("it", 10, 12);
        assert_eq!(m.head_span(), (10, 12));

        let m = Mention::new("the mass", 20, 28).with_head("mass", 24, 28);
        assert_eq!(m.head_span(), (24, 28));
    }

    #[test]
    fn ids_order_by_document_first() {
        let mut ids = vec![
            MentionId::new(1, 0),
            MentionId::new(0, 5),
            MentionId::new(0, 1),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![MentionId::new(0, 1), MentionId::new(0, 5), MentionId::new(1, 0)]
        );
    }

    #[test]
    fn overlap_is_half_open() {
        let a = Mention::new("abc", 0, 3);
        let b = Mention::new("def", 3, 6);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&Mention::new("bc", 1, 3)));
    }
}
