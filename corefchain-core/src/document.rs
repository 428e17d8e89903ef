//! Documents, sections and patient timelines.
//!
//! A [`Document`] owns its mentions (in discovery order), its sections and the
//! concept annotations found by dictionary lookup. A [`Patient`] is an ordered
//! timeline of documents; position in the timeline is the `doc` half of every
//! [`MentionId`].
//!
//! # Example
//!
//! ```rust
//! use corefchain_core::{Document, Mention, Patient, DocumentSource, Section};
//!
//! let note = Document::new("note-1", "HISTORY: the tumor grew. It was resected.")
//!     .with_sections(vec![Section::new("HISTORY", 0, 41)])
//!     .with_mentions(vec![
//!         Mention::new("It", 25, 27).in_sentence(1),
//!         Mention::new("the tumor", 9, 18),
//!     ]);
//!
//! // Mentions are re-ordered by span and indexed in discovery order.
//! assert_eq!(note.mentions()[0].text, "the tumor");
//! assert_eq!(note.mentions()[1].id.index, 1);
//! assert_eq!(note.mentions()[1].section, Some(0));
//!
//! let patient = Patient::new("p1", vec![note]);
//! assert_eq!(patient.document_count().unwrap(), 1);
//! ```

use crate::annotation::ConceptAnnotation;
use crate::error::{Error, Result};
use crate::mention::{Mention, MentionId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Section
// =============================================================================

/// A section (segment) of a clinical note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section header or identifier ("HISTORY", "ASSESSMENT", ...)
    pub name: String,
    /// Start byte offset (inclusive)
    pub begin: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Section {
    /// Create a section.
    #[must_use]
    pub fn new(name: impl Into<String>, begin: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            begin,
            end,
        }
    }

    fn contains(&self, mention: &Mention) -> bool {
        self.begin <= mention.begin && mention.end <= self.end
    }
}

// =============================================================================
// Document
// =============================================================================

/// A single document with its mentions, sections and concept annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier
    pub id: String,
    /// Full document text
    pub text: String,
    /// Position in the patient timeline
    position: usize,
    sections: Vec<Section>,
    mentions: Vec<Mention>,
    annotations: Vec<ConceptAnnotation>,
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            position: 0,
            sections: Vec::new(),
            mentions: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Set the sections. Sections are kept sorted by start offset.
    #[must_use]
    pub fn with_sections(mut self, mut sections: Vec<Section>) -> Self {
        sections.sort_by_key(|s| (s.begin, s.end));
        self.sections = sections;
        self.assign_sections();
        self
    }

    /// Set the mentions.
    ///
    /// Mentions are sorted by span and re-indexed so that `id.index` is the
    /// discovery order. Mentions without an explicit section get the section
    /// that contains them, if any.
    #[must_use]
    pub fn with_mentions(mut self, mut mentions: Vec<Mention>) -> Self {
        mentions.sort_by_key(|m| (m.begin, m.end));
        for (index, mention) in mentions.iter_mut().enumerate() {
            mention.id = MentionId::new(self.position, index);
        }
        self.mentions = mentions;
        self.assign_sections();
        self
    }

    /// Place the document at `position` in a patient timeline.
    ///
    /// Mention ids are re-stamped with the new position.
    #[must_use]
    pub fn at_position(mut self, position: usize) -> Self {
        self.position = position;
        for mention in &mut self.mentions {
            mention.id.doc = position;
        }
        self
    }

    /// Set the concept annotations.
    #[must_use]
    pub fn with_annotations(mut self, annotations: Vec<ConceptAnnotation>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Position in the patient timeline.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Mentions in discovery order.
    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    /// Look up a mention by discovery index.
    #[must_use]
    pub fn mention(&self, index: usize) -> Option<&Mention> {
        self.mentions.get(index)
    }

    /// Sections sorted by start offset.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Concept annotations.
    #[must_use]
    pub fn annotations(&self) -> &[ConceptAnnotation] {
        &self.annotations
    }

    /// Mentions grouped by section, each group in discovery order.
    ///
    /// Consecutive mentions sharing a section form one group; mentions outside
    /// every section form their own groups at their discovery position, so
    /// concatenating the groups yields the discovery order.
    #[must_use]
    pub fn mentions_by_section(&self) -> Vec<&[Mention]> {
        let mut groups = Vec::new();
        let mut start = 0;
        for i in 1..=self.mentions.len() {
            if i == self.mentions.len() || self.mentions[i].section != self.mentions[start].section
            {
                groups.push(&self.mentions[start..i]);
                start = i;
            }
        }
        groups
    }

    /// Check that every mention and annotation span lies inside the text and
    /// every head word lies inside its mention.
    pub fn validate(&self) -> Result<()> {
        let len = self.text.len();
        let spans = self
            .mentions
            .iter()
            .map(|m| (m.begin, m.end))
            .chain(self.annotations.iter().map(|a| (a.begin, a.end)));
        for (begin, end) in spans {
            if begin > end || end > len {
                return Err(Error::SpanOutOfBounds { begin, end, len });
            }
        }
        for mention in &self.mentions {
            let Some(head) = &mention.head else {
                continue;
            };
            if head.begin < mention.begin || head.end > mention.end || head.begin > head.end {
                return Err(Error::invalid_input(format!(
                    "head [{}, {}) of mention {} lies outside [{}, {})",
                    head.begin, head.end, mention.id, mention.begin, mention.end
                )));
            }
        }
        Ok(())
    }

    fn assign_sections(&mut self) {
        for mention in &mut self.mentions {
            if mention.section.is_none() {
                mention.section = self.sections.iter().position(|s| s.contains(mention));
            }
        }
    }
}

// =============================================================================
// Patient
// =============================================================================

/// Lookup of the documents in one patient timeline.
///
/// Patient-level processing first resolves the document count, then each
/// document by index; either lookup may fail.
pub trait DocumentSource {
    /// Number of documents in the timeline.
    fn document_count(&self) -> Result<usize>;

    /// Document at `index` in timeline order.
    fn document(&self, index: usize) -> Result<&Document>;
}

/// A patient: an ordered timeline of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// Patient identifier
    pub id: String,
    documents: Vec<Document>,
}

impl Patient {
    /// Create a patient timeline. Documents keep the given order.
    #[must_use]
    pub fn new(id: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            id: id.into(),
            documents: documents
                .into_iter()
                .enumerate()
                .map(|(position, doc)| doc.at_position(position))
                .collect(),
        }
    }

    /// Documents in timeline order.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Look up a mention anywhere in the timeline.
    #[must_use]
    pub fn mention(&self, id: MentionId) -> Option<&Mention> {
        self.documents.get(id.doc)?.mention(id.index)
    }
}

impl From<Document> for Patient {
    fn from(doc: Document) -> Self {
        let id = doc.id.clone();
        Patient::new(id, vec![doc])
    }
}

impl DocumentSource for Patient {
    fn document_count(&self) -> Result<usize> {
        Ok(self.documents.len())
    }

    fn document(&self, index: usize) -> Result<&Document> {
        self.documents.get(index).ok_or_else(|| {
            Error::document_lookup(format!(
                "patient '{}' has no document at position {} ({} documents)",
                self.id,
                index,
                self.documents.len()
            ))
        })
    }
}
