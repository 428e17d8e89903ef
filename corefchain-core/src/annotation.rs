//! Concept annotations produced by dictionary lookup.
//!
//! These are the "covering annotations" consulted when a coreference cluster
//! is turned into a typed entity: each annotation has a kind and a span, and
//! an annotation covers a mention when its span contains the mention's head.

use serde::{Deserialize, Serialize};

/// Kind of a concept annotation.
///
/// Only the first five kinds map onto a typed entity; the rest exist in the
/// upstream type system but never legitimately cover a clustered mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnnotationKind {
    /// Disease or disorder mention
    DiseaseDisorder,
    /// Procedure mention
    Procedure,
    /// Sign or symptom mention
    SignSymptom,
    /// Medication mention
    Medication,
    /// Anatomical site mention
    AnatomicalSite,
    /// Lab result mention
    Lab,
    /// Temporal expression
    Time,
    /// Generic event mention
    Event,
    /// Generic entity mention
    Entity,
}

impl AnnotationKind {
    /// Stable label for logging and error messages.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::DiseaseDisorder => "DiseaseDisorderMention",
            Self::Procedure => "ProcedureMention",
            Self::SignSymptom => "SignSymptomMention",
            Self::Medication => "MedicationMention",
            Self::AnatomicalSite => "AnatomicalSiteMention",
            Self::Lab => "LabMention",
            Self::Time => "TimeMention",
            Self::Event => "EventMention",
            Self::Entity => "EntityMention",
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// A typed span from the dictionary lookup layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConceptAnnotation {
    /// Annotation kind
    pub kind: AnnotationKind,
    /// Start byte offset (inclusive)
    pub begin: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl ConceptAnnotation {
    /// Create an annotation.
    #[must_use]
    pub fn new(kind: AnnotationKind, begin: usize, end: usize) -> Self {
        Self { kind, begin, end }
    }

    /// Span length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    /// Check if the span is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this annotation contains the span `[begin, end)`.
    #[must_use]
    pub fn covers(&self, begin: usize, end: usize) -> bool {
        self.begin <= begin && end <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_is_inclusive_of_edges() {
        let a = ConceptAnnotation::new(AnnotationKind::DiseaseDisorder, 4, 9);
        assert!(a.covers(4, 9));
        assert!(a.covers(5, 8));
        assert!(!a.covers(3, 9));
        assert!(!a.covers(4, 10));
    }
}
