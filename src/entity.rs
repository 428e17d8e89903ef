//! Typed entities: coreference clusters labeled by their covering concepts.
//!
//! For each member of a cluster, the largest concept annotation covering the
//! member's head is found. The most frequent covering kind across members
//! selects the entity kind through a fixed table; a cluster without any
//! covering annotation becomes a generic [`EntityKind::Event`].
//!
//! | Covering annotation | Entity |
//! |---------------------|--------|
//! | `DiseaseDisorder` | `Disorder` |
//! | `Procedure` | `Procedure` |
//! | `SignSymptom` | `Finding` |
//! | `Medication` | `Medication` |
//! | `AnatomicalSite` | `BodySite` |
//!
//! Any other majority kind is an upstream invariant violation and fails with
//! [`Error::UnhandledAnnotationKind`].

use crate::cluster::{Cluster, ClusterId};
use crate::error::{Error, Result};
use corefchain_core::{AnnotationKind, Document, Mention, MentionId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic kind of a typed entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Disease or disorder
    Disorder,
    /// Procedure
    Procedure,
    /// Sign or symptom finding
    Finding,
    /// Medication
    Medication,
    /// Anatomical body site
    BodySite,
    /// Generic event (no covering concept)
    Event,
}

const ENTITY_KINDS: [(AnnotationKind, EntityKind); 5] = [
    (AnnotationKind::DiseaseDisorder, EntityKind::Disorder),
    (AnnotationKind::Procedure, EntityKind::Procedure),
    (AnnotationKind::SignSymptom, EntityKind::Finding),
    (AnnotationKind::Medication, EntityKind::Medication),
    (AnnotationKind::AnatomicalSite, EntityKind::BodySite),
];

impl EntityKind {
    /// Entity kind for a covering annotation kind, if it has one.
    #[must_use]
    pub fn for_annotation(kind: AnnotationKind) -> Option<Self> {
        ENTITY_KINDS
            .iter()
            .find(|(annotation, _)| *annotation == kind)
            .map(|(_, entity)| *entity)
    }
}

/// A surviving cluster with its inferred kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedEntity {
    /// Entity kind
    pub kind: EntityKind,
    /// Source cluster
    pub cluster: ClusterId,
    /// Member mentions in chain order
    pub mentions: Vec<Mention>,
}

/// Largest covering annotation kind per mention.
#[derive(Debug, Clone, Default)]
pub struct CoveringIndex {
    kinds: HashMap<MentionId, AnnotationKind>,
}

impl CoveringIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every mention of `document`.
    pub fn add_document(&mut self, document: &Document) {
        for mention in document.mentions() {
            if let Some(kind) = largest_covering(document, mention) {
                self.kinds.insert(mention.id, kind);
            }
        }
    }

    /// Covering kind of a mention.
    #[must_use]
    pub fn kind_of(&self, mention: MentionId) -> Option<AnnotationKind> {
        self.kinds.get(&mention).copied()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.kinds.clear();
    }
}

/// Kind of the largest annotation covering the mention's head. Ties go to the
/// first annotation in document order.
#[must_use]
pub fn largest_covering(document: &Document, mention: &Mention) -> Option<AnnotationKind> {
    let (begin, end) = mention.head_span();
    let mut largest: Option<(usize, AnnotationKind)> = None;
    for annotation in document.annotations() {
        if !annotation.covers(begin, end) {
            continue;
        }
        if largest.map_or(true, |(len, _)| annotation.len() > len) {
            largest = Some((annotation.len(), annotation.kind));
        }
    }
    largest.map(|(_, kind)| kind)
}

/// Type one cluster by majority vote of its members' covering kinds.
///
/// Equal counts go to the kind seen first in chain order.
pub fn aggregate(cluster: &Cluster, covering: &CoveringIndex) -> Result<TypedEntity> {
    let mut counts: IndexMap<AnnotationKind, usize> = IndexMap::new();
    for member in cluster.members() {
        if let Some(kind) = covering.kind_of(member.id) {
            *counts.entry(kind).or_insert(0) += 1;
        }
    }

    let mut majority: Option<(AnnotationKind, usize)> = None;
    for (&kind, &count) in &counts {
        if majority.map_or(true, |(_, best)| count > best) {
            majority = Some((kind, count));
        }
    }

    let kind = match majority {
        None => EntityKind::Event,
        Some((kind, _)) => {
            EntityKind::for_annotation(kind).ok_or(Error::UnhandledAnnotationKind {
                kind,
                cluster: cluster.id(),
            })?
        }
    };

    Ok(TypedEntity {
        kind,
        cluster: cluster.id(),
        mentions: cluster.members().to_vec(),
    })
}
