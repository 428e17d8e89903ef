//! The built-in candidate strategies.

use super::{CandidatePair, PairingContext, PairingStrategy};
use crate::cluster::Cluster;
use corefchain_core::Mention;

/// Active clusters of the current document, most recent first, paired with
/// their latest member in this document.
fn active_clusters<'a>(
    ctx: &'a PairingContext<'a>,
) -> impl Iterator<Item = (&'a Cluster, &'a Mention)> + 'a {
    let doc = ctx.session.document();
    ctx.session.recent_first().filter_map(move |id| {
        let cluster = ctx.store.get(id)?;
        Some((cluster, cluster.last_in_document(doc)?))
    })
}

// =============================================================================
// SentenceDistance
// =============================================================================

/// Proposes the cluster holding the most recent prior mention of the
/// document, if that mention lies within `max_distance` sentences.
#[derive(Debug, Clone, Copy)]
pub struct SentenceDistancePairer {
    max_distance: usize,
}

impl SentenceDistancePairer {
    /// Create with a sentence window.
    #[must_use]
    pub fn new(max_distance: usize) -> Self {
        Self { max_distance }
    }
}

impl PairingStrategy for SentenceDistancePairer {
    fn name(&self) -> &'static str {
        "sentence_distance"
    }

    fn pairs(&self, ctx: &PairingContext<'_>, mention: &Mention) -> Vec<CandidatePair> {
        active_clusters(ctx)
            .take(1)
            .filter(|(_, latest)| mention.sentence.abs_diff(latest.sentence) <= self.max_distance)
            .map(|(cluster, _)| CandidatePair::new(cluster.id(), mention.id, self.name()))
            .collect()
    }
}

// =============================================================================
// SectionHeader
// =============================================================================

/// Proposes active clusters whose latest member shares the mention's section,
/// at any distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionHeaderPairer;

impl PairingStrategy for SectionHeaderPairer {
    fn name(&self) -> &'static str {
        "section_header"
    }

    fn pairs(&self, ctx: &PairingContext<'_>, mention: &Mention) -> Vec<CandidatePair> {
        let Some(section) = mention.section else {
            return Vec::new();
        };
        active_clusters(ctx)
            .filter(|(_, latest)| latest.section == Some(section))
            .map(|(cluster, _)| CandidatePair::new(cluster.id(), mention.id, self.name()))
            .collect()
    }
}

// =============================================================================
// ClusterCap
// =============================================================================

/// Proposes up to `cap` most recently active clusters unconditionally.
/// `None` searches every active cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterCapPairer {
    cap: Option<usize>,
}

impl ClusterCapPairer {
    /// Create with an optional cap.
    #[must_use]
    pub fn new(cap: Option<usize>) -> Self {
        Self { cap }
    }
}

impl PairingStrategy for ClusterCapPairer {
    fn name(&self) -> &'static str {
        "cluster_cap"
    }

    fn pairs(&self, ctx: &PairingContext<'_>, mention: &Mention) -> Vec<CandidatePair> {
        let cap = self.cap.unwrap_or(usize::MAX);
        active_clusters(ctx)
            .take(cap)
            .map(|(cluster, _)| CandidatePair::new(cluster.id(), mention.id, self.name()))
            .collect()
    }
}

// =============================================================================
// Headword
// =============================================================================

/// Proposes active clusters whose representative (first member) has the same
/// head word as the mention, ignoring ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadwordPairer;

impl PairingStrategy for HeadwordPairer {
    fn name(&self) -> &'static str {
        "headword"
    }

    fn pairs(&self, ctx: &PairingContext<'_>, mention: &Mention) -> Vec<CandidatePair> {
        let Some(head) = mention.head_text() else {
            return Vec::new();
        };
        active_clusters(ctx)
            .filter(|(cluster, _)| {
                cluster
                    .first()
                    .head_text()
                    .is_some_and(|h| h.eq_ignore_ascii_case(head))
            })
            .map(|(cluster, _)| CandidatePair::new(cluster.id(), mention.id, self.name()))
            .collect()
    }
}

// =============================================================================
// PreviousDocument
// =============================================================================

/// Proposes clusters carried over from earlier documents of the patient.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviousDocumentPairer;

impl PairingStrategy for PreviousDocumentPairer {
    fn name(&self) -> &'static str {
        "previous_document"
    }

    fn pairs(&self, ctx: &PairingContext<'_>, mention: &Mention) -> Vec<CandidatePair> {
        ctx.history
            .recent_first()
            .filter_map(|id| ctx.store.get(id))
            .filter(|cluster| cluster.first().id.doc < mention.id.doc)
            .map(|cluster| CandidatePair::new(cluster.id(), mention.id, self.name()))
            .collect()
    }
}
