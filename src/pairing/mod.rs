//! Candidate pair generation.
//!
//! For each mention, a fixed list of [`PairingStrategy`]s proposes clusters
//! the mention might continue. Proposals are unioned in registration order
//! and de-duplicated by `(cluster, mention)`; the first strategy to propose a
//! cluster is recorded as its source. Registration order is also the greedy
//! tie-break order used by the resolver.
//!
//! # State
//!
//! Strategies hold no hidden state. They read two explicit contexts:
//!
//! | Context | Scope | Reset |
//! |---------|-------|-------|
//! | [`DocumentSession`] | clusters active in the current document, by recency | every document boundary ([`CandidateGenerator::reset`]) |
//! | [`PatientHistory`] | clusters that survived earlier documents | patient boundary ([`CandidateGenerator::begin_patient`]) |
//!
//! # Example
//!
//! ```rust
//! use corefchain::cluster::ClusterStore;
//! use corefchain::pairing::CandidateGenerator;
//! use corefchain::config::ResolverConfig;
//! use corefchain_core::{Document, Mention};
//!
//! let doc = Document::new("n", "the tumor ... it").with_mentions(vec![
//!     Mention::new("the tumor", 0, 9).in_sentence(1),
//!     Mention::new("it", 14, 16).in_sentence(3),
//! ]);
//! let [tumor, it] = doc.mentions() else { unreachable!() };
//!
//! let mut store = ClusterStore::new();
//! let mut generator = CandidateGenerator::standard(&ResolverConfig::default());
//! generator.reset(0);
//!
//! let c = store.create_singleton(tumor, "Identity").unwrap();
//! generator.record(c);
//!
//! let pairs = generator.get_pairs(&store, it);
//! assert_eq!(pairs.len(), 1);
//! assert_eq!(pairs[0].cluster, c);
//! assert_eq!(pairs[0].source, "sentence_distance");
//! ```

mod strategies;

pub use strategies::{
    ClusterCapPairer, HeadwordPairer, PreviousDocumentPairer, SectionHeaderPairer,
    SentenceDistancePairer,
};

use crate::cluster::{ClusterId, ClusterStore};
use crate::config::ResolverConfig;
use corefchain_core::{Mention, MentionId};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

// =============================================================================
// Types
// =============================================================================

/// A proposal that `mention` may continue `cluster`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidatePair {
    /// Proposed cluster
    pub cluster: ClusterId,
    /// Mention being resolved
    pub mention: MentionId,
    /// Name of the strategy that first proposed the pair
    pub source: &'static str,
}

impl CandidatePair {
    /// Create a candidate pair.
    #[must_use]
    pub fn new(cluster: ClusterId, mention: MentionId, source: &'static str) -> Self {
        Self {
            cluster,
            mention,
            source,
        }
    }
}

/// Clusters active in the current document, ordered by last activity.
#[derive(Debug, Clone, Default)]
pub struct DocumentSession {
    doc: usize,
    recent: IndexSet<ClusterId>,
}

impl DocumentSession {
    /// Start a session for document `doc`.
    #[must_use]
    pub fn new(doc: usize) -> Self {
        Self {
            doc,
            recent: IndexSet::new(),
        }
    }

    /// Timeline position of the current document.
    #[must_use]
    pub fn document(&self) -> usize {
        self.doc
    }

    /// Mark `cluster` as the most recently active.
    pub fn touch(&mut self, cluster: ClusterId) {
        self.recent.shift_remove(&cluster);
        self.recent.insert(cluster);
    }

    /// Active clusters, most recent first.
    pub fn recent_first(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.recent.iter().rev().copied()
    }

    /// Active clusters in first-activity order.
    pub fn active(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.recent.iter().copied()
    }

    /// Number of active clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recent.len()
    }

    /// Check if no cluster is active yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recent.is_empty()
    }
}

/// Clusters carried over from earlier documents of the same patient.
#[derive(Debug, Clone, Default)]
pub struct PatientHistory {
    prior: IndexSet<ClusterId>,
}

impl PatientHistory {
    /// Clusters from earlier documents, most recently closed first.
    pub fn recent_first(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.prior.iter().rev().copied()
    }

    /// Number of carried clusters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prior.len()
    }

    /// Check if nothing was carried over.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prior.is_empty()
    }

    fn carry(&mut self, cluster: ClusterId) {
        self.prior.shift_remove(&cluster);
        self.prior.insert(cluster);
    }
}

/// Read-only view handed to each strategy call.
#[derive(Debug, Clone, Copy)]
pub struct PairingContext<'a> {
    /// All clusters of the current patient run
    pub store: &'a ClusterStore,
    /// Document-scoped recency index
    pub session: &'a DocumentSession,
    /// Patient-scoped carried clusters
    pub history: &'a PatientHistory,
}

/// A candidate-generation heuristic.
pub trait PairingStrategy: Send + Sync {
    /// Strategy name, recorded as the source of its pairs.
    fn name(&self) -> &'static str;

    /// Propose clusters for `mention`, most preferred first.
    fn pairs(&self, ctx: &PairingContext<'_>, mention: &Mention) -> Vec<CandidatePair>;

    /// Clear any strategy-local state at a document boundary.
    fn reset(&mut self) {}
}

// =============================================================================
// Generator
// =============================================================================

/// Ordered union of candidate strategies plus their document and patient
/// contexts.
pub struct CandidateGenerator {
    strategies: Vec<Box<dyn PairingStrategy>>,
    session: DocumentSession,
    history: PatientHistory,
}

impl std::fmt::Debug for CandidateGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateGenerator")
            .field("strategies", &self.strategy_names())
            .field("session", &self.session)
            .field("history", &self.history)
            .finish()
    }
}

impl CandidateGenerator {
    /// Generator with no strategies.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
            session: DocumentSession::default(),
            history: PatientHistory::default(),
        }
    }

    /// The standard strategy list: sentence distance, section header, cluster
    /// cap, headword, previous document.
    #[must_use]
    pub fn standard(config: &ResolverConfig) -> Self {
        Self::empty()
            .with_strategy(SentenceDistancePairer::new(config.sentence_distance))
            .with_strategy(SectionHeaderPairer)
            .with_strategy(ClusterCapPairer::new(config.cluster_cap))
            .with_strategy(HeadwordPairer)
            .with_strategy(PreviousDocumentPairer)
    }

    /// Register a strategy after the existing ones.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl PairingStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Names of the registered strategies, in order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Clear patient-scoped state. Call once per patient.
    pub fn begin_patient(&mut self) {
        self.history = PatientHistory::default();
        self.reset(0);
    }

    /// Document boundary: clear document-scoped state. Patient history is
    /// kept.
    pub fn reset(&mut self, doc: usize) {
        self.session = DocumentSession::new(doc);
        for strategy in &mut self.strategies {
            strategy.reset();
        }
    }

    /// Record that `cluster` just gained a member in the current document.
    pub fn record(&mut self, cluster: ClusterId) {
        self.session.touch(cluster);
    }

    /// Document end: carry the clusters of this document that still exist
    /// into the patient history.
    pub fn close_document(&mut self, store: &ClusterStore) {
        if self.session.is_empty() {
            return;
        }
        log::debug!(
            "Closing document {} with {} active clusters",
            self.session.document(),
            self.session.len()
        );
        for cluster in self.session.active() {
            if store.get(cluster).is_some() {
                self.history.carry(cluster);
            }
        }
    }

    /// Current document session.
    #[must_use]
    pub fn session(&self) -> &DocumentSession {
        &self.session
    }

    /// Current patient history.
    #[must_use]
    pub fn history(&self) -> &PatientHistory {
        &self.history
    }

    /// Union of all strategies' pairs for `mention`, in registration order,
    /// de-duplicated by cluster.
    #[must_use]
    pub fn get_pairs(&self, store: &ClusterStore, mention: &Mention) -> Vec<CandidatePair> {
        let ctx = PairingContext {
            store,
            session: &self.session,
            history: &self.history,
        };
        let mut union: IndexMap<ClusterId, CandidatePair> = IndexMap::new();
        for strategy in &self.strategies {
            for pair in strategy.pairs(&ctx, mention) {
                union.entry(pair.cluster).or_insert(pair);
            }
        }
        union.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Vec<u64>);

    impl PairingStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn pairs(&self, _ctx: &PairingContext<'_>, mention: &Mention) -> Vec<CandidatePair> {
            self.1
                .iter()
                .map(|&c| CandidatePair::new(ClusterId(c), mention.id, self.0))
                .collect()
        }
    }

    #[test]
    fn union_keeps_first_source_and_order() {
        let generator = CandidateGenerator::empty()
            .with_strategy(Fixed("a", vec![3, 1]))
            .with_strategy(Fixed("b", vec![1, 2, 3]));
        let store = ClusterStore::new();
        let pairs = generator.get_pairs(&store, &Mention::new("x", 0, 1));

        let got: Vec<_> = pairs.iter().map(|p| (p.cluster.0, p.source)).collect();
        assert_eq!(got, vec![(3, "a"), (1, "a"), (2, "b")]);
    }

    #[test]
    fn session_recency_moves_to_front() {
        let mut session = DocumentSession::new(0);
        session.touch(ClusterId(1));
        session.touch(ClusterId(2));
        session.touch(ClusterId(1));
        let order: Vec<_> = session.recent_first().map(|c| c.0).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn reset_keeps_patient_history() {
        let mut store = ClusterStore::new();
        let mut m0 = Mention::new("a", 0, 1);
        m0.id = MentionId::new(0, 0);
        let mut m1 = Mention::new("b", 2, 3);
        m1.id = MentionId::new(0, 1);
        let c = store.create_singleton(&m0, "Identity").unwrap();
        store.link(c, &m1).unwrap();

        let mut generator = CandidateGenerator::standard(&ResolverConfig::default());
        generator.begin_patient();
        generator.record(c);
        generator.close_document(&store);
        generator.reset(1);

        assert!(generator.session().is_empty());
        assert_eq!(generator.session().document(), 1);
        assert_eq!(generator.history().len(), 1);

        generator.begin_patient();
        assert!(generator.history().is_empty());
    }

    #[test]
    fn closing_untouched_document_carries_nothing() {
        let store = ClusterStore::new();
        let mut generator = CandidateGenerator::standard(&ResolverConfig::default());
        generator.begin_patient();
        generator.reset(0);
        generator.close_document(&store);

        assert_eq!(generator.session().len(), 0);
        assert!(generator.history().is_empty());
    }

    #[test]
    fn standard_registration_order() {
        let generator = CandidateGenerator::standard(&ResolverConfig::default());
        assert_eq!(
            generator.strategy_names(),
            vec![
                "sentence_distance",
                "section_header",
                "cluster_cap",
                "headword",
                "previous_document"
            ]
        );
    }
}
