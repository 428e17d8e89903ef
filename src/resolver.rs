//! Incremental mention-cluster coreference resolution.
//!
//! Mentions are visited one at a time, section by section, in discovery
//! order. For each mention the [`CandidateGenerator`] proposes clusters it
//! might continue; every proposal is featurized and either written out as a
//! training example or scored by a [`Classifier`]. A mention that links to
//! nothing starts a singleton cluster. Singletons left at the end of a
//! document are dropped.
//!
//! # Decode policies
//!
//! | Policy | Winner |
//! |--------|--------|
//! | [`DecodePolicy::GreedyFirst`] | first positive candidate in strategy order |
//! | [`DecodePolicy::BestFirst`] | strictly highest score for the predicted label; first of equal maxima |
//!
//! # Scopes
//!
//! With [`Scope::SingleDocument`] each document starts from an empty store.
//! With [`Scope::Patient`] the store and the patient history persist across
//! the patient's documents, which must arrive in timeline order; a mention
//! may continue a cluster started in an earlier document, never a later one.
//!
//! # Example
//!
//! ```rust
//! use corefchain::prelude::*;
//! use std::collections::HashMap;
//!
//! /// Links everything it is asked about.
//! struct Always;
//!
//! impl Classifier for Always {
//!     fn classify(&self, _: &[Feature]) -> Result<String> {
//!         Ok("Identity".to_string())
//!     }
//!     fn score(&self, _: &[Feature]) -> Result<HashMap<String, f64>> {
//!         Ok(HashMap::from([("Identity".to_string(), 0.9)]))
//!     }
//! }
//!
//! let doc = Document::new("note", "the tumor grew; it was large").with_mentions(vec![
//!     Mention::new("the tumor", 0, 9).in_sentence(1),
//!     Mention::new("it", 16, 18).in_sentence(2),
//! ]);
//!
//! let mut resolver = MentionClusterResolver::new(ResolverConfig::annotator()).unwrap();
//! let resolution = resolver
//!     .resolve_document(&doc, &mut Mode::Inference { classifier: &Always })
//!     .unwrap();
//!
//! assert_eq!(resolution.clusters.len(), 1);
//! assert_eq!(resolution.clusters[0].mentions.len(), 2);
//! assert_eq!(resolution.edges[0].confidence, 0.9);
//! ```

use crate::classifier::{Classifier, DataWriter, TrainingExample, TrainingLabel, NO_RELATION};
use crate::cluster::{Cluster, ClusterId, ClusterStore};
use crate::config::{DecodePolicy, ResolverConfig, Scope};
use crate::entity::{self, CoveringIndex, TypedEntity};
use crate::error::{Error, Result};
use crate::features::{FeatureContext, FeatureSet};
use crate::gold::GoldStandard;
use crate::pairing::{CandidateGenerator, CandidatePair};
use corefchain_core::{Document, DocumentSource, Mention, MentionId};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

// =============================================================================
// Modes and outputs
// =============================================================================

/// What to do with candidate pairs.
///
/// Collaborators are borrowed for the duration of a call, so one writer or
/// classifier can serve any number of resolvers and patients.
pub enum Mode<'a> {
    /// Write labeled examples; gold links are followed while clustering.
    Training {
        /// Sink for examples
        writer: &'a mut dyn DataWriter,
        /// Gold `(cluster, mention)` lookup
        gold: &'a dyn GoldStandard,
    },
    /// Classify candidates and link by the configured decode policy.
    Inference {
        /// Pairwise classifier
        classifier: &'a dyn Classifier,
    },
}

impl std::fmt::Debug for Mode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Training { .. } => f.write_str("Mode::Training"),
            Mode::Inference { .. } => f.write_str("Mode::Inference"),
        }
    }
}

/// A coreference chain in the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorefCluster {
    /// Cluster identifier
    pub id: ClusterId,
    /// Category label
    pub category: String,
    /// Members in discovery order
    pub mentions: Vec<Mention>,
}

impl From<&Cluster> for CorefCluster {
    fn from(cluster: &Cluster) -> Self {
        Self {
            id: cluster.id(),
            category: cluster.category().to_string(),
            mentions: cluster.members().to_vec(),
        }
    }
}

/// A link decision: `anaphor` continues the chain ending at `antecedent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorefEdge {
    /// Last member of the cluster at link time
    pub antecedent: MentionId,
    /// Mention that was linked
    pub anaphor: MentionId,
    /// Predicted (or gold) category
    pub category: String,
    /// Classifier score of the category (1.0 for gold links)
    pub confidence: f64,
}

/// Everything produced for one scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Surviving clusters, in creation order
    pub clusters: Vec<CorefCluster>,
    /// Link decisions, in decision order
    pub edges: Vec<CorefEdge>,
    /// Typed entities, one per surviving cluster
    pub entities: Vec<TypedEntity>,
    /// Training examples written
    pub examples_written: usize,
}

impl Resolution {
    /// Edge confidence keyed by `(antecedent, anaphor)`.
    #[must_use]
    pub fn pair_scores(&self) -> HashMap<(MentionId, MentionId), f64> {
        self.edges
            .iter()
            .map(|e| ((e.antecedent, e.anaphor), e.confidence))
            .collect()
    }

    /// Cluster containing `mention`, if it survived.
    #[must_use]
    pub fn cluster_of(&self, mention: MentionId) -> Option<&CorefCluster> {
        self.clusters
            .iter()
            .find(|c| c.mentions.iter().any(|m| m.id == mention))
    }

    /// Append another resolution's output.
    pub fn merge(&mut self, other: Resolution) {
        self.clusters.extend(other.clusters);
        self.edges.extend(other.edges);
        self.entities.extend(other.entities);
        self.examples_written += other.examples_written;
    }
}

/// The winning candidate for one mention.
#[derive(Debug)]
struct Link {
    cluster: ClusterId,
    category: String,
    confidence: f64,
    source: &'static str,
}

// =============================================================================
// Resolver
// =============================================================================

/// Incremental clustering engine plus its document/patient driver.
pub struct MentionClusterResolver {
    config: ResolverConfig,
    candidates: CandidateGenerator,
    features: FeatureSet,
    rng: Box<dyn RngCore + Send>,
    store: ClusterStore,
    covering: CoveringIndex,
    edges: Vec<CorefEdge>,
    examples_written: usize,
    last_position: Option<usize>,
    committed: Resolution,
}

impl std::fmt::Debug for MentionClusterResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionClusterResolver")
            .field("config", &self.config)
            .field("candidates", &self.candidates)
            .field("features", &self.features)
            .field("clusters", &self.store.len())
            .field("edges", &self.edges.len())
            .finish()
    }
}

impl MentionClusterResolver {
    /// Create a resolver with the standard strategies and extractors.
    ///
    /// Downsampling draws from a ChaCha8 generator seeded with
    /// `config.seed`.
    pub fn new(config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            candidates: CandidateGenerator::standard(&config),
            features: FeatureSet::standard(),
            rng: Box::new(ChaCha8Rng::seed_from_u64(config.seed)),
            store: ClusterStore::new(),
            covering: CoveringIndex::new(),
            edges: Vec::new(),
            examples_written: 0,
            last_position: None,
            committed: Resolution::default(),
            config,
        })
    }

    /// Replace the candidate strategies.
    #[must_use]
    pub fn with_candidates(mut self, candidates: CandidateGenerator) -> Self {
        self.candidates = candidates;
        self
    }

    /// Replace the feature extractors.
    #[must_use]
    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Replace the downsampling random source.
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Clusters of the current scope, singletons of an unfinished document
    /// included.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.store.iter()
    }

    /// Cluster store of the current scope.
    #[must_use]
    pub fn store(&self) -> &ClusterStore {
        &self.store
    }

    /// Output of the documents a failed single-document [`resolve`] finished
    /// before the error. Empty after a successful call.
    ///
    /// [`resolve`]: Self::resolve
    #[must_use]
    pub fn committed(&self) -> &Resolution {
        &self.committed
    }

    // -------------------------------------------------------------------------
    // Drivers
    // -------------------------------------------------------------------------

    /// Resolve every document of `source` according to `config.scope`.
    ///
    /// The document at index `i` is processed at timeline position `i`. In
    /// single-document scope, documents finished before an error stay
    /// available through [`committed`](Self::committed).
    pub fn resolve(&mut self, source: &dyn DocumentSource, mode: &mut Mode<'_>) -> Result<Resolution> {
        self.committed = Resolution::default();
        match self.config.scope {
            Scope::SingleDocument => {
                let count = source
                    .document_count()
                    .map_err(|e| Error::document_lookup(e.to_string()))?;
                for index in 0..count {
                    let document = fetch_document(source, index)?;
                    let resolution = self.resolve_document(&document, mode)?;
                    self.committed.merge(resolution);
                }
                Ok(std::mem::take(&mut self.committed))
            }
            Scope::Patient => self.resolve_patient(source, mode),
        }
    }

    /// Resolve one document from an empty store.
    pub fn resolve_document(&mut self, document: &Document, mode: &mut Mode<'_>) -> Result<Resolution> {
        self.begin_patient();
        self.process_document(document, mode)?;
        self.finish_patient()
    }

    /// Resolve a patient timeline with shared cluster state.
    ///
    /// A document that cannot be looked up aborts the whole patient. Typed
    /// entities are aggregated only once every document is in, so an
    /// unhandled majority kind fails the patient at the end.
    pub fn resolve_patient(
        &mut self,
        source: &dyn DocumentSource,
        mode: &mut Mode<'_>,
    ) -> Result<Resolution> {
        let count = source
            .document_count()
            .map_err(|e| Error::document_lookup(e.to_string()))?;
        log::info!("Resolving patient timeline of {} documents", count);
        self.begin_patient();
        for index in 0..count {
            let document = fetch_document(source, index)?;
            self.process_document(&document, mode)?;
        }
        self.finish_patient()
    }

    /// Start a new patient: drop all clusters and patient history.
    pub fn begin_patient(&mut self) {
        self.store.clear();
        self.covering.clear();
        self.edges.clear();
        self.examples_written = 0;
        self.last_position = None;
        self.candidates.begin_patient();
    }

    /// Close the current patient and aggregate typed entities.
    ///
    /// On success the resolver is ready for the next patient.
    pub fn finish_patient(&mut self) -> Result<Resolution> {
        let entities = self
            .store
            .iter()
            .map(|cluster| entity::aggregate(cluster, &self.covering))
            .collect::<Result<Vec<_>>>()?;
        let resolution = Resolution {
            clusters: self.store.iter().map(CorefCluster::from).collect(),
            edges: std::mem::take(&mut self.edges),
            entities,
            examples_written: self.examples_written,
        };
        log::info!(
            "Finished scope: {} clusters, {} edges, {} training examples",
            resolution.clusters.len(),
            resolution.edges.len(),
            resolution.examples_written
        );
        self.begin_patient();
        Ok(resolution)
    }

    /// Cluster the mentions of one document into the current scope.
    ///
    /// Documents must arrive in increasing timeline position. On error the
    /// clusters of earlier documents stay in place.
    pub fn process_document(&mut self, document: &Document, mode: &mut Mode<'_>) -> Result<()> {
        let position = document.position();
        if let Some(last) = self.last_position {
            if position <= last {
                return Err(Error::cluster_state(format!(
                    "document '{}' at position {} arrives after position {}",
                    document.id, position, last
                )));
            }
        }
        document.validate()?;

        log::info!(
            "Resolving document '{}' ({} mentions, position {})",
            document.id,
            document.mentions().len(),
            position
        );
        self.candidates.reset(position);
        let ctx = FeatureContext { document };
        for group in document.mentions_by_section() {
            for mention in group {
                self.resolve_mention(&ctx, mention, mode)?;
            }
        }

        let removed = self.store.remove_singletons();
        log::debug!("Removed {} singleton clusters from '{}'", removed, document.id);
        self.candidates.close_document(&self.store);
        self.covering.add_document(document);
        self.last_position = Some(position);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Per-mention decision
    // -------------------------------------------------------------------------

    fn resolve_mention(
        &mut self,
        ctx: &FeatureContext<'_>,
        mention: &Mention,
        mode: &mut Mode<'_>,
    ) -> Result<()> {
        let pairs = self.candidates.get_pairs(&self.store, mention);
        let link = match mode {
            Mode::Training { writer, gold } => self.train(ctx, mention, &pairs, &mut **writer, *gold)?,
            Mode::Inference { classifier } => self.decode(ctx, mention, &pairs, *classifier)?,
        };

        match link {
            Some(link) => self.apply_link(mention, link),
            None => {
                let id = self
                    .store
                    .create_singleton(mention, &self.config.default_category)?;
                self.candidates.record(id);
                log::debug!("{} starts {}", mention.id, id);
                Ok(())
            }
        }
    }

    fn train(
        &mut self,
        ctx: &FeatureContext<'_>,
        mention: &Mention,
        pairs: &[CandidatePair],
        writer: &mut dyn DataWriter,
        gold: &dyn GoldStandard,
    ) -> Result<Option<Link>> {
        let keep = self.config.negative_keep_probability;
        for pair in pairs {
            let Some(cluster) = self.store.get(pair.cluster) else {
                continue;
            };
            let features = self.features.extract(ctx, cluster, mention)?;
            let label = match gold.category(cluster, mention) {
                Some(category) => TrainingLabel::Gold(category.to_string()),
                None if self.rng.gen::<f64>() < keep => TrainingLabel::NoRelation,
                None => TrainingLabel::Drop,
            };
            let Some(written) = label.as_written() else {
                continue;
            };
            writer.write(TrainingExample {
                label: written.to_string(),
                features,
            })?;
            self.examples_written += 1;

            if let TrainingLabel::Gold(category) = label {
                return Ok(Some(Link {
                    cluster: pair.cluster,
                    category,
                    confidence: 1.0,
                    source: pair.source,
                }));
            }
        }
        Ok(None)
    }

    fn decode(
        &self,
        ctx: &FeatureContext<'_>,
        mention: &Mention,
        pairs: &[CandidatePair],
        classifier: &dyn Classifier,
    ) -> Result<Option<Link>> {
        let mut best: Option<Link> = None;
        let mut best_score = 0.0;
        for pair in pairs {
            let Some(cluster) = self.store.get(pair.cluster) else {
                continue;
            };
            let features = self.features.extract(ctx, cluster, mention)?;
            let (predicted, scores) = classifier.classify_with_scores(&features)?;
            if predicted == NO_RELATION {
                continue;
            }
            let score = scores.get(&predicted).copied().ok_or_else(|| {
                Error::classifier(format!("no score for predicted label '{predicted}'"))
            })?;

            match self.config.decode {
                DecodePolicy::GreedyFirst => {
                    return Ok(Some(Link {
                        cluster: pair.cluster,
                        category: predicted,
                        confidence: score,
                        source: pair.source,
                    }));
                }
                DecodePolicy::BestFirst => {
                    if score > best_score {
                        best_score = score;
                        best = Some(Link {
                            cluster: pair.cluster,
                            category: predicted,
                            confidence: score,
                            source: pair.source,
                        });
                    }
                }
            }
        }
        Ok(best)
    }

    fn apply_link(&mut self, mention: &Mention, link: Link) -> Result<()> {
        let cluster = self
            .store
            .get(link.cluster)
            .ok_or_else(|| Error::cluster_state(format!("unknown cluster {}", link.cluster)))?;
        let antecedent = cluster.last().id;
        let origin = cluster.first().id.doc;
        if origin != mention.id.doc {
            log::info!(
                "Cross-document link: {} joins {} started in document {}",
                mention.id,
                link.cluster,
                origin
            );
        }

        self.store.link(link.cluster, mention)?;
        self.candidates.record(link.cluster);
        log::debug!(
            "{} -> {} via {} ({}, {:.3})",
            mention.id,
            link.cluster,
            link.source,
            link.category,
            link.confidence
        );
        self.edges.push(CorefEdge {
            antecedent,
            anaphor: mention.id,
            category: link.category,
            confidence: link.confidence,
        });
        Ok(())
    }
}

/// Document `index` of `source`, placed at timeline position `index`.
fn fetch_document(source: &dyn DocumentSource, index: usize) -> Result<Cow<'_, Document>> {
    let document = source
        .document(index)
        .map_err(|e| Error::document_lookup(e.to_string()))?;
    if document.position() == index {
        Ok(Cow::Borrowed(document))
    } else {
        log::debug!(
            "Placing document '{}' at position {} (was {})",
            document.id,
            index,
            document.position()
        );
        Ok(Cow::Owned(document.clone().at_position(index)))
    }
}
