//! # corefchain
//!
//! Incremental mention-cluster coreference for clinical patient timelines.
//!
//! - **Candidates**: ordered, composable pairing strategies (sentence
//!   distance, section, recency cap, head word, previous document)
//! - **Clustering**: one mention at a time, greedy-first or best-first
//!   decoding over an opaque pairwise classifier
//! - **Training**: the same loop writes downsampled labeled examples
//! - **Typed entities**: surviving chains labeled by majority covering concept
//!
//! ## Quick Start
//!
//! ```rust
//! use corefchain::prelude::*;
//! use std::collections::HashMap;
//!
//! struct SameHead;
//!
//! impl Classifier for SameHead {
//!     fn classify(&self, features: &[Feature]) -> Result<String> {
//!         let matched = features
//!             .iter()
//!             .any(|f| f.name == "string_head" && f.value == FeatureValue::Flag(true));
//!         Ok(if matched { "Identity" } else { NO_RELATION }.to_string())
//!     }
//!
//!     fn score(&self, features: &[Feature]) -> Result<HashMap<String, f64>> {
//!         Ok(HashMap::from([(self.classify(features)?, 1.0)]))
//!     }
//! }
//!
//! let doc = Document::new("note", "chest pain at rest. The pain resolved.")
//!     .with_mentions(vec![
//!         Mention::new("chest pain", 0, 10).with_head("pain", 6, 10).in_sentence(0),
//!         Mention::new("The pain", 20, 28).with_head("pain", 24, 28).in_sentence(1),
//!     ])
//!     .with_annotations(vec![ConceptAnnotation::new(AnnotationKind::SignSymptom, 0, 10)]);
//!
//! let mut resolver = MentionClusterResolver::new(ResolverConfig::annotator())?;
//! let resolution = resolver.resolve_document(&doc, &mut Mode::Inference { classifier: &SameHead })?;
//!
//! assert_eq!(resolution.clusters.len(), 1);
//! assert_eq!(resolution.entities[0].kind, EntityKind::Finding);
//! # Ok::<(), corefchain::Error>(())
//! ```
//!
//! ## Modules
//!
//! | Module | Role |
//! |--------|------|
//! | [`pairing`] | candidate strategies and their document/patient contexts |
//! | [`cluster`] | append-only coreference chains |
//! | [`features`] | feature extractor contract and built-in extractors |
//! | [`classifier`] | classifier and training-data writer contracts |
//! | [`gold`] | gold chains aligned to mentions for training |
//! | [`resolver`] | the clustering engine and document/patient driver |
//! | [`entity`] | typed-entity aggregation |
//! | [`config`] | resolver configuration and presets |

#![warn(missing_docs)]

pub mod classifier;
pub mod cluster;
pub mod config;
pub mod entity;
mod error;
pub mod features;
pub mod gold;
pub mod pairing;
pub mod resolver;

pub use classifier::{Classifier, DataWriter, MemoryDataWriter, TrainingExample, NO_RELATION};
pub use cluster::{Cluster, ClusterId, ClusterStore};
pub use config::{DecodePolicy, ResolverConfig, Scope};
pub use entity::{EntityKind, TypedEntity};
pub use error::{Error, Result};
pub use features::{Feature, FeatureSet, FeatureValue};
pub use gold::{GoldChain, GoldChains, GoldSpan, GoldStandard};
pub use pairing::{CandidateGenerator, CandidatePair, PairingStrategy};
pub use resolver::{CorefCluster, CorefEdge, MentionClusterResolver, Mode, Resolution};

/// Prelude for common imports.
pub mod prelude {
    //! Common imports.
    //!
    //! ```rust
    //! use corefchain::prelude::*;
    //! ```

    pub use crate::classifier::{
        Classifier, DataWriter, MemoryDataWriter, TrainingExample, NO_RELATION,
    };
    pub use crate::config::{DecodePolicy, ResolverConfig, Scope};
    pub use crate::entity::{EntityKind, TypedEntity};
    pub use crate::error::{Error, Result};
    pub use crate::features::{Feature, FeatureSet, FeatureValue};
    pub use crate::gold::{GoldChain, GoldChains, GoldSpan, GoldStandard};
    pub use crate::resolver::{CorefEdge, MentionClusterResolver, Mode, Resolution};
    pub use corefchain_core::{
        AnnotationKind, ConceptAnnotation, Document, DocumentSource, Mention, MentionId, Patient,
        Section,
    };
}
