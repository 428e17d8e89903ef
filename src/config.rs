//! Resolver configuration.
//!
//! ```rust
//! use corefchain::config::{DecodePolicy, ResolverConfig, Scope};
//!
//! let config = ResolverConfig::from_toml_str(
//!     r#"
//!     decode = "best_first"
//!     scope = "patient"
//!     negative_keep_probability = 0.25
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.decode, DecodePolicy::BestFirst);
//! assert_eq!(config.scope, Scope::Patient);
//! assert_eq!(config.sentence_distance, 5);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Category given to every cluster the resolver creates.
pub const DEFAULT_CLUSTER_CATEGORY: &str = "Identity";

/// Rule used to pick which positively-classified candidate gets the mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// First positive candidate in strategy-registration order wins
    /// ("closest-first" decoding).
    #[default]
    GreedyFirst,
    /// Candidate with the strictly greatest positive score wins; equal maxima
    /// resolve to the first encountered.
    BestFirst,
}

/// How far cluster state carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every document is resolved on its own.
    #[default]
    SingleDocument,
    /// Documents of a patient share clusters, in timeline order.
    Patient,
}

/// Configuration for [`crate::MentionClusterResolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Decode policy used at inference time
    pub decode: DecodePolicy,
    /// Single-document or patient-level processing
    pub scope: Scope,
    /// Probability (0.0-1.0) of keeping a negative training example
    pub negative_keep_probability: f64,
    /// Seed for the default downsampling random source
    pub seed: u64,
    /// Maximum sentence distance for the sentence-distance strategy
    pub sentence_distance: usize,
    /// Number of recent clusters proposed unconditionally (`None` = all)
    pub cluster_cap: Option<usize>,
    /// Category label of new clusters
    pub default_category: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            decode: DecodePolicy::GreedyFirst,
            scope: Scope::SingleDocument,
            negative_keep_probability: 0.5,
            seed: 0,
            sentence_distance: 5,
            cluster_cap: None,
            default_category: DEFAULT_CLUSTER_CATEGORY.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Training data generation over whole patients.
    #[must_use]
    pub fn data_writer(negative_keep_probability: f64) -> Self {
        Self {
            scope: Scope::Patient,
            negative_keep_probability,
            ..Default::default()
        }
    }

    /// Inference over single documents.
    #[must_use]
    pub fn annotator() -> Self {
        Self::default()
    }

    /// Inference over whole patients, carrying clusters across documents.
    #[must_use]
    pub fn multidoc_annotator() -> Self {
        Self {
            scope: Scope::Patient,
            ..Default::default()
        }
    }

    /// Set the decode policy.
    #[must_use]
    pub fn with_decode(mut self, decode: DecodePolicy) -> Self {
        self.decode = decode;
        self
    }

    /// Set the processing scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the negative example keep probability.
    #[must_use]
    pub fn with_negative_keep_probability(mut self, p: f64) -> Self {
        self.negative_keep_probability = p;
        self
    }

    /// Set the downsampling seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the sentence window.
    #[must_use]
    pub fn with_sentence_distance(mut self, sentences: usize) -> Self {
        self.sentence_distance = sentences;
        self
    }

    /// Cap the clusters proposed unconditionally.
    #[must_use]
    pub fn with_cluster_cap(mut self, cap: Option<usize>) -> Self {
        self.cluster_cap = cap;
        self
    }

    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let p = self.negative_keep_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::config(format!(
                "negative_keep_probability must be in [0, 1], got {p}"
            )));
        }
        if self.default_category.is_empty() {
            return Err(Error::config("default_category must not be empty"));
        }
        Ok(())
    }
}
