//! Error types for corefchain.

use crate::cluster::ClusterId;
use corefchain_core::AnnotationKind;
use thiserror::Error;

/// Result type for corefchain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for corefchain operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Error from the data model.
    #[error(transparent)]
    Core(#[from] corefchain_core::Error),

    /// Classifier failed to classify or score.
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// A feature extractor failed.
    #[error("Feature extraction failed: {0}")]
    FeatureExtraction(String),

    /// Training data could not be written.
    #[error("Data writer error: {0}")]
    DataWriter(String),

    /// A document view could not be resolved during patient-level processing.
    #[error("Document lookup failed: {0}")]
    DocumentLookup(String),

    /// The majority covering annotation of a cluster has no entity mapping.
    #[error("Coreference chain {cluster} has an unknown type: {kind}")]
    UnhandledAnnotationKind {
        /// Offending annotation kind
        kind: AnnotationKind,
        /// Cluster identifier
        cluster: ClusterId,
    },

    /// A cluster store operation would break a chain invariant.
    #[error("Cluster state error: {0}")]
    ClusterState(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be parsed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Create a classifier error.
    pub fn classifier(msg: impl Into<String>) -> Self {
        Error::Classifier(msg.into())
    }

    /// Create a feature extraction error.
    pub fn feature_extraction(msg: impl Into<String>) -> Self {
        Error::FeatureExtraction(msg.into())
    }

    /// Create a data writer error.
    pub fn data_writer(msg: impl Into<String>) -> Self {
        Error::DataWriter(msg.into())
    }

    /// Create a document lookup error.
    pub fn document_lookup(msg: impl Into<String>) -> Self {
        Error::DocumentLookup(msg.into())
    }

    /// Create a cluster state error.
    pub fn cluster_state(msg: impl Into<String>) -> Self {
        Error::ClusterState(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
