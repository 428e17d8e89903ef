//! Classifier and training-data writer contracts.
//!
//! The resolver never looks inside the statistical model. At inference time
//! it asks a [`Classifier`] for a label and per-label scores; at training
//! time it hands [`TrainingExample`]s to a [`DataWriter`].
//!
//! Both are borrowed from the caller for the duration of a call, so one
//! writer can accumulate examples over many patients and many resolver
//! instances without any process-wide state.

use crate::error::Result;
use crate::features::Feature;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Label of a candidate pair that does not corefer.
pub const NO_RELATION: &str = "-NONE-";

/// Opaque pairwise classifier.
pub trait Classifier {
    /// Predict a label for the features.
    fn classify(&self, features: &[Feature]) -> Result<String>;

    /// Score every label the model knows.
    fn score(&self, features: &[Feature]) -> Result<HashMap<String, f64>>;

    /// Prediction together with its scores.
    fn classify_with_scores(&self, features: &[Feature]) -> Result<(String, HashMap<String, f64>)> {
        Ok((self.classify(features)?, self.score(features)?))
    }
}

/// Label decision for one candidate during training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingLabel {
    /// Gold category of a true link
    Gold(String),
    /// Negative example kept by downsampling
    NoRelation,
    /// Negative example discarded by downsampling
    Drop,
}

impl TrainingLabel {
    /// Label written to the data writer, or `None` for dropped candidates.
    #[must_use]
    pub fn as_written(&self) -> Option<&str> {
        match self {
            TrainingLabel::Gold(category) => Some(category.as_str()),
            TrainingLabel::NoRelation => Some(NO_RELATION),
            TrainingLabel::Drop => None,
        }
    }
}

/// One labeled feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Gold category or [`NO_RELATION`]
    pub label: String,
    /// Features in extractor order
    pub features: Vec<Feature>,
}

impl TrainingExample {
    /// Check for a negative example.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.label == NO_RELATION
    }
}

/// Sink for training examples.
pub trait DataWriter {
    /// Write one example.
    fn write(&mut self, example: TrainingExample) -> Result<()>;
}

/// Keeps training examples in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataWriter {
    examples: Vec<TrainingExample>,
}

impl MemoryDataWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Examples in write order.
    #[must_use]
    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    /// Number of examples written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Check if nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Number of examples per label.
    #[must_use]
    pub fn label_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of [`NO_RELATION`] examples.
    #[must_use]
    pub fn negatives(&self) -> usize {
        self.examples.iter().filter(|e| e.is_negative()).count()
    }

    /// Take the examples, leaving the writer empty.
    pub fn drain(&mut self) -> Vec<TrainingExample> {
        std::mem::take(&mut self.examples)
    }
}

impl DataWriter for MemoryDataWriter {
    fn write(&mut self, example: TrainingExample) -> Result<()> {
        self.examples.push(example);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_labels() {
        assert_eq!(
            TrainingLabel::Gold("Identity".into()).as_written(),
            Some("Identity")
        );
        assert_eq!(TrainingLabel::NoRelation.as_written(), Some(NO_RELATION));
        assert_eq!(TrainingLabel::Drop.as_written(), None);
    }

    #[test]
    fn memory_writer_counts() {
        let mut writer = MemoryDataWriter::new();
        for label in ["Identity", NO_RELATION, NO_RELATION] {
            writer
                .write(TrainingExample {
                    label: label.to_string(),
                    features: vec![Feature::flag("x", true)],
                })
                .unwrap();
        }
        assert_eq!(writer.len(), 3);
        assert_eq!(writer.negatives(), 2);
        assert_eq!(writer.label_counts().get("Identity"), Some(&1));
        assert_eq!(writer.drain().len(), 3);
        assert!(writer.is_empty());
    }

    #[test]
    fn examples_serialize_as_json() {
        let example = TrainingExample {
            label: "Identity".into(),
            features: vec![
                Feature::flag("string_exact", true),
                Feature::number("sentence_distance", 2.0),
            ],
        };
        let json = serde_json::to_value(&example).unwrap();
        assert_eq!(json["label"], "Identity");
        assert_eq!(json["features"][0]["value"], true);
        assert_eq!(json["features"][1]["value"], 2.0);
    }
}
