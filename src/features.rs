//! Feature extraction for `(cluster, mention)` pairs and lone mentions.
//!
//! Extractors run in a fixed order: every pair extractor, then every mention
//! extractor. A feature whose value is [`FeatureValue::Null`] is replaced by
//! the [`NULL_SENTINEL`] text value and the replacement is logged, so the
//! classifier always sees the same feature names for the same input.
//!
//! # Example
//!
//! ```rust
//! use corefchain::features::{Feature, FeatureValue};
//!
//! let f = Feature::number("sentence_distance", 2.0);
//! assert_eq!(f.value, FeatureValue::Number(2.0));
//! assert!(!Feature::null("section").value.is_present());
//! ```

use crate::cluster::Cluster;
use crate::error::Result;
use corefchain_core::{Document, Mention};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Value substituted for a missing feature value.
pub const NULL_SENTINEL: &str = "NULL";

// =============================================================================
// Feature
// =============================================================================

/// A feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Boolean indicator
    Flag(bool),
    /// Numeric value
    Number(f64),
    /// Categorical value
    Text(String),
    /// Missing value; never reaches the classifier
    Null,
}

impl FeatureValue {
    /// Check if a value is present.
    #[must_use]
    pub fn is_present(&self) -> bool {
        !matches!(self, FeatureValue::Null)
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Flag(b) => write!(f, "{b}"),
            FeatureValue::Number(n) => write!(f, "{n}"),
            FeatureValue::Text(s) => f.write_str(s),
            FeatureValue::Null => f.write_str("<null>"),
        }
    }
}

/// A named feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name
    pub name: String,
    /// Feature value
    pub value: FeatureValue,
}

impl Feature {
    /// Create a feature.
    #[must_use]
    pub fn new(name: impl Into<String>, value: FeatureValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Boolean feature.
    #[must_use]
    pub fn flag(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, FeatureValue::Flag(value))
    }

    /// Numeric feature.
    #[must_use]
    pub fn number(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, FeatureValue::Number(value))
    }

    /// Categorical feature.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FeatureValue::Text(value.into()))
    }

    /// Feature with a missing value.
    #[must_use]
    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, FeatureValue::Null)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

// =============================================================================
// Extractor contracts
// =============================================================================

/// What an extractor may consult besides its direct input.
#[derive(Debug, Clone, Copy)]
pub struct FeatureContext<'a> {
    /// Document containing the mention being resolved
    pub document: &'a Document,
}

/// Extracts features from a `(cluster, mention)` pair.
pub trait PairFeatureExtractor: Send + Sync {
    /// Extractor name, used in logs.
    fn name(&self) -> &'static str;

    /// Extract zero or more features.
    fn extract(
        &self,
        ctx: &FeatureContext<'_>,
        cluster: &Cluster,
        mention: &Mention,
    ) -> Result<Vec<Feature>>;
}

/// Extracts features from a mention alone.
pub trait MentionFeatureExtractor: Send + Sync {
    /// Extractor name, used in logs.
    fn name(&self) -> &'static str;

    /// Extract zero or more features.
    fn extract(&self, ctx: &FeatureContext<'_>, mention: &Mention) -> Result<Vec<Feature>>;
}

// =============================================================================
// FeatureSet
// =============================================================================

/// Ordered list of pair and mention extractors.
pub struct FeatureSet {
    pair: Vec<Box<dyn PairFeatureExtractor>>,
    mention: Vec<Box<dyn MentionFeatureExtractor>>,
}

impl std::fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureSet")
            .field("pair", &self.pair.iter().map(|e| e.name()).collect::<Vec<_>>())
            .field(
                "mention",
                &self.mention.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeatureSet {
    /// No extractors.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            pair: Vec::new(),
            mention: Vec::new(),
        }
    }

    /// Built-in extractors: string match, distance, cluster shape (pair);
    /// mention shape, mention section (mention).
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_pair(StringMatchFeatures)
            .with_pair(DistanceFeatures)
            .with_pair(ClusterShapeFeatures)
            .with_mention(MentionShapeFeatures)
            .with_mention(MentionSectionFeatures)
    }

    /// Append a pair extractor.
    #[must_use]
    pub fn with_pair(mut self, extractor: impl PairFeatureExtractor + 'static) -> Self {
        self.pair.push(Box::new(extractor));
        self
    }

    /// Append a mention extractor.
    #[must_use]
    pub fn with_mention(mut self, extractor: impl MentionFeatureExtractor + 'static) -> Self {
        self.mention.push(Box::new(extractor));
        self
    }

    /// Pair features followed by mention features, nulls replaced by
    /// [`NULL_SENTINEL`].
    pub fn extract(
        &self,
        ctx: &FeatureContext<'_>,
        cluster: &Cluster,
        mention: &Mention,
    ) -> Result<Vec<Feature>> {
        let mut features = Vec::new();
        for extractor in &self.pair {
            let mut feats = extractor.extract(ctx, cluster, mention)?;
            substitute_nulls(extractor.name(), &mut feats);
            features.append(&mut feats);
        }
        for extractor in &self.mention {
            let mut feats = extractor.extract(ctx, mention)?;
            substitute_nulls(extractor.name(), &mut feats);
            features.append(&mut feats);
        }
        Ok(features)
    }
}

fn substitute_nulls(extractor: &str, features: &mut [Feature]) {
    for feature in features.iter_mut().filter(|f| !f.value.is_present()) {
        log::warn!(
            "Null value found in feature '{}' from {}; using {}",
            feature.name,
            extractor,
            NULL_SENTINEL
        );
        feature.value = FeatureValue::Text(NULL_SENTINEL.to_string());
    }
}

// =============================================================================
// Built-in extractors
// =============================================================================

/// Jaccard similarity of lowercase whitespace tokens.
///
/// Returns a value in [0.0, 1.0]; two empty strings are identical.
#[must_use]
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let words_a: HashSet<&str> = a.split_whitespace().collect();
    let words_b: HashSet<&str> = b.split_whitespace().collect();

    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

const PRONOUNS: &[&str] = &[
    "it", "its", "itself", "this", "that", "these", "those", "they", "them", "their", "he",
    "him", "his", "she", "her", "which",
];

fn is_pronoun(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    PRONOUNS.contains(&lower.as_str())
}

/// Surface and head-word agreement between the mention and any member.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMatchFeatures;

impl PairFeatureExtractor for StringMatchFeatures {
    fn name(&self) -> &'static str {
        "string_match"
    }

    fn extract(
        &self,
        _ctx: &FeatureContext<'_>,
        cluster: &Cluster,
        mention: &Mention,
    ) -> Result<Vec<Feature>> {
        let exact = cluster
            .members()
            .iter()
            .any(|m| m.text.eq_ignore_ascii_case(&mention.text));
        let head = mention.head_text().is_some_and(|h| {
            cluster
                .members()
                .iter()
                .filter_map(|m| m.head_text())
                .any(|mh| mh.eq_ignore_ascii_case(h))
        });
        let overlap = cluster
            .members()
            .iter()
            .map(|m| token_overlap(&m.text, &mention.text))
            .fold(0.0_f64, f64::max);
        Ok(vec![
            Feature::flag("string_exact", exact),
            Feature::flag("string_head", head),
            Feature::number("string_overlap", overlap),
        ])
    }
}

/// Distance from the cluster's latest member to the mention.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceFeatures;

impl PairFeatureExtractor for DistanceFeatures {
    fn name(&self) -> &'static str {
        "distance"
    }

    fn extract(
        &self,
        _ctx: &FeatureContext<'_>,
        cluster: &Cluster,
        mention: &Mention,
    ) -> Result<Vec<Feature>> {
        let cross_document = cluster.first().id.doc != mention.id.doc;
        let mut features = vec![Feature::flag("cross_document", cross_document)];
        match cluster.last_in_document(mention.id.doc) {
            Some(latest) => {
                let distance = mention.sentence.abs_diff(latest.sentence);
                features.push(Feature::number("sentence_distance", distance as f64));
                features.push(Feature::flag(
                    "same_section",
                    latest.section.is_some() && latest.section == mention.section,
                ));
            }
            None => features.push(Feature::flag("same_section", false)),
        }
        Ok(features)
    }
}

/// Size and document spread of the cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterShapeFeatures;

impl PairFeatureExtractor for ClusterShapeFeatures {
    fn name(&self) -> &'static str {
        "cluster_shape"
    }

    fn extract(
        &self,
        _ctx: &FeatureContext<'_>,
        cluster: &Cluster,
        _mention: &Mention,
    ) -> Result<Vec<Feature>> {
        let docs: HashSet<usize> = cluster.members().iter().map(|m| m.id.doc).collect();
        Ok(vec![
            Feature::number("cluster_size", cluster.len() as f64),
            Feature::number("cluster_documents", docs.len() as f64),
            Feature::flag("cluster_pronoun_first", is_pronoun(&cluster.first().text)),
        ])
    }
}

/// Token count, pronoun flag and head availability of the mention.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentionShapeFeatures;

impl MentionFeatureExtractor for MentionShapeFeatures {
    fn name(&self) -> &'static str {
        "mention_shape"
    }

    fn extract(&self, _ctx: &FeatureContext<'_>, mention: &Mention) -> Result<Vec<Feature>> {
        Ok(vec![
            Feature::number(
                "mention_tokens",
                mention.text.split_whitespace().count() as f64,
            ),
            Feature::flag("mention_pronoun", is_pronoun(&mention.text)),
            Feature::flag("mention_has_head", mention.head.is_some()),
        ])
    }
}

/// Name of the section containing the mention; null outside any section.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentionSectionFeatures;

impl MentionFeatureExtractor for MentionSectionFeatures {
    fn name(&self) -> &'static str {
        "mention_section"
    }

    fn extract(&self, ctx: &FeatureContext<'_>, mention: &Mention) -> Result<Vec<Feature>> {
        let section = mention
            .section
            .and_then(|i| ctx.document.sections().get(i))
            .map(|s| s.name.clone());
        Ok(vec![match section {
            Some(name) => Feature::text("mention_section", name),
            None => Feature::null("mention_section"),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterStore;
    use crate::error::Error;
    use corefchain_core::Section;

    fn doc() -> Document {
        Document::new("n", "PLAN: the tumor. The tumor shrank. it")
            .with_sections(vec![Section::new("PLAN", 0, 34)])
            .with_mentions(vec![
                Mention::new("the tumor", 6, 15).with_head("tumor", 10, 15),
                Mention::new("The tumor", 17, 26)
                    .with_head("tumor", 21, 26)
                    .in_sentence(1),
                Mention::new("it", 35, 37).in_sentence(2),
            ])
    }

    fn cluster_of_first(doc: &Document) -> (ClusterStore, crate::cluster::ClusterId) {
        let mut store = ClusterStore::new();
        let id = store
            .create_singleton(&doc.mentions()[0], "Identity")
            .unwrap();
        (store, id)
    }

    #[test]
    fn token_overlap_bounds() {
        assert_eq!(token_overlap("the tumor", "The Tumor"), 1.0);
        assert_eq!(token_overlap("", ""), 1.0);
        assert_eq!(token_overlap("tumor", ""), 0.0);
        assert!((token_overlap("the tumor", "the mass") - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn standard_order_and_no_nulls() {
        let doc = doc();
        let (store, id) = cluster_of_first(&doc);
        let ctx = FeatureContext { document: &doc };
        let features = FeatureSet::standard()
            .extract(&ctx, store.get(id).unwrap(), &doc.mentions()[2])
            .unwrap();

        let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"string_exact"));
        assert_eq!(names.last(), Some(&"mention_section"));
        assert!(features.iter().all(|f| f.value.is_present()));

        // "it" lies outside the only section: the sentinel stands in.
        let section = features.last().unwrap();
        assert_eq!(section.value, FeatureValue::Text(NULL_SENTINEL.into()));
    }

    #[test]
    fn string_match_sees_heads_and_case() {
        let doc = doc();
        let (store, id) = cluster_of_first(&doc);
        let ctx = FeatureContext { document: &doc };
        let features = StringMatchFeatures
            .extract(&ctx, store.get(id).unwrap(), &doc.mentions()[1])
            .unwrap();
        assert_eq!(features[0], Feature::flag("string_exact", true));
        assert_eq!(features[1], Feature::flag("string_head", true));
    }

    #[test]
    fn distance_in_sentences() {
        let doc = doc();
        let (store, id) = cluster_of_first(&doc);
        let ctx = FeatureContext { document: &doc };
        let features = DistanceFeatures
            .extract(&ctx, store.get(id).unwrap(), &doc.mentions()[2])
            .unwrap();
        assert!(features.contains(&Feature::number("sentence_distance", 2.0)));
        assert!(features.contains(&Feature::flag("cross_document", false)));
    }

    struct Failing;

    impl MentionFeatureExtractor for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn extract(&self, _ctx: &FeatureContext<'_>, _m: &Mention) -> Result<Vec<Feature>> {
            Err(Error::feature_extraction("resource unavailable"))
        }
    }

    #[test]
    fn extractor_failure_propagates() {
        let doc = doc();
        let (store, id) = cluster_of_first(&doc);
        let ctx = FeatureContext { document: &doc };
        let set = FeatureSet::standard().with_mention(Failing);
        let err = set
            .extract(&ctx, store.get(id).unwrap(), &doc.mentions()[1])
            .unwrap_err();
        assert!(matches!(err, Error::FeatureExtraction(_)));
    }
}
