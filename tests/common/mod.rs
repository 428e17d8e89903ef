//! Shared fixtures for integration tests.

#![allow(dead_code)]

use corefchain::cluster::Cluster;
use corefchain::features::{FeatureContext, FeatureSet, PairFeatureExtractor};
use corefchain::prelude::*;
use std::collections::HashMap;

/// Emits the texts of the cluster's first member and of the mention.
pub struct PairKey;

impl PairFeatureExtractor for PairKey {
    fn name(&self) -> &'static str {
        "pair_key"
    }

    fn extract(
        &self,
        _ctx: &FeatureContext<'_>,
        cluster: &Cluster,
        mention: &Mention,
    ) -> Result<Vec<Feature>> {
        Ok(vec![
            Feature::text("antecedent", cluster.first().text.clone()),
            Feature::text("anaphor", mention.text.clone()),
        ])
    }
}

/// Feature set that only carries the pair key.
pub fn pair_key_features() -> FeatureSet {
    FeatureSet::empty().with_pair(PairKey)
}

/// Links `(antecedent, anaphor)` text pairs listed in a table, with the
/// listed score. Everything else is [`NO_RELATION`].
#[derive(Debug, Default)]
pub struct TableClassifier {
    links: HashMap<(String, String), f64>,
}

impl TableClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(mut self, antecedent: &str, anaphor: &str, score: f64) -> Self {
        self.links
            .insert((antecedent.to_string(), anaphor.to_string()), score);
        self
    }

    fn lookup(&self, features: &[Feature]) -> Option<f64> {
        let text = |name: &str| {
            features.iter().find_map(|f| match &f.value {
                FeatureValue::Text(t) if f.name == name => Some(t.clone()),
                _ => None,
            })
        };
        let key = (text("antecedent")?, text("anaphor")?);
        self.links.get(&key).copied()
    }
}

impl Classifier for TableClassifier {
    fn classify(&self, features: &[Feature]) -> Result<String> {
        Ok(match self.lookup(features) {
            Some(_) => "Identity".to_string(),
            None => NO_RELATION.to_string(),
        })
    }

    fn score(&self, features: &[Feature]) -> Result<HashMap<String, f64>> {
        Ok(match self.lookup(features) {
            Some(score) => HashMap::from([
                ("Identity".to_string(), score),
                (NO_RELATION.to_string(), 1.0 - score),
            ]),
            None => HashMap::from([(NO_RELATION.to_string(), 1.0)]),
        })
    }
}

/// Builds a document whose text is the mention texts joined by `". "`.
/// Each entry is `(text, sentence)`.
pub fn document(id: &str, mentions: &[(&str, usize)]) -> Document {
    let mut text = String::new();
    let mut spans = Vec::new();
    for (mention, sentence) in mentions {
        if !text.is_empty() {
            text.push_str(". ");
        }
        let begin = text.len();
        text.push_str(mention);
        spans.push(Mention::new(*mention, begin, text.len()).in_sentence(*sentence));
    }
    Document::new(id, text).with_mentions(spans)
}

/// Texts of every surviving cluster, in creation order.
pub fn cluster_texts(resolution: &Resolution) -> Vec<Vec<String>> {
    resolution
        .clusters
        .iter()
        .map(|c| c.mentions.iter().map(|m| m.text.clone()).collect())
        .collect()
}
