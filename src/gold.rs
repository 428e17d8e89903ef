//! Gold-standard coreference used while generating training data.
//!
//! Gold chains arrive as spans. [`GoldChains::align`] maps each span onto a
//! system mention; spans that cannot be placed are logged and left out, and
//! the rest of the document is still used.

use crate::cluster::Cluster;
use crate::error::Result;
use corefchain_core::{DocumentSource, Mention, MentionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Answers whether a candidate pair is a true link, and of which category.
pub trait GoldStandard {
    /// Gold category linking `mention` to `cluster`, if any.
    fn category(&self, cluster: &Cluster, mention: &Mention) -> Option<&str>;
}

/// A gold mention span in a patient timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoldSpan {
    /// Timeline position of the document
    pub doc: usize,
    /// Start byte offset (inclusive)
    pub begin: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl GoldSpan {
    /// Create a span.
    #[must_use]
    pub fn new(doc: usize, begin: usize, end: usize) -> Self {
        Self { doc, begin, end }
    }
}

/// A gold coreference chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldChain {
    /// Relation category, e.g. "Identity"
    pub category: String,
    /// Member spans
    pub spans: Vec<GoldSpan>,
}

impl GoldChain {
    /// Create a chain.
    #[must_use]
    pub fn new(category: impl Into<String>, spans: Vec<GoldSpan>) -> Self {
        Self {
            category: category.into(),
            spans,
        }
    }
}

/// Gold chains aligned to system mentions.
#[derive(Debug, Clone, Default)]
pub struct GoldChains {
    chain_of: HashMap<MentionId, usize>,
    categories: Vec<String>,
    skipped: usize,
}

impl GoldChains {
    /// Align gold chains onto the mentions of `source`.
    ///
    /// Spans in an unknown document, outside the document text, or matching
    /// no mention are skipped with a warning.
    pub fn align(source: &dyn DocumentSource, chains: &[GoldChain]) -> Result<Self> {
        let doc_count = source.document_count()?;
        let mut by_span: Vec<Option<HashMap<(usize, usize), MentionId>>> = vec![None; doc_count];
        let mut aligned = Self::default();

        for (chain_idx, chain) in chains.iter().enumerate() {
            aligned.categories.push(chain.category.clone());
            for span in &chain.spans {
                let Some(doc) = (span.doc < doc_count)
                    .then(|| source.document(span.doc).ok())
                    .flatten()
                else {
                    log::warn!(
                        "Gold span [{}, {}) refers to unknown document {}; skipping",
                        span.begin,
                        span.end,
                        span.doc
                    );
                    aligned.skipped += 1;
                    continue;
                };
                if span.begin >= span.end || span.end > doc.text.len() {
                    log::warn!(
                        "Gold span [{}, {}) is out of bounds for document '{}' (length {}); skipping",
                        span.begin,
                        span.end,
                        doc.id,
                        doc.text.len()
                    );
                    aligned.skipped += 1;
                    continue;
                }
                let index = by_span[span.doc].get_or_insert_with(|| {
                    doc.mentions()
                        .iter()
                        .map(|m| ((m.begin, m.end), MentionId::new(span.doc, m.id.index)))
                        .collect()
                });
                match index.get(&(span.begin, span.end)) {
                    Some(&id) => {
                        aligned.chain_of.insert(id, chain_idx);
                    }
                    None => {
                        log::warn!(
                            "Gold span [{}, {}) in document '{}' matches no mention; skipping",
                            span.begin,
                            span.end,
                            doc.id
                        );
                        aligned.skipped += 1;
                    }
                }
            }
        }
        Ok(aligned)
    }

    /// Gold chain index of a mention.
    #[must_use]
    pub fn chain_of(&self, mention: MentionId) -> Option<usize> {
        self.chain_of.get(&mention).copied()
    }

    /// Number of aligned mentions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain_of.len()
    }

    /// Check if nothing aligned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chain_of.is_empty()
    }

    /// Number of gold spans that could not be aligned.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl GoldStandard for GoldChains {
    fn category(&self, cluster: &Cluster, mention: &Mention) -> Option<&str> {
        let chain = self.chain_of(mention.id)?;
        cluster
            .members()
            .iter()
            .any(|m| self.chain_of(m.id) == Some(chain))
            .then(|| self.categories[chain].as_str())
    }
}
