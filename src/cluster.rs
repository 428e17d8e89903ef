//! Coreference clusters and the append-only cluster store.
//!
//! # Invariants
//!
//! - Every mention belongs to at most one cluster
//! - A cluster only grows, by appending at the end of its chain
//! - Chain order is discovery order: the earliest mention is always first
//! - Singletons are bookkeeping; [`ClusterStore::remove_singletons`] drops
//!   them once a document is complete

use crate::error::{Error, Result};
use corefchain_core::{Mention, MentionId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a cluster, unique for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u64);

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// An ordered chain of mentions believed to refer to the same entity/event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    id: ClusterId,
    category: String,
    members: Vec<Mention>,
}

impl Cluster {
    /// Cluster identifier.
    #[must_use]
    pub fn id(&self) -> ClusterId {
        self.id
    }

    /// Category label ("Identity" unless configured otherwise).
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Members in chain order.
    #[must_use]
    pub fn members(&self) -> &[Mention] {
        &self.members
    }

    /// Earliest member; the cluster's representative.
    #[must_use]
    pub fn first(&self) -> &Mention {
        &self.members[0]
    }

    /// Most recently appended member.
    #[must_use]
    pub fn last(&self) -> &Mention {
        &self.members[self.members.len() - 1]
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Clusters are never empty; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Check if the chain holds exactly one mention.
    #[must_use]
    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }

    /// Check membership.
    #[must_use]
    pub fn contains(&self, mention: MentionId) -> bool {
        self.members.iter().any(|m| m.id == mention)
    }

    /// Most recent member from document `doc`, if any.
    #[must_use]
    pub fn last_in_document(&self, doc: usize) -> Option<&Mention> {
        self.members.iter().rev().find(|m| m.id.doc == doc)
    }
}

/// Append-only store of coreference chains for one patient run.
///
/// Clusters iterate in creation order.
#[derive(Debug, Clone, Default)]
pub struct ClusterStore {
    clusters: IndexMap<ClusterId, Cluster>,
    membership: HashMap<MentionId, ClusterId>,
    next_id: u64,
}

impl ClusterStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a one-mention cluster.
    pub fn create_singleton(&mut self, mention: &Mention, category: &str) -> Result<ClusterId> {
        self.check_unclustered(mention)?;
        let id = ClusterId(self.next_id);
        self.next_id += 1;
        self.clusters.insert(
            id,
            Cluster {
                id,
                category: category.to_string(),
                members: vec![mention.clone()],
            },
        );
        self.membership.insert(mention.id, id);
        Ok(id)
    }

    /// Append `mention` to the end of cluster `id`.
    ///
    /// Fails if the mention is already clustered, the cluster is unknown, or
    /// the mention precedes the cluster's last member in discovery order.
    pub fn link(&mut self, id: ClusterId, mention: &Mention) -> Result<()> {
        self.check_unclustered(mention)?;
        let cluster = self
            .clusters
            .get_mut(&id)
            .ok_or_else(|| Error::cluster_state(format!("unknown cluster {id}")))?;
        let last = cluster.last().id;
        if mention.id <= last {
            return Err(Error::cluster_state(format!(
                "mention {} precedes last member {} of cluster {}",
                mention.id, last, id
            )));
        }
        cluster.members.push(mention.clone());
        self.membership.insert(mention.id, id);
        Ok(())
    }

    /// Look up a cluster.
    #[must_use]
    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(&id)
    }

    /// Cluster holding `mention`, if any.
    #[must_use]
    pub fn cluster_of(&self, mention: MentionId) -> Option<ClusterId> {
        self.membership.get(&mention).copied()
    }

    /// Clusters in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    /// Number of clusters, singletons included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Delete every cluster with exactly one member. Returns how many were
    /// removed.
    pub fn remove_singletons(&mut self) -> usize {
        let before = self.clusters.len();
        let membership = &mut self.membership;
        self.clusters.retain(|_, cluster| {
            if cluster.is_singleton() {
                membership.remove(&cluster.first().id);
                false
            } else {
                true
            }
        });
        before - self.clusters.len()
    }

    /// Drop all clusters. Identifiers are not reused.
    pub fn clear(&mut self) {
        self.clusters.clear();
        self.membership.clear();
    }

    fn check_unclustered(&self, mention: &Mention) -> Result<()> {
        match self.membership.get(&mention.id) {
            Some(existing) => Err(Error::cluster_state(format!(
                "mention {} already belongs to cluster {}",
                mention.id, existing
            ))),
            None => Ok(()),
        }
    }
}
