//! In-memory graph store.
//!
//! This is the reference implementation of `GraphStore`.
//! It uses hashbrown maps protected by RwLock.
//!
//! ## Limitations
//!
//! - **No snapshots**: reads see writes immediately. A ranking that runs
//!   alongside writers may observe different graph states per candidate.
//! - **Reads are not atomic across collections**: a reader can see a node
//!   whose edges are still being removed. Writers take `nodes` before
//!   `adjacency`, so an edge is never indexed for a deleted endpoint.
//!
//! Use this store for:
//! - Testing the feature extractor, scorer and ranker
//! - Embedding tunematch in applications that don't need persistence

use std::sync::Arc;

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;

use crate::model::*;
use crate::{Error, Result};
use super::GraphStore;

/// Adjacency key: (start node, relationship type, direction from start).
type AdjKey = (NodeId, RelType, Direction);

const ALL_REL_TYPES: [RelType; 5] = [
    RelType::LikesGenre,
    RelType::Liked,
    RelType::Follows,
    RelType::Owns,
    RelType::Contains,
];

// ============================================================================
// MemoryGraph
// ============================================================================

/// In-memory music-social graph. Cloning shares the underlying graph.
#[derive(Clone, Default)]
pub struct MemoryGraph {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    nodes: RwLock<HashMap<(Label, NodeId), Node>>,
    /// Both directions are indexed so incoming reads are as cheap as outgoing.
    adjacency: RwLock<HashMap<AdjKey, HashSet<NodeId>>>,
    /// label → node keys
    label_index: RwLock<HashMap<Label, HashSet<NodeId>>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of relationships.
    pub fn relationship_count(&self) -> u64 {
        // Each relationship is indexed twice, once per direction.
        let adj = self.inner.adjacency.read();
        adj.iter()
            .filter(|((_, _, dir), _)| *dir == Direction::Outgoing)
            .map(|(_, targets)| targets.len() as u64)
            .sum()
    }

    fn contains(&self, label: Label, id: &NodeId) -> bool {
        self.inner.nodes.read().contains_key(&(label, id.clone()))
    }
}

// ============================================================================
// GraphStore impl
// ============================================================================

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn exists(&self, id: &NodeId, label: Label) -> Result<bool> {
        Ok(self.contains(label, id))
    }

    async fn get_node(&self, id: &NodeId, label: Label) -> Result<Option<Node>> {
        Ok(self.inner.nodes.read().get(&(label, id.clone())).cloned())
    }

    async fn neighbors(
        &self,
        id: &NodeId,
        rel: RelType,
        dir: Direction,
        filter: Option<&PropertyFilter>,
    ) -> Result<HashSet<NodeId>> {
        let keys = {
            let adj = self.inner.adjacency.read();
            match adj.get(&(id.clone(), rel, dir)) {
                Some(keys) => keys.clone(),
                None => return Ok(HashSet::new()),
            }
        };

        let Some(filter) = filter else {
            return Ok(keys);
        };

        let label = rel.neighbor_label(dir);
        let nodes = self.inner.nodes.read();
        Ok(keys
            .into_iter()
            .filter(|key| {
                nodes
                    .get(&(label, key.clone()))
                    .is_some_and(|n| filter.matches(&n.properties))
            })
            .collect())
    }

    async fn all_nodes(&self, label: Label) -> Result<Vec<NodeId>> {
        let idx = self.inner.label_index.read();
        let mut ids: Vec<NodeId> = idx.get(&label).map(|s| s.iter().cloned().collect()).unwrap_or_default();
        ids.sort();
        Ok(ids)
    }

    async fn node_count(&self, label: Label) -> Result<u64> {
        Ok(self.inner.label_index.read().get(&label).map_or(0, |s| s.len() as u64))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    async fn merge_node(&self, label: Label, id: &NodeId, props: PropertyMap) -> Result<bool> {
        let created = {
            let mut nodes = self.inner.nodes.write();
            let key = (label, id.clone());
            let created = !nodes.contains_key(&key);
            let node = nodes.entry(key).or_insert_with(|| {
                Node::new(label, id.clone())
                    .with_property(label.key_property(), id.as_str())
            });
            node.properties.extend(props);
            // The identifying property always mirrors the key.
            node.properties.insert(label.key_property().to_owned(), Value::from(id.as_str()));
            created
        };

        if created {
            self.inner.label_index.write().entry(label).or_default().insert(id.clone());
        }
        Ok(created)
    }

    async fn detach_delete_node(&self, label: Label, id: &NodeId) -> Result<bool> {
        // Held until the edges are gone so no relationship merge can slip in.
        let mut nodes = self.inner.nodes.write();
        if nodes.remove(&(label, id.clone())).is_none() {
            return Ok(false);
        }

        if let Some(ids) = self.inner.label_index.write().get_mut(&label) {
            ids.remove(id);
        }

        let mut adj = self.inner.adjacency.write();
        for rel in ALL_REL_TYPES {
            for dir in [Direction::Outgoing, Direction::Incoming] {
                if rel.start_label(dir) != label {
                    continue;
                }
                let Some(others) = adj.remove(&(id.clone(), rel, dir)) else {
                    continue;
                };
                for other in others {
                    if let Some(back) = adj.get_mut(&(other, rel, dir.reverse())) {
                        back.remove(id);
                    }
                }
            }
        }

        Ok(true)
    }

    async fn merge_relationship(&self, src: &NodeId, rel: RelType, dst: &NodeId) -> Result<bool> {
        let (src_label, dst_label) = rel.endpoints();
        // Endpoints must stay present until the edge is indexed.
        let nodes = self.inner.nodes.read();
        if !nodes.contains_key(&(src_label, src.clone())) {
            return Err(Error::NotFound(format!("{src_label} {src}")));
        }
        if !nodes.contains_key(&(dst_label, dst.clone())) {
            return Err(Error::NotFound(format!("{dst_label} {dst}")));
        }

        let mut adj = self.inner.adjacency.write();
        let created = adj
            .entry((src.clone(), rel, Direction::Outgoing))
            .or_default()
            .insert(dst.clone());
        adj.entry((dst.clone(), rel, Direction::Incoming))
            .or_default()
            .insert(src.clone());
        Ok(created)
    }

    async fn delete_relationship(&self, src: &NodeId, rel: RelType, dst: &NodeId) -> Result<bool> {
        let mut adj = self.inner.adjacency.write();
        let removed = adj
            .get_mut(&(src.clone(), rel, Direction::Outgoing))
            .is_some_and(|targets| targets.remove(dst));
        if let Some(sources) = adj.get_mut(&(dst.clone(), rel, Direction::Incoming)) {
            sources.remove(src);
        }
        Ok(removed)
    }
}

// ============================================================================
// Tests
// ============================================================================
