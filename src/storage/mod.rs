//! # Graph Store Trait
//!
//! The contract between the scoring core and whatever holds the graph.
//! The core only ever calls the read side; the write side exists for
//! ingestion and for seeding fixtures.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryGraph` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use hashbrown::HashSet;

use crate::model::*;
use crate::Result;

pub use memory::MemoryGraph;

// ============================================================================
// GraphStore Trait
// ============================================================================

/// The graph query capability consumed by the scoring core.
///
/// Reads use set semantics: a relationship between the same pair of nodes
/// is reported once no matter how the store holds it. Stores report
/// transient failures as `Error::GraphUnavailable` so callers can retry.
#[async_trait]
pub trait GraphStore: Send + Sync + 'static {
    // ========================================================================
    // Reads
    // ========================================================================

    /// Does a node with this key exist under `label`?
    async fn exists(&self, id: &NodeId, label: Label) -> Result<bool>;

    /// Get a node by key. Returns None if not found.
    async fn get_node(&self, id: &NodeId, label: Label) -> Result<Option<Node>>;

    /// Keys of the nodes one `rel` hop away from `id` in direction `dir`,
    /// optionally restricted to neighbors whose properties match `filter`.
    ///
    /// The start node's label is implied by `rel` and `dir`. A start node
    /// that does not exist has no neighbors.
    async fn neighbors(
        &self,
        id: &NodeId,
        rel: RelType,
        dir: Direction,
        filter: Option<&PropertyFilter>,
    ) -> Result<HashSet<NodeId>>;

    /// Keys of all nodes with the given label.
    async fn all_nodes(&self, label: Label) -> Result<Vec<NodeId>>;

    /// Number of nodes with the given label.
    ///
    /// Default: counts `all_nodes`.
    async fn node_count(&self, label: Label) -> Result<u64> {
        Ok(self.all_nodes(label).await?.len() as u64)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create the node if missing, then overwrite the given properties.
    /// Neo4j: `MERGE (n:Label {key: $id}) SET n += $props`
    ///
    /// Returns true if the node was created.
    async fn merge_node(&self, label: Label, id: &NodeId, props: PropertyMap) -> Result<bool>;

    /// Delete a node and all its relationships. Returns true if it existed.
    async fn detach_delete_node(&self, label: Label, id: &NodeId) -> Result<bool>;

    /// Create the relationship if it does not exist yet.
    /// Fails with `NotFound` if either endpoint is missing.
    ///
    /// Returns true if the relationship was created.
    async fn merge_relationship(&self, src: &NodeId, rel: RelType, dst: &NodeId) -> Result<bool>;

    /// Delete a relationship. Returns true if it existed.
    async fn delete_relationship(&self, src: &NodeId, rel: RelType, dst: &NodeId) -> Result<bool>;
}
