//! # tunematch — Music-Taste Compatibility over a Property Graph
//!
//! Scores how compatible two users of a music-social graph are, and ranks
//! the users most compatible with a given one.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `GraphStore` is the contract between scoring and storage
//! 2. **Read-only core**: scoring never mutates the graph and caches nothing
//! 3. **Scorer owns nothing**: `PairFeatures -> score` is a pure function
//! 4. **Explicit pipeline**: ranking is extract → score → filter → sort → truncate
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tunematch::{Compatibility, Label, NodeId, PropertyMap, RelType, GraphStore};
//!
//! # async fn example() -> tunematch::Result<()> {
//! let compat = Compatibility::open_memory();
//! let store = compat.store();
//!
//! for user in ["ada", "bob"] {
//!     store.merge_node(Label::User, &NodeId::new(user), PropertyMap::new()).await?;
//! }
//! store.merge_node(Label::Genre, &NodeId::new("jazz"), PropertyMap::new()).await?;
//! store.merge_relationship(&NodeId::new("ada"), RelType::LikesGenre, &NodeId::new("jazz")).await?;
//! store.merge_relationship(&NodeId::new("bob"), RelType::LikesGenre, &NodeId::new("jazz")).await?;
//!
//! let pair = compat.compute_pair_compatibility(&NodeId::new("ada"), &NodeId::new("bob")).await?;
//! assert_eq!(pair.compatibility_score, 25.0);
//!
//! let top = compat.compute_top_k(&NodeId::new("ada"), None).await?;
//! assert_eq!(top.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Graph reads run under `tokio::time::timeout`, so calls must be made from
//! within a Tokio runtime with the time driver enabled.

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod storage;
pub mod features;
pub mod scoring;
pub mod ranking;
pub mod config;
pub mod ingest;

use serde::Serialize;
use tracing::instrument;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{
    Node, NodeId, Label, RelType, Direction, Value,
    PropertyMap, PropertyFilter, UserProfile,
};
pub use storage::{GraphStore, MemoryGraph};
pub use features::{FeatureExtractor, PairFeatures, UserFeatures, CandidateFeatures};
pub use scoring::{CompatibilityScorer, ScoringConfig, ScoringScheme, ScoreBreakdown};
pub use ranking::{TopKRanker, RankedMatch, CancelFlag};
pub use config::{CompatConfig, RankingConfig, ReadPolicy};
pub use ingest::{UserEvent, IngestOutcome};

// ============================================================================
// Public results
// ============================================================================

/// Compatibility between two users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairCompatibility {
    pub user1: UserProfile,
    pub user2: UserProfile,
    pub shared_genres: Vec<String>,
    pub shared_songs: u64,
    pub shared_playlists: u64,
    pub personal_playlist_common_songs: u64,
    pub playlist_similarity: f64,
    pub compatibility_score: f64,
}

// ============================================================================
// Top-level handle
// ============================================================================

/// The primary entry point. Wraps a graph store and the scoring
/// configuration, and exposes the two compatibility operations.
pub struct Compatibility<S: GraphStore> {
    store: S,
    config: CompatConfig,
    scorer: CompatibilityScorer,
}

impl<S: GraphStore> Compatibility<S> {
    /// Create a handle over `store` with the default configuration.
    pub fn with_store(store: S) -> Self {
        Self::with_config(store, CompatConfig::default())
    }

    pub fn with_config(store: S, config: CompatConfig) -> Self {
        let config = config.normalize();
        let scorer = CompatibilityScorer::new(config.scoring.clone());
        Self { store, config, scorer }
    }

    /// Compatibility of two users. `NotFound` if either is absent.
    #[instrument(skip_all, fields(user1 = %user1, user2 = %user2))]
    pub async fn compute_pair_compatibility(
        &self,
        user1: &NodeId,
        user2: &NodeId,
    ) -> Result<PairCompatibility> {
        let extractor = self.extractor();
        let (features, node1, node2) = futures::try_join!(
            extractor.features_for_pair(user1, user2),
            extractor.user_node(user1),
            extractor.user_node(user2),
        )?;

        let compatibility_score = self.scorer.score(&features);
        let playlist_similarity = features.playlist_similarity();

        Ok(PairCompatibility {
            user1: UserProfile::from_node(&node1),
            user2: UserProfile::from_node(&node2),
            shared_genres: features.shared_genres,
            shared_songs: features.shared_liked_songs_count,
            shared_playlists: features.shared_public_followed_playlists_count,
            personal_playlist_common_songs: features.shared_personal_playlist_songs_count,
            playlist_similarity,
            compatibility_score,
        })
    }

    /// The `k` users most compatible with `user`, best first.
    ///
    /// `k` defaults to `ranking.default_k`. Negative `k`, or `k` above
    /// `ranking.max_k`, is `InvalidArgument`.
    pub async fn compute_top_k(&self, user: &NodeId, k: Option<i64>) -> Result<Vec<RankedMatch>> {
        self.compute_top_k_cancellable(user, k, &CancelFlag::new()).await
    }

    /// `compute_top_k`, abandoned with `Error::Cancelled` once `cancel` is set.
    #[instrument(skip_all, fields(k = ?k, user = %user))]
    pub async fn compute_top_k_cancellable(
        &self,
        user: &NodeId,
        k: Option<i64>,
        cancel: &CancelFlag,
    ) -> Result<Vec<RankedMatch>> {
        let k = self.validate_k(k)?;
        let ranker = TopKRanker::new(self.extractor(), &self.scorer, self.config.ranking.concurrency);
        ranker.rank(user, k, cancel).await
    }

    /// Apply one external user event to the store.
    pub async fn apply_event(&self, event: UserEvent) -> Result<IngestOutcome> {
        ingest::apply_event(&self.store, event).await
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CompatConfig {
        &self.config
    }

    pub fn extractor(&self) -> FeatureExtractor<'_, S> {
        FeatureExtractor::new(&self.store, &self.config.reads)
    }

    fn validate_k(&self, k: Option<i64>) -> Result<usize> {
        let ranking = &self.config.ranking;
        let Some(k) = k else {
            return Ok(ranking.default_k);
        };
        let k = usize::try_from(k)
            .map_err(|_| Error::InvalidArgument(format!("k must not be negative, got {k}")))?;
        if k > ranking.max_k {
            return Err(Error::InvalidArgument(format!(
                "k must be at most {}, got {k}",
                ranking.max_k
            )));
        }
        Ok(k)
    }
}

/// In-memory store for testing and embedding.
impl Compatibility<MemoryGraph> {
    pub fn open_memory() -> Self {
        Self::with_store(MemoryGraph::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Graph unavailable: {0}")]
    GraphUnavailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Malformed event: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_k() {
        let compat = Compatibility::open_memory();
        assert_eq!(compat.validate_k(None).unwrap(), 5);
        assert_eq!(compat.validate_k(Some(0)).unwrap(), 0);
        assert_eq!(compat.validate_k(Some(1000)).unwrap(), 1000);
        assert!(matches!(compat.validate_k(Some(-1)), Err(Error::InvalidArgument(_))));
        assert!(matches!(compat.validate_k(Some(1001)), Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_pair_result_reports_extracted_features() {
        let compat = Compatibility::open_memory();
        let db = compat.store();
        for (label, key) in [(Label::User, "a"), (Label::User, "b"), (Label::Song, "s1"), (Label::Genre, "folk")] {
            db.merge_node(label, &NodeId::new(key), PropertyMap::new()).await.unwrap();
        }
        for user in ["a", "b"] {
            db.merge_relationship(&NodeId::new(user), RelType::Liked, &NodeId::new("s1")).await.unwrap();
            db.merge_relationship(&NodeId::new(user), RelType::LikesGenre, &NodeId::new("folk")).await.unwrap();
        }

        let (a, b) = (NodeId::new("a"), NodeId::new("b"));
        let features = compat.extractor().features_for_pair(&a, &b).await.unwrap();
        let pair = compat.compute_pair_compatibility(&a, &b).await.unwrap();

        assert_eq!(pair.shared_genres, features.shared_genres);
        assert_eq!(pair.shared_songs, features.shared_liked_songs_count);
        assert_eq!(pair.compatibility_score, compat.scorer.score(&features));
        assert_eq!(pair.compatibility_score, 26.75);
        assert_eq!(pair.user2.id, b);
    }
}
