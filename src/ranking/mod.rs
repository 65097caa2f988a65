//! # Top-K Ranking
//!
//! ```text
//! candidates ──map──▶ (profile, PairFeatures) ──score──▶ keep if any shared signal
//!            ──sort──▶ score desc, id asc ──truncate──▶ k
//! ```
//!
//! Candidate extraction runs concurrently; sorting happens once all
//! candidates are in, so the result does not depend on completion order.

use std::pin::pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, warn};

use crate::features::{CandidateFeatures, FeatureExtractor};
use crate::model::{NodeId, UserProfile};
use crate::scoring::CompatibilityScorer;
use crate::storage::GraphStore;
use crate::{Error, Result};

// ============================================================================
// Cancellation
// ============================================================================

/// Caller-held switch that abandons a running ranking.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Result entry
// ============================================================================

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub user: UserProfile,
    pub shared_genres: Vec<String>,
    pub shared_songs: u64,
    pub shared_playlists: u64,
    pub personal_playlist_matches: u64,
    pub compatibility_score: f64,
}

impl RankedMatch {
    fn from_candidate(candidate: CandidateFeatures, compatibility_score: f64) -> Self {
        let CandidateFeatures { user, features } = candidate;
        Self {
            user,
            shared_genres: features.shared_genres,
            shared_songs: features.shared_liked_songs_count,
            shared_playlists: features.shared_public_followed_playlists_count,
            personal_playlist_matches: features.shared_personal_playlist_songs_count,
            compatibility_score,
        }
    }
}

// ============================================================================
// Ranker
// ============================================================================

/// Ranks every other user against a target.
pub struct TopKRanker<'a, S: GraphStore> {
    extractor: FeatureExtractor<'a, S>,
    scorer: &'a CompatibilityScorer,
    concurrency: usize,
}

impl<'a, S: GraphStore> TopKRanker<'a, S> {
    pub fn new(extractor: FeatureExtractor<'a, S>, scorer: &'a CompatibilityScorer, concurrency: usize) -> Self {
        Self {
            extractor,
            scorer,
            concurrency: concurrency.max(1),
        }
    }

    /// The `k` best matches for `target`, best first.
    ///
    /// Candidates sharing nothing with the target are left out entirely.
    /// Candidates deleted while the ranking runs are dropped; any other
    /// read failure aborts the call.
    pub async fn rank(&self, target: &NodeId, k: usize, cancel: &CancelFlag) -> Result<Vec<RankedMatch>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if k == 0 {
            self.extractor.user_node(target).await?;
            return Ok(Vec::new());
        }

        let candidates = self.extractor.features_for_candidates(target, self.concurrency).await?;
        let mut candidates = pin!(candidates);
        let mut matches = Vec::new();
        let mut seen = 0usize;

        while let Some(item) = candidates.next().await {
            if cancel.is_cancelled() {
                debug!(%target, seen, "ranking cancelled");
                return Err(Error::Cancelled);
            }
            seen += 1;

            let candidate = match item {
                Ok(candidate) => candidate,
                Err(Error::NotFound(what)) => {
                    warn!(%target, %what, "candidate vanished during ranking, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if !candidate.features.has_shared_signal() {
                continue;
            }
            let score = self.scorer.score(&candidate.features);
            matches.push(RankedMatch::from_candidate(candidate, score));
        }

        debug!(%target, seen, kept = matches.len(), k, "ranked candidates");
        Ok(select_top_k(matches, k))
    }
}

/// Sort by score descending, then user id ascending, and keep `k`.
pub fn select_top_k(mut matches: Vec<RankedMatch>, k: usize) -> Vec<RankedMatch> {
    matches.sort_by(|a, b| {
        b.compatibility_score
            .total_cmp(&a.compatibility_score)
            .then_with(|| a.user.id.cmp(&b.user.id))
    });
    matches.truncate(k);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, score: f64) -> RankedMatch {
        RankedMatch {
            user: UserProfile {
                id: NodeId::new(id),
                name: None,
                gender: None,
                age: None,
                orientation: None,
            },
            shared_genres: Vec::new(),
            shared_songs: 0,
            shared_playlists: 0,
            personal_playlist_matches: 0,
            compatibility_score: score,
        }
    }

    fn ids(matches: &[RankedMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.user.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_score_then_id() {
        let ranked = select_top_k(
            vec![entry("d", 10.0), entry("b", 42.5), entry("c", 10.0), entry("a", 10.0)],
            10,
        );
        assert_eq!(ids(&ranked), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_truncates_to_k() {
        let ranked = select_top_k(vec![entry("a", 1.0), entry("b", 2.0), entry("c", 3.0)], 2);
        assert_eq!(ids(&ranked), vec!["c", "b"]);
        assert!(select_top_k(vec![entry("a", 1.0)], 0).is_empty());
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let handle = flag.clone();
        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
    }
}
