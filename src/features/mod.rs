//! # Graph Feature Extraction
//!
//! Turns users into the relationship sets the scorer needs, using nothing
//! but one-hop `GraphStore::neighbors` reads:
//!
//! ```text
//! genres             (u)-[:LIKES_GENRE]->(g)
//! liked songs        (u)-[:LIKED]->(s)
//! followed public    (u)-[:FOLLOWS]->(p {public: true})
//! personal songs     (u)-[:OWNS]->(p)-[:CONTAINS]->(s)   distinct s
//! ```
//!
//! Pair features are plain set intersections of two `UserFeatures`.
//! Nothing is cached: every call reads the current graph.

mod read;

use std::sync::Arc;

use futures::future::try_join_all;
use futures::stream::{self, Stream, StreamExt};
use hashbrown::HashSet;
use serde::Serialize;

use crate::config::ReadPolicy;
use crate::model::*;
use crate::scoring::playlist_similarity;
use crate::storage::GraphStore;
use crate::{Error, Result};

pub(crate) use read::guarded;

// ============================================================================
// Feature types
// ============================================================================

/// Everything about one user that pair scoring looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFeatures {
    pub id: NodeId,
    pub genres: HashSet<NodeId>,
    pub liked_songs: HashSet<NodeId>,
    pub followed_public_playlists: HashSet<NodeId>,
    /// Distinct songs across every playlist the user owns.
    pub personal_playlist_songs: HashSet<NodeId>,
}

impl UserFeatures {
    /// True when the user has no scoring-relevant relationship at all.
    pub fn is_empty(&self) -> bool {
        self.genres.is_empty()
            && self.liked_songs.is_empty()
            && self.followed_public_playlists.is_empty()
            && self.personal_playlist_songs.is_empty()
    }
}

/// Overlap between two users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PairFeatures {
    /// Sorted by name.
    pub shared_genres: Vec<String>,
    pub shared_liked_songs_count: u64,
    pub shared_public_followed_playlists_count: u64,
    /// Distinct songs found in a playlist owned by each user.
    pub shared_personal_playlist_songs_count: u64,
    pub u1_personal_playlist_song_count: u64,
    pub u2_personal_playlist_song_count: u64,
    /// Same value as `shared_personal_playlist_songs_count`; this one is
    /// the Jaccard numerator.
    pub personal_playlist_song_intersection_count: u64,
}

impl PairFeatures {
    pub fn between(u1: &UserFeatures, u2: &UserFeatures) -> Self {
        let mut shared_genres: Vec<String> = u1
            .genres
            .intersection(&u2.genres)
            .map(|g| g.0.clone())
            .collect();
        shared_genres.sort();

        let personal = u1
            .personal_playlist_songs
            .intersection(&u2.personal_playlist_songs)
            .count() as u64;

        Self {
            shared_genres,
            shared_liked_songs_count: u1.liked_songs.intersection(&u2.liked_songs).count() as u64,
            shared_public_followed_playlists_count: u1
                .followed_public_playlists
                .intersection(&u2.followed_public_playlists)
                .count() as u64,
            shared_personal_playlist_songs_count: personal,
            u1_personal_playlist_song_count: u1.personal_playlist_songs.len() as u64,
            u2_personal_playlist_song_count: u2.personal_playlist_songs.len() as u64,
            personal_playlist_song_intersection_count: personal,
        }
    }

    /// Any of the four base signals non-zero.
    pub fn has_shared_signal(&self) -> bool {
        !self.shared_genres.is_empty()
            || self.shared_liked_songs_count > 0
            || self.shared_public_followed_playlists_count > 0
            || self.shared_personal_playlist_songs_count > 0
    }

    pub fn playlist_similarity(&self) -> f64 {
        playlist_similarity(
            self.u1_personal_playlist_song_count,
            self.u2_personal_playlist_song_count,
            self.personal_playlist_song_intersection_count,
        )
    }

    /// The same overlap seen from the other user.
    pub fn swapped(&self) -> Self {
        Self {
            u1_personal_playlist_song_count: self.u2_personal_playlist_song_count,
            u2_personal_playlist_song_count: self.u1_personal_playlist_song_count,
            ..self.clone()
        }
    }
}

/// One entry of the candidate sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFeatures {
    pub user: UserProfile,
    pub features: PairFeatures,
}

// ============================================================================
// Extractor
// ============================================================================

/// Read-only feature extraction over a `GraphStore`.
pub struct FeatureExtractor<'a, S: GraphStore> {
    store: &'a S,
    policy: &'a ReadPolicy,
}

impl<S: GraphStore> Clone for FeatureExtractor<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: GraphStore> Copy for FeatureExtractor<'_, S> {}

impl<'a, S: GraphStore> FeatureExtractor<'a, S> {
    pub fn new(store: &'a S, policy: &'a ReadPolicy) -> Self {
        Self { store, policy }
    }

    /// The user's node. `NotFound` if absent.
    pub async fn user_node(&self, id: &NodeId) -> Result<Node> {
        guarded(self.policy, "User", || self.store.get_node(id, Label::User))
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {id}")))
    }

    /// Features of a single user. `NotFound` if absent.
    pub async fn user_features(&self, id: &NodeId) -> Result<UserFeatures> {
        let exists = guarded(self.policy, "User", || self.store.exists(id, Label::User)).await?;
        if !exists {
            return Err(Error::NotFound(format!("User {id}")));
        }
        self.collect(id).await
    }

    /// Profile and features in one go. `NotFound` if absent.
    pub async fn profile_and_features(&self, id: &NodeId) -> Result<(UserProfile, UserFeatures)> {
        let node = self.user_node(id).await?;
        let features = self.collect(id).await?;
        Ok((UserProfile::from_node(&node), features))
    }

    /// Overlap between two users. `NotFound` if either is absent.
    pub async fn features_for_pair(&self, u1: &NodeId, u2: &NodeId) -> Result<PairFeatures> {
        let (a, b) = futures::try_join!(self.user_features(u1), self.user_features(u2))?;
        Ok(PairFeatures::between(&a, &b))
    }

    /// Lazy sequence of `(candidate, overlap with target)` for every user
    /// except `target`, evaluated `concurrency` candidates at a time.
    ///
    /// The target is read once, up front; `NotFound` if it is absent. A
    /// candidate deleted after enumeration yields `Err(NotFound)` for that
    /// item only. Order is arbitrary. The sequence reflects the graph as it
    /// was enumerated; request a new one after writes.
    pub async fn features_for_candidates(
        &self,
        target: &NodeId,
        concurrency: usize,
    ) -> Result<impl Stream<Item = Result<CandidateFeatures>> + use<'a, S>> {
        let target_features = Arc::new(self.user_features(target).await?);
        let candidates: Vec<NodeId> = guarded(self.policy, "User", || self.store.all_nodes(Label::User))
            .await?
            .into_iter()
            .filter(|id| id != target)
            .collect();

        let this = *self;
        Ok(stream::iter(candidates)
            .map(move |id| {
                let target_features = Arc::clone(&target_features);
                async move {
                    let (user, features) = this.profile_and_features(&id).await?;
                    Ok::<_, Error>(CandidateFeatures {
                        user,
                        features: PairFeatures::between(&target_features, &features),
                    })
                }
            })
            .buffer_unordered(concurrency.max(1)))
    }

    /// Read all relationship sets of an existing user.
    async fn collect(&self, id: &NodeId) -> Result<UserFeatures> {
        let public = PropertyFilter::eq("public", true);
        let (genres, liked_songs, followed_public_playlists, owned) = futures::try_join!(
            self.neighbors(id, RelType::LikesGenre, None),
            self.neighbors(id, RelType::Liked, None),
            self.neighbors(id, RelType::Follows, Some(&public)),
            self.neighbors(id, RelType::Owns, None),
        )?;

        let contents = try_join_all(
            owned.iter().map(|playlist| self.neighbors(playlist, RelType::Contains, None)),
        )
        .await?;
        let personal_playlist_songs: HashSet<NodeId> = contents.into_iter().flatten().collect();

        Ok(UserFeatures {
            id: id.clone(),
            genres,
            liked_songs,
            followed_public_playlists,
            personal_playlist_songs,
        })
    }

    async fn neighbors(
        &self,
        id: &NodeId,
        rel: RelType,
        filter: Option<&PropertyFilter>,
    ) -> Result<HashSet<NodeId>> {
        guarded(self.policy, rel.as_str(), || {
            self.store.neighbors(id, rel, Direction::Outgoing, filter)
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
