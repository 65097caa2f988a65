//! # Compatibility Scorer
//!
//! Pure `PairFeatures -> score` in `[0, 100]`, rounded to two decimals.
//!
//! Two weighting schemes are supported:
//!
//! | Scheme | Shape |
//! |--------|-------|
//! | `Capped` (default) | fixed point ceilings per signal plus a Jaccard term |
//! | `Proportional` | weighted share of the total common signal count |
//!
//! Capped scheme, with the default constants:
//!
//! ```text
//! genre      25 if any shared genre
//! songs      min(n, 20) * 35/20
//! playlists  min(n, 10) * 15/10
//! personal   min(n, 50) * 20/50
//! similarity |A ∩ B| / |A ∪ B| * 5
//! ```

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::PairFeatures;

/// Upper bound of every score.
pub const MAX_SCORE: f64 = 100.0;

// ============================================================================
// Configuration
// ============================================================================

/// Which weighting formula to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoringScheme {
    #[default]
    Capped,
    Proportional,
}

/// Scorer configuration. Both weight tables are always present; `scheme`
/// picks the one in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoringConfig {
    #[serde(default)]
    pub scheme: ScoringScheme,
    #[serde(default)]
    pub capped: CappedWeights,
    #[serde(default)]
    pub proportional: ProportionalWeights,
}

/// Point ceilings and saturation caps. A term reaches its full points
/// once its count reaches the cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CappedWeights {
    pub genre_points: f64,
    pub song_points: f64,
    pub song_cap: u64,
    pub public_playlist_points: f64,
    pub public_playlist_cap: u64,
    pub personal_points: f64,
    pub personal_cap: u64,
    pub similarity_points: f64,
}

impl Default for CappedWeights {
    fn default() -> Self {
        Self {
            genre_points: 25.0,
            song_points: 35.0,
            song_cap: 20,
            public_playlist_points: 15.0,
            public_playlist_cap: 10,
            personal_points: 20.0,
            personal_cap: 50,
            similarity_points: 5.0,
        }
    }
}

/// Per-signal weights of the proportional scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProportionalWeights {
    pub genres: f64,
    pub songs: f64,
    pub public_playlists: f64,
    pub personal: f64,
}

impl Default for ProportionalWeights {
    fn default() -> Self {
        Self {
            genres: 0.35,
            songs: 0.30,
            public_playlists: 0.20,
            personal: 0.15,
        }
    }
}

// ============================================================================
// Breakdown
// ============================================================================

/// Per-term contributions before the final cap and rounding.
///
/// Under the proportional scheme the four base terms are the weighted
/// shares and `similarity` is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    pub genres: f64,
    pub songs: f64,
    pub public_playlists: f64,
    pub personal: f64,
    pub similarity: f64,
    /// Combined value the final score is rounded from.
    pub raw: f64,
}

impl ScoreBreakdown {
    /// `round(min(raw, 100), 2)`, never negative.
    pub fn total(&self) -> f64 {
        round2(self.raw.clamp(0.0, MAX_SCORE))
    }
}

// ============================================================================
// Scorer
// ============================================================================

/// Deterministic, total scorer over well-formed `PairFeatures`.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityScorer {
    config: ScoringConfig,
}

impl CompatibilityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Final score in `[0, 100]`, two-decimal precision.
    pub fn score(&self, features: &PairFeatures) -> f64 {
        // Nothing in common scores exactly zero, whatever the weights say.
        if !features.has_shared_signal() {
            return 0.0;
        }
        let breakdown = self.breakdown(features);
        let score = breakdown.total();
        debug!(?breakdown, score, scheme = ?self.config.scheme, "scored pair");
        score
    }

    pub fn breakdown(&self, features: &PairFeatures) -> ScoreBreakdown {
        match self.config.scheme {
            ScoringScheme::Capped => capped_breakdown(&self.config.capped, features),
            ScoringScheme::Proportional => proportional_breakdown(&self.config.proportional, features),
        }
    }
}

fn capped_breakdown(w: &CappedWeights, f: &PairFeatures) -> ScoreBreakdown {
    let genres = if f.shared_genres.is_empty() { 0.0 } else { w.genre_points };
    let songs = capped_term(f.shared_liked_songs_count, w.song_cap, w.song_points);
    let public_playlists = capped_term(
        f.shared_public_followed_playlists_count,
        w.public_playlist_cap,
        w.public_playlist_points,
    );
    let personal = capped_term(f.shared_personal_playlist_songs_count, w.personal_cap, w.personal_points);
    let similarity = f.playlist_similarity() * w.similarity_points;

    ScoreBreakdown {
        genres,
        songs,
        public_playlists,
        personal,
        similarity,
        raw: genres + songs + public_playlists + personal + similarity,
    }
}

/// `min(count, cap) * points / cap`. A zero cap contributes nothing.
fn capped_term(count: u64, cap: u64, points: f64) -> f64 {
    if cap == 0 {
        return 0.0;
    }
    // Multiply before dividing so saturated terms land exactly on `points`.
    points * count.min(cap) as f64 / cap as f64
}

fn proportional_breakdown(w: &ProportionalWeights, f: &PairFeatures) -> ScoreBreakdown {
    let genres = f.shared_genres.len() as f64;
    let songs = f.shared_liked_songs_count as f64;
    let playlists = f.shared_public_followed_playlists_count as f64;
    let personal = f.shared_personal_playlist_songs_count as f64;

    let total = genres + songs + playlists + personal;
    if total == 0.0 {
        return ScoreBreakdown::default();
    }

    // Weighted sum first, then one division: `(Σ count·w) / total * 100`.
    let weighted = genres * w.genres + songs * w.songs + playlists * w.public_playlists + personal * w.personal;
    let share = |count: f64, weight: f64| count * weight / total * MAX_SCORE;
    ScoreBreakdown {
        genres: share(genres, w.genres),
        songs: share(songs, w.songs),
        public_playlists: share(playlists, w.public_playlists),
        personal: share(personal, w.personal),
        similarity: 0.0,
        raw: weighted / total * MAX_SCORE,
    }
}

/// Jaccard-style ratio `intersection / (a + b - intersection)`.
///
/// Zero when both sets are empty.
pub fn playlist_similarity(a_size: u64, b_size: u64, intersection: u64) -> f64 {
    let total = a_size + b_size;
    if total == 0 {
        return 0.0;
    }
    let union = total.saturating_sub(intersection);
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Round half away from zero to two decimals.
///
/// Rounds the shortest decimal form of `value` (what `Display` prints), so
/// `1.025` gives `1.03` even though the nearest `f64` lies just below it.
pub fn round2(value: f64) -> f64 {
    let Ok(exact) = Decimal::from_str(&value.to_string()) else {
        return (value * 100.0).round() / 100.0;
    };
    let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // Both operands are exact, so the quotient is the nearest f64 to the decimal.
    rounded.mantissa() as f64 / 10f64.powi(rounded.scale() as i32)
}

// ============================================================================
// Tests
// ============================================================================
