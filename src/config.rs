//! Runtime configuration.
//!
//! Every tunable constant of the scorer, the ranker and the graph read
//! policy lives here so that deployments can reproduce either weighting
//! scheme without a rebuild.
//!
//! ```toml
//! [scoring]
//! scheme = "capped"
//!
//! [scoring.capped]
//! song_cap = 20
//! song_points = 35.0
//!
//! [ranking]
//! default_k = 5
//! concurrency = 8
//!
//! [reads]
//! timeout_ms = 2000
//! max_retries = 2
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringConfig;
use crate::Result;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MAX_TOP_K: usize = 1000;
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CompatConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub reads: ReadPolicy,
}

impl CompatConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let parsed: CompatConfig = toml::from_str(raw)?;
        Ok(parsed.normalize())
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Clamp values that would make the engine misbehave.
    pub fn normalize(mut self) -> Self {
        self.ranking.concurrency = self.ranking.concurrency.max(1);
        self.ranking.max_k = self.ranking.max_k.max(self.ranking.default_k);
        self.reads.backoff_max_ms = self.reads.backoff_max_ms.max(self.reads.backoff_base_ms);
        self
    }
}

/// Top-K ranking limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Used when the caller does not pass a limit.
    #[serde(default = "default_top_k")]
    pub default_k: usize,
    /// Larger limits are rejected as `InvalidArgument`.
    #[serde(default = "default_max_top_k")]
    pub max_k: usize,
    /// Candidates whose features are read concurrently.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_TOP_K,
            max_k: DEFAULT_MAX_TOP_K,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Timeout and retry policy for individual graph reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPolicy {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after the first attempt. Only `GraphUnavailable` is retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl ReadPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Exponential backoff before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self.backoff_base_ms.saturating_mul(factor).min(self.backoff_max_ms);
        Duration::from_millis(ms)
    }
}

impl Default for ReadPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

fn default_top_k() -> usize { DEFAULT_TOP_K }
fn default_max_top_k() -> usize { DEFAULT_MAX_TOP_K }
fn default_concurrency() -> usize { DEFAULT_CONCURRENCY }
fn default_timeout_ms() -> u64 { 2000 }
fn default_max_retries() -> u32 { 2 }
fn default_backoff_base_ms() -> u64 { 50 }
fn default_backoff_max_ms() -> u64 { 1000 }
