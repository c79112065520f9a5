use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const MAX_RESULT_DOCUMENT_COUNT: usize = 5;
pub const RELEVANCE_EPSILON: f64 = 1e-6;

/// Tunables for ranking and sharding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on the number of documents a search returns.
    pub max_results: usize,
    /// Relevance values closer than this are ordered by rating instead.
    pub relevance_epsilon: f64,
    /// Number of lock shards; `None` picks one from the rayon pool size.
    pub shard_count: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: MAX_RESULT_DOCUMENT_COUNT,
            relevance_epsilon: RELEVANCE_EPSILON,
            shard_count: None,
        }
    }
}

impl SearchConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SearchConfig = serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut buf = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut buf))
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&buf)
    }

    pub fn validate(&self) -> Result<()> {
        if self.shard_count == Some(0) {
            return Err(Error::Config("shard_count must be positive".into()));
        }
        if !self.relevance_epsilon.is_finite() || self.relevance_epsilon < 0.0 {
            return Err(Error::Config(format!("relevance_epsilon {} is out of range", self.relevance_epsilon)));
        }
        Ok(())
    }

    /// Resolved shard count: the configured value, or four shards per rayon worker (at least 4).
    pub fn shards(&self) -> usize {
        self.shard_count
            .unwrap_or_else(|| std::cmp::max(4, rayon::current_num_threads() * 4))
    }
}
