pub use super::constants::consensus::*;
use super::constants::perf::DEFAULT_UTXO_CACHE_MAX_BYTES;
use serde::{Deserialize, Serialize};

/// Eviction strategy applied once the UTXO set cache crosses its byte bound
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtxoCacheEviction {
    /// Wipe the whole cache
    #[default]
    Clear,
    /// Drop random entries until the cache fits again
    Random,
}

/// UTXO engine parameters. Missing fields deserialize to their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Blue score window within which diff store records are kept loaded in memory
    pub max_blue_score_difference_to_keep_loaded: u64,

    /// Byte bound of the UTXO set cache, as estimated per entry
    pub utxo_cache_max_bytes: usize,

    pub utxo_cache_eviction: UtxoCacheEviction,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            max_blue_score_difference_to_keep_loaded: MAX_BLUE_SCORE_DIFFERENCE_TO_KEEP_LOADED,
            utxo_cache_max_bytes: DEFAULT_UTXO_CACHE_MAX_BYTES,
            utxo_cache_eviction: UtxoCacheEviction::Clear,
        }
    }
}

impl Params {
    /// Returns whether a record at `blue_score` is within the keep-loaded window of `virtual_blue_score`
    pub fn is_within_loaded_window(&self, blue_score: u64, virtual_blue_score: u64) -> bool {
        virtual_blue_score.saturating_sub(blue_score) <= self.max_blue_score_difference_to_keep_loaded
    }
}
