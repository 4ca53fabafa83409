pub mod diff_set;
pub mod diff_store;
pub mod full_set;
pub mod set;

use utxodag_consensus_core::config::params::{Params, UtxoCacheEviction};
use utxodag_database::prelude::{CachePolicy, EvictionPolicy};

/// The UTXO set cache policy implied by the engine params
pub fn utxo_cache_policy(params: &Params) -> CachePolicy {
    let eviction = match params.utxo_cache_eviction {
        UtxoCacheEviction::Clear => EvictionPolicy::Clear,
        UtxoCacheEviction::Random => EvictionPolicy::Random,
    };
    CachePolicy::Tracked { max_size: params.utxo_cache_max_bytes, eviction }
}
