pub mod blue_scores;
pub mod utxo_diffs;
pub mod utxo_set;

pub use utxodag_database;
pub use utxodag_database::prelude::DB;

use utxodag_consensus_core::codec::CodecError;
use utxodag_database::prelude::StoreError;

/// Maps a record (de)serialization failure into a store error
pub(crate) fn codec_to_store_error(err: CodecError) -> StoreError {
    StoreError::CodecError(err.to_string())
}
