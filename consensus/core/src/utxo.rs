pub mod utxo_collection;
pub mod utxo_diff;
pub mod utxo_diff_data;
pub mod utxo_error;
