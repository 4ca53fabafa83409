use super::utxo_diff::UtxoDiff;
use utxodag_hashes::Hash;

/// The per-block diff store record: the diff leading from the block's UTXO state
/// towards the state of its diff child, if one was assigned
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UtxoDiffData {
    pub diff: UtxoDiff,
    pub diff_child: Option<Hash>,
}

impl UtxoDiffData {
    pub fn new(diff: UtxoDiff, diff_child: Option<Hash>) -> Self {
        Self { diff, diff_child }
    }
}
