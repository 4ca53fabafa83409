use super::HashWriter;
use crate::{
    codec::tx::{TxEncoding, write_transaction},
    tx::{Transaction, TransactionId},
};
use utxodag_hashes::Hash;

/// Returns the transaction hash, which commits to signature scripts. Note that this is different than the transaction ID.
pub fn hash(tx: &Transaction) -> Hash {
    let mut hasher = utxodag_hashes::TransactionHash::new();
    write_transaction(&mut HashWriter::new(&mut hasher), tx, TxEncoding::Full);
    hasher.finalize()
}

/// Not intended for direct use by clients. Instead use `tx.id()`
pub fn id(tx: &Transaction) -> TransactionId {
    // Encode the transaction, replace signature scripts with empty arrays and hash the result
    let mut hasher = utxodag_hashes::TransactionID::new();
    write_transaction(&mut HashWriter::new(&mut hasher), tx, TxEncoding::ExcludeSignatureScript);
    hasher.finalize()
}
