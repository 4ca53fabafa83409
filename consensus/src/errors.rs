use thiserror::Error;
use utxodag_consensus_core::{codec::CodecError, tx::TransactionId, tx::TransactionOutpoint, utxo::utxo_error::UtxoAlgebraError};
use utxodag_database::prelude::StoreError;

#[derive(Error, Debug)]
pub enum UtxoSetError {
    #[error(transparent)]
    Algebra(#[from] UtxoAlgebraError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("cannot diff_from two full UTXO sets")]
    FullSetDiffFrom,

    #[error("can diff_from only a diff UTXO set of which this full UTXO set is the base")]
    NotBaseOfOther,

    #[error("cannot diff_from a diff UTXO set with a full UTXO set")]
    DiffSetDiffFromFullSet,

    #[error("cannot diff_from a diff UTXO set with a different base")]
    DifferentBase,

    #[error("cannot remove outpoint {0} because it does not exist in the base UTXO set")]
    MissingBaseOutpoint(TransactionOutpoint),

    #[error("transaction {0} is not valid with the current UTXO set")]
    TransactionNotAccepted(TransactionId),
}

pub type UtxoSetResult<T> = std::result::Result<T, UtxoSetError>;
