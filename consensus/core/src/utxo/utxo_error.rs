use thiserror::Error;

use crate::tx::TransactionOutpoint;

#[derive(Error, Debug, Clone)]
pub enum UtxoAlgebraError {
    #[error("outpoint {0} both in self.remove and in other.remove")]
    DuplicateRemovePoint(TransactionOutpoint),

    #[error("outpoint {0} both in self.add and in other.add")]
    DuplicateAddPoint(TransactionOutpoint),

    #[error("cannot remove outpoint {0} twice")]
    DoubleRemoveCall(TransactionOutpoint),

    #[error("cannot add outpoint {0} twice")]
    DoubleAddCall(TransactionOutpoint),

    #[error("outpoint {0} {1}")]
    DiffIntersectionPoint(TransactionOutpoint, &'static str),

    #[error("{0}")]
    General(&'static str),
}

/// Errors are equal if they are of the same kind and refer to the same outpoint. Free-text
/// reasons are ignored
impl PartialEq for UtxoAlgebraError {
    fn eq(&self, other: &Self) -> bool {
        use UtxoAlgebraError::*;
        match (self, other) {
            (DuplicateRemovePoint(a), DuplicateRemovePoint(b))
            | (DuplicateAddPoint(a), DuplicateAddPoint(b))
            | (DoubleRemoveCall(a), DoubleRemoveCall(b))
            | (DoubleAddCall(a), DoubleAddCall(b))
            | (DiffIntersectionPoint(a, _), DiffIntersectionPoint(b, _)) => a == b,
            (General(_), General(_)) => true,
            _ => false,
        }
    }
}

impl Eq for UtxoAlgebraError {}

pub type UtxoResult<T> = std::result::Result<T, UtxoAlgebraError>;
