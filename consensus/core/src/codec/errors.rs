use crate::tx::TransactionOutpoint;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of data: needed {needed} bytes but only {remaining} remain")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("non-canonical varint: value {value} encoded with prefix {prefix:#04x}")]
    NonCanonicalVarInt { prefix: u8, value: u64 },

    #[error("byte array of length {0} exceeds the maximum of {1}")]
    VarBytesTooLong(u64, u64),

    #[error("collection of length {0} exceeds the maximum of {1}")]
    CollectionTooLong(u64, u64),

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("script public key version {0} cannot be stored in a UTXO entry record")]
    UnsupportedScriptVersion(u16),

    #[error("outpoint key must be {expected} bytes long, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("collection key {0} is not strictly greater than the key preceding it")]
    UnorderedCollectionKey(TransactionOutpoint),

    #[error("{0} trailing bytes after the end of the record")]
    TrailingBytes(usize),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;
