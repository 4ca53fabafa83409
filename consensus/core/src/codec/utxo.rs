//! Persistence formats of the UTXO engine.
//!
//! * Outpoint key: the 32 transaction id bytes followed by the output index as a
//!   4-byte **big-endian** integer, so keys of one transaction sort by index.
//! * UTXO entry: blue score (u64 LE), packed flags (u8, bit 0 = coinbase), amount
//!   (u64 LE) and the script public key as varint-prefixed bytes.
//! * UTXO collection: varint count followed by `(outpoint key, entry)` pairs in strictly
//!   ascending key order.
//! * UTXO diff: the `add` collection followed by the `remove` collection.
//! * Diff data: a `has_diff_child` boolean byte, the 32-byte child hash if set, and the diff.

use super::{CodecError, CodecResult, WireElement, WireReader, WireWrite, write_var_bytes, write_varint};
use crate::{
    config::constants::codec::{MAX_COLLECTION_LEN, MAX_SCRIPT_PUBLIC_KEY_LEN},
    tx::{ScriptPublicKey, ScriptVec, TransactionOutpoint, UtxoEntry},
    utxo::{
        utxo_collection::{UtxoCollection, UtxoCollectionExtensions},
        utxo_diff::UtxoDiff,
        utxo_diff_data::UtxoDiffData,
    },
};
use utxodag_hashes::{HASH_SIZE, Hash};

pub const OUTPOINT_KEY_SIZE: usize = HASH_SIZE + size_of::<u32>();

const COINBASE_FLAG: u8 = 1 << 0;

/// Returns the storage key of `outpoint`
pub fn outpoint_key(outpoint: &TransactionOutpoint) -> [u8; OUTPOINT_KEY_SIZE] {
    let mut key = [0u8; OUTPOINT_KEY_SIZE];
    key[..HASH_SIZE].copy_from_slice(&outpoint.transaction_id.as_bytes());
    key[HASH_SIZE..].copy_from_slice(&outpoint.index.to_be_bytes());
    key
}

/// Parses a storage key produced by [`outpoint_key`]
pub fn outpoint_from_key(key: &[u8]) -> CodecResult<TransactionOutpoint> {
    if key.len() != OUTPOINT_KEY_SIZE {
        return Err(CodecError::InvalidKeyLength { expected: OUTPOINT_KEY_SIZE, actual: key.len() });
    }
    let mut reader = WireReader::new(key);
    read_outpoint(&mut reader)
}

pub fn write_outpoint<W: WireWrite>(w: &mut W, outpoint: &TransactionOutpoint) {
    w.write_bytes(&outpoint_key(outpoint));
}

pub fn read_outpoint(r: &mut WireReader<'_>) -> CodecResult<TransactionOutpoint> {
    let transaction_id = r.read_hash()?;
    let index = u32::from_be_bytes(r.read_array()?);
    Ok(TransactionOutpoint::new(transaction_id, index))
}

/// Writes an entry record. The record has no room for a script version, so only
/// version 0 scripts can be written
pub fn write_utxo_entry<W: WireWrite>(w: &mut W, entry: &UtxoEntry) -> CodecResult<()> {
    if entry.script_public_key.version != 0 {
        return Err(CodecError::UnsupportedScriptVersion(entry.script_public_key.version));
    }
    let packed_flags = if entry.is_coinbase { COINBASE_FLAG } else { 0 };
    w.write_element(WireElement::U64(entry.block_blue_score));
    w.write_element(WireElement::U8(packed_flags));
    w.write_element(WireElement::U64(entry.amount));
    write_var_bytes(w, entry.script_public_key.script());
    Ok(())
}

pub fn read_utxo_entry(r: &mut WireReader<'_>) -> CodecResult<UtxoEntry> {
    let block_blue_score = r.read_u64()?;
    let packed_flags = r.read_u8()?;
    let amount = r.read_u64()?;
    let script = r.read_var_bytes(MAX_SCRIPT_PUBLIC_KEY_LEN)?;
    Ok(UtxoEntry::new(amount, ScriptPublicKey::new(0, ScriptVec::from_slice(script)), block_blue_score, packed_flags & COINBASE_FLAG != 0))
}

pub fn utxo_entry_to_bytes(entry: &UtxoEntry) -> CodecResult<Vec<u8>> {
    let mut bytes = Vec::with_capacity(8 + 1 + 8 + 1 + entry.script_public_key.script().len());
    write_utxo_entry(&mut bytes, entry)?;
    Ok(bytes)
}

pub fn utxo_entry_from_bytes(bytes: &[u8]) -> CodecResult<UtxoEntry> {
    let mut reader = WireReader::new(bytes);
    let entry = read_utxo_entry(&mut reader)?;
    reader.finish()?;
    Ok(entry)
}

pub fn write_utxo_collection<W: WireWrite>(w: &mut W, collection: &UtxoCollection) -> CodecResult<()> {
    write_varint(w, collection.len() as u64);
    for (outpoint, entry) in collection.to_sorted_vec() {
        write_outpoint(w, outpoint);
        write_utxo_entry(w, entry)?;
    }
    Ok(())
}

pub fn read_utxo_collection(r: &mut WireReader<'_>) -> CodecResult<UtxoCollection> {
    let len = r.read_collection_len(MAX_COLLECTION_LEN)?;
    // Every pair takes at least a key and the fixed entry fields, which bounds preallocation by the input size
    let mut collection = UtxoCollection::with_capacity(len.min(r.remaining() / (OUTPOINT_KEY_SIZE + 18)));
    let mut previous: Option<TransactionOutpoint> = None;
    for _ in 0..len {
        let outpoint = read_outpoint(r)?;
        if previous.is_some_and(|previous| outpoint <= previous) {
            return Err(CodecError::UnorderedCollectionKey(outpoint));
        }
        previous = Some(outpoint);
        let entry = read_utxo_entry(r)?;
        collection.insert(outpoint, entry);
    }
    Ok(collection)
}

pub fn write_utxo_diff<W: WireWrite>(w: &mut W, diff: &UtxoDiff) -> CodecResult<()> {
    write_utxo_collection(w, &diff.add)?;
    write_utxo_collection(w, &diff.remove)
}

pub fn read_utxo_diff(r: &mut WireReader<'_>) -> CodecResult<UtxoDiff> {
    let add = read_utxo_collection(r)?;
    let remove = read_utxo_collection(r)?;
    Ok(UtxoDiff::new(add, remove))
}

pub fn write_utxo_diff_data<W: WireWrite>(w: &mut W, data: &UtxoDiffData) -> CodecResult<()> {
    w.write_element(WireElement::Bool(data.diff_child.is_some()));
    if let Some(diff_child) = data.diff_child {
        w.write_element(WireElement::Hash(diff_child));
    }
    write_utxo_diff(w, &data.diff)
}

pub fn read_utxo_diff_data(r: &mut WireReader<'_>) -> CodecResult<UtxoDiffData> {
    let diff_child: Option<Hash> = if r.read_bool()? { Some(r.read_hash()?) } else { None };
    let diff = read_utxo_diff(r)?;
    Ok(UtxoDiffData::new(diff, diff_child))
}

pub fn utxo_diff_data_to_bytes(data: &UtxoDiffData) -> CodecResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_utxo_diff_data(&mut bytes, data)?;
    Ok(bytes)
}

pub fn utxo_diff_data_from_bytes(bytes: &[u8]) -> CodecResult<UtxoDiffData> {
    let mut reader = WireReader::new(bytes);
    let data = read_utxo_diff_data(&mut reader)?;
    reader.finish()?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::constants::consensus::UNACCEPTED_BLUE_SCORE,
        subnets::SUBNETWORK_ID_COINBASE,
        tx::{PopulatedTransaction, Transaction, TransactionId, TransactionOutput, scriptvec},
    };

    fn outpoint(word: u64, index: u32) -> TransactionOutpoint {
        TransactionOutpoint::new(TransactionId::from_u64_word(word), index)
    }

    #[test]
    fn test_outpoint_key_layout() {
        let key = outpoint_key(&outpoint(1, 0x0102));
        assert_eq!(key[0], 1);
        assert_eq!(&key[HASH_SIZE..], &[0, 0, 1, 2]);
        assert_eq!(outpoint_from_key(&key).unwrap(), outpoint(1, 0x0102));

        // Big-endian indices keep keys of a transaction sorted by index
        assert!(outpoint_key(&outpoint(1, 255)) < outpoint_key(&outpoint(1, 256)));
        assert_eq!(outpoint_from_key(&key[1..]), Err(CodecError::InvalidKeyLength { expected: OUTPOINT_KEY_SIZE, actual: 35 }));
    }

    #[test]
    fn test_entry_layout() {
        let entry = UtxoEntry::new(0x0102, ScriptPublicKey::new(0, scriptvec![0xaa, 0xbb]), 3, true);
        let bytes = utxo_entry_to_bytes(&entry).unwrap();
        #[rustfmt::skip]
        let expected = [
            3, 0, 0, 0, 0, 0, 0, 0,       // blue score
            1,                            // flags
            2, 1, 0, 0, 0, 0, 0, 0,       // amount
            2, 0xaa, 0xbb,                // script
        ];
        assert_eq!(bytes, expected);
        assert_eq!(utxo_entry_from_bytes(&bytes).unwrap(), entry);

        let mut trailing = bytes.clone();
        trailing.push(0);
        assert_eq!(utxo_entry_from_bytes(&trailing), Err(CodecError::TrailingBytes(1)));
        assert!(matches!(utxo_entry_from_bytes(&bytes[..10]), Err(CodecError::UnexpectedEof { .. })));

        let versioned = UtxoEntry::new(1, ScriptPublicKey::new(1, scriptvec![]), 0, false);
        assert_eq!(utxo_entry_to_bytes(&versioned), Err(CodecError::UnsupportedScriptVersion(1)));
    }

    #[test]
    fn test_diff_data_layout() {
        let mut diff = UtxoDiff::default();
        diff.add.insert(outpoint(2, 0), UtxoEntry::new(20, ScriptPublicKey::default(), 1, false));
        diff.add.insert(outpoint(1, 0), UtxoEntry::new(10, ScriptPublicKey::default(), 1, false));
        diff.remove.insert(outpoint(3, 1), UtxoEntry::new(30, ScriptPublicKey::default(), 0, true));

        let without_child = UtxoDiffData::new(diff.clone(), None);
        let bytes = utxo_diff_data_to_bytes(&without_child).unwrap();
        assert_eq!(bytes[0], 0);
        // The add collection follows directly, with pairs sorted by key
        assert_eq!(bytes[1], 2);
        assert_eq!(&bytes[2..2 + OUTPOINT_KEY_SIZE], &outpoint_key(&outpoint(1, 0)));
        assert_eq!(utxo_diff_data_from_bytes(&bytes).unwrap(), without_child);

        let with_child = UtxoDiffData::new(diff, Some(Hash::from_u64_word(77)));
        let bytes = utxo_diff_data_to_bytes(&with_child).unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..1 + HASH_SIZE], &Hash::from_u64_word(77).as_bytes());
        assert_eq!(utxo_diff_data_from_bytes(&bytes).unwrap(), with_child);

        // Serialization does not depend on map iteration order
        let reinserted = utxo_diff_data_from_bytes(&bytes).unwrap();
        assert_eq!(utxo_diff_data_to_bytes(&reinserted).unwrap(), bytes);

        assert_eq!(utxo_diff_data_from_bytes(&[2]), Err(CodecError::InvalidBool(2)));
    }

    #[test]
    fn test_collection_keys_must_ascend() {
        let mut collection = UtxoCollection::new();
        collection.insert(outpoint(1, 0), UtxoEntry::new(10, ScriptPublicKey::default(), 0, false));
        collection.insert(outpoint(1, 1), UtxoEntry::new(11, ScriptPublicKey::default(), 0, false));
        let mut bytes = Vec::new();
        write_utxo_collection(&mut bytes, &collection).unwrap();
        let pair_len = (bytes.len() - 1) / 2;
        let (first, second) = (bytes[1..1 + pair_len].to_vec(), bytes[1 + pair_len..].to_vec());

        // The same key twice
        let duplicated = [&[2u8][..], &first[..], &first[..]].concat();
        assert_eq!(read_utxo_collection(&mut WireReader::new(&duplicated)), Err(CodecError::UnorderedCollectionKey(outpoint(1, 0))));

        // Keys out of order
        let swapped = [&[2u8][..], &second[..], &first[..]].concat();
        assert_eq!(read_utxo_collection(&mut WireReader::new(&swapped)), Err(CodecError::UnorderedCollectionKey(outpoint(1, 0))));

        let decoded = read_utxo_collection(&mut WireReader::new(&bytes)).unwrap();
        assert_eq!(decoded, collection);
    }

    #[test]
    fn test_unaccepted_entries_persist() {
        let tx = Transaction::new(0, vec![], vec![TransactionOutput::new(50, ScriptPublicKey::default())], 0, SUBNETWORK_ID_COINBASE, 0, vec![]);
        let mut diff = UtxoDiff::default();
        diff.add_transaction(&PopulatedTransaction::new(&tx, vec![]), UNACCEPTED_BLUE_SCORE).unwrap();
        let unaccepted = TransactionOutpoint::new(tx.id(), 0);

        let bytes = utxo_entry_to_bytes(&diff.add[&unaccepted]).unwrap();
        assert_eq!(&bytes[..8], &[0xff; 8]);
        assert_eq!(utxo_entry_from_bytes(&bytes).unwrap().block_blue_score, UNACCEPTED_BLUE_SCORE);

        // Accepting the output later is an update from the sentinel to the accepting blue score
        let mut accepted = diff.add[&unaccepted].clone();
        accepted.block_blue_score = 12;
        let mut acceptance = UtxoDiff::default();
        acceptance.remove_entry(&unaccepted, &diff.add[&unaccepted]).unwrap();
        acceptance.add_entry(unaccepted, accepted.clone()).unwrap();
        let data = UtxoDiffData::new(acceptance, None);
        let decoded = utxo_diff_data_from_bytes(&utxo_diff_data_to_bytes(&data).unwrap()).unwrap();
        assert_eq!(decoded.diff.remove[&unaccepted].block_blue_score, UNACCEPTED_BLUE_SCORE);
        assert_eq!(decoded.diff.add[&unaccepted], accepted);
    }
}
